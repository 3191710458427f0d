use std::time::Duration;

use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::station::{filter_by_city, ChargingStation};

pub const DEFAULT_NREL_URL: &str = "https://developer.nrel.gov/api/alt-fuel-stations/v1.json";
pub const API_KEY_ENV: &str = "NREL_API_KEY";
/// Rate limited key accepted by every api.data.gov service.
pub const DEMO_API_KEY: &str = "DEMO_KEY";
/// Largest `limit` the API honors without pagination.
pub const MAX_LIMIT: u32 = 200;

#[derive(Error, Debug, Diagnostic)]
pub enum NrelError {
    #[error("invalid NREL api url")]
    Url(#[from] url::ParseError),
    #[error("NREL api unreachable: {0}")]
    Transport(String),
    #[error("NREL api returned status code {0}")]
    #[diagnostic(help("403 means the api key was refused, set NREL_API_KEY or `nrel.api_key`"))]
    Status(u16),
    #[error("NREL api sent an unreadable body")]
    Decode(#[source] std::io::Error),
}

#[derive(Debug, Deserialize)]
struct StationsResponse {
    #[serde(default)]
    fuel_stations: Vec<ChargingStation>,
}

/// `NREL_API_KEY` first, then the configured key, then the demo key.
pub fn resolve_api_key(configured: Option<&str>) -> String {
    choose_api_key(std::env::var(API_KEY_ENV).ok(), configured)
}

fn choose_api_key(from_env: Option<String>, configured: Option<&str>) -> String {
    if let Some(key) = from_env.filter(|key| !key.is_empty()) {
        return key;
    }
    if let Some(key) = configured.filter(|key| !key.is_empty()) {
        return key.to_string();
    }
    warn!("no NREL api key configured, falling back to {DEMO_API_KEY}");
    DEMO_API_KEY.to_string()
}

/// Stations found for one configured city.
#[derive(Debug, Clone, PartialEq)]
pub struct CityStations {
    pub city: String,
    pub state: String,
    pub stations: Vec<ChargingStation>,
}

pub struct NrelClient {
    url: Url,
    api_key: String,
    agent: ureq::Agent,
}

impl NrelClient {
    pub fn new(url: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self, NrelError> {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("parkmap/", env!("CARGO_PKG_VERSION")))
            .build();
        Ok(Self {
            url: Url::parse(url)?,
            api_key: api_key.into(),
            agent,
        })
    }

    /// Electric stations of a state, `state` being its two letter code.
    #[instrument(skip(self))]
    pub fn fetch_stations(&self, state: &str, limit: u32) -> Result<Vec<ChargingStation>, NrelError> {
        let limit = limit.clamp(1, MAX_LIMIT);
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .append_pair("api_key", &self.api_key)
            .append_pair("fuel_type", "ELEC")
            .append_pair("state", state)
            .append_pair("limit", &limit.to_string());
        // the url carries the key, never log it
        debug!(limit, "requesting charging stations");
        let response = match self.agent.request_url("GET", &url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => return Err(NrelError::Status(code)),
            Err(ureq::Error::Transport(transport)) => {
                return Err(NrelError::Transport(transport.to_string()))
            }
        };
        let response: StationsResponse = response.into_json().map_err(NrelError::Decode)?;
        Ok(response.fuel_stations)
    }

    /// One request per `(city, state code)`, stations kept when their city matches.
    /// A failed state is logged and reported as a city without stations.
    pub fn fetch_cities<'a>(
        &self,
        cities: impl IntoIterator<Item = (&'a str, &'a str)>,
        limit: u32,
    ) -> Vec<CityStations> {
        cities
            .into_iter()
            .map(|(city, state)| {
                let stations = match self.fetch_stations(state, limit) {
                    Ok(stations) => filter_by_city(stations, city),
                    Err(e) => {
                        error!(city, state, ?e, "failed to fetch charging stations");
                        Vec::new()
                    }
                };
                info!(city, state, stations = stations.len(), "charging stations found");
                CityStations {
                    city: city.to_string(),
                    state: state.to_string(),
                    stations,
                }
            })
            .collect()
    }
}
