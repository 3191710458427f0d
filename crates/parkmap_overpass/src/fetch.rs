use std::collections::HashMap;
use std::time::Duration;

use miette::Diagnostic;
use parkmap_marker_models::{lot::UNKNOWN_ATTRIBUTE, ParkingLot};
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, info_span, warn};

use crate::city::CitySpec;
use crate::query::build_query;

pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

#[derive(Error, Debug, Diagnostic)]
pub enum OverpassError {
    #[error("overpass api unreachable: {0}")]
    Transport(String),
    #[error("overpass api returned status code {0}")]
    #[diagnostic(help("the public instance rate limits heavy users, wait a bit and retry"))]
    Status(u16),
    #[error("overpass api sent an unreadable body")]
    Decode(#[source] std::io::Error),
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct Center {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    id: u64,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<Center>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

impl OverpassElement {
    fn position(&self) -> Option<(f64, f64)> {
        match (self.kind.as_str(), self.lat, self.lon, &self.center) {
            ("node", Some(lat), Some(lon), _) => Some((lat, lon)),
            (_, _, _, Some(center)) => Some((center.lat, center.lon)),
            _ => None,
        }
    }

    fn into_lot(self, city: &CitySpec) -> Option<ParkingLot> {
        let (lat, lon) = self.position()?;
        let mut tags = self.tags;
        let mut attribute = |name: &str| {
            Some(
                tags.remove(name)
                    .unwrap_or_else(|| UNKNOWN_ATTRIBUTE.to_string()),
            )
        };
        let access = attribute("access");
        let capacity = attribute("capacity");
        let fee = attribute("fee");
        let name = tags
            .remove("name")
            .unwrap_or_else(|| format!("Parking {}", self.id));
        Some(ParkingLot {
            name,
            lat,
            lon,
            id: Some(self.id),
            city: Some(city.name.clone()),
            state: Some(city.state.clone()),
            access,
            capacity,
            fee,
        })
    }
}

/// Turns an Overpass JSON answer into lots of `city`. Elements without any usable position are dropped.
pub fn lots_from_response(body: &str, city: &CitySpec) -> serde_json::Result<Vec<ParkingLot>> {
    let response: OverpassResponse = serde_json::from_str(body)?;
    Ok(collect_lots(response, city))
}

fn collect_lots(response: OverpassResponse, city: &CitySpec) -> Vec<ParkingLot> {
    let total = response.elements.len();
    let lots: Vec<ParkingLot> = response
        .elements
        .into_iter()
        .filter_map(|element| element.into_lot(city))
        .collect();
    if lots.len() != total {
        warn!(
            skipped = total - lots.len(),
            "elements without position were skipped"
        );
    }
    lots
}

pub struct OverpassClient {
    url: String,
    agent: ureq::Agent,
    pause: Duration,
}

impl OverpassClient {
    pub fn new(url: impl Into<String>, timeout: Duration, pause: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("parkmap/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            url: url.into(),
            agent,
            pause,
        }
    }

    pub fn fetch_parking_lots(&self, city: &CitySpec) -> Result<Vec<ParkingLot>, OverpassError> {
        info!(city = %city.name, state = %city.state, bbox = %city.bbox, "extracting parking lots");
        let response = match self.agent.post(&self.url).send_string(&build_query(&city.bbox)) {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => return Err(OverpassError::Status(code)),
            Err(ureq::Error::Transport(transport)) => {
                return Err(OverpassError::Transport(transport.to_string()))
            }
        };
        if response.status() != 200 {
            return Err(OverpassError::Status(response.status()));
        }
        let response: OverpassResponse = response.into_json().map_err(OverpassError::Decode)?;
        let lots = collect_lots(response, city);
        if lots.is_empty() {
            info!(city = %city.name, "no parking facilities found");
        } else {
            info!(city = %city.name, found = lots.len(), "parking facilities found");
        }
        Ok(lots)
    }

    /// Fetches the cities one after the other, pausing between requests to stay under the rate limit.
    /// A city that fails is logged and left out.
    pub fn fetch_cities(&self, cities: &[CitySpec]) -> Vec<ParkingLot> {
        let _span_guard = info_span!("overpass extraction").entered();
        let mut all_lots = Vec::new();
        for (index, city) in cities.iter().enumerate() {
            if index > 0 && !self.pause.is_zero() {
                std::thread::sleep(self.pause);
            }
            match self.fetch_parking_lots(city) {
                Ok(lots) => all_lots.extend(lots),
                Err(e) => error!(city = %city.name, ?e, "failed to extract parking lots"),
            }
        }
        info!(total = all_lots.len(), "extraction done");
        all_lots
    }
}
