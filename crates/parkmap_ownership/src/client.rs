use std::time::Duration;

use parkmap_core::LatLon;
use tracing::{debug, instrument};
use url::Url;

use crate::record::{LookupError, OwnershipRecord};

pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:5000";
pub const OWNERSHIP_PATH: &str = "get-ownership";

/// Anything able to answer an ownership question for a position.
pub trait OwnershipSource: Send + 'static {
    fn fetch(&self, position: LatLon) -> Result<OwnershipRecord, LookupError>;
}

/// `{origin}/get-ownership?lat={lat}&lon={lon}`, coordinates written the same way as the result keys.
/// The origin path is a directory: `http://host/api` and `http://host/api/` both give `http://host/api/get-ownership`.
pub fn lookup_url(origin: &Url, position: LatLon) -> Result<Url, LookupError> {
    let mut base = origin.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let mut url = base.join(OWNERSHIP_PATH)?;
    url.query_pairs_mut()
        .append_pair("lat", &position.lat.to_string())
        .append_pair("lon", &position.lon.to_string());
    Ok(url)
}

pub struct HttpOwnershipSource {
    origin: Url,
    agent: ureq::Agent,
}

impl HttpOwnershipSource {
    pub fn new(origin: &str, timeout: Duration) -> Result<Self, LookupError> {
        let origin = Url::parse(origin)?;
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("parkmap/", env!("CARGO_PKG_VERSION")))
            .build();
        Ok(Self { origin, agent })
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }
}

impl OwnershipSource for HttpOwnershipSource {
    #[instrument(skip_all, fields(%position))]
    fn fetch(&self, position: LatLon) -> Result<OwnershipRecord, LookupError> {
        let url = lookup_url(&self.origin, position)?;
        debug!(%url, "requesting ownership");
        let response = match self.agent.request_url("GET", &url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => return Err(LookupError::Status(code)),
            Err(ureq::Error::Transport(transport)) => {
                return Err(LookupError::Transport(transport.to_string()))
            }
        };
        response.into_json().map_err(LookupError::Decode)
    }
}
