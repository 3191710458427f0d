use serde::{Deserialize, Serialize};

pub const UNKNOWN_FIELD: &str = "Unknown";
pub const NON_NETWORKED: &str = "Non-Networked";

/// The part of an NREL fuel station record we show. The API sends `null` for most of it on some stations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargingStation {
    pub station_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(deserialize_with = "null_as_empty")]
    pub ev_connector_types: Vec<String>,
    pub ev_dc_fast_num: Option<u32>,
    pub ev_level2_evse_num: Option<u32>,
    pub ev_network: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ChargingStation {
    pub fn connector_types(&self) -> String {
        if self.ev_connector_types.is_empty() {
            UNKNOWN_FIELD.to_string()
        } else {
            self.ev_connector_types.join(", ")
        }
    }

    pub fn network(&self) -> &str {
        self.ev_network.as_deref().unwrap_or(NON_NETWORKED)
    }

    fn is_in(&self, city: &str) -> bool {
        self.city
            .as_deref()
            .is_some_and(|own| own.to_lowercase() == city.to_lowercase())
    }
}

fn or_unknown(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(UNKNOWN_FIELD)
}

fn coordinate_or_unknown(value: Option<f64>) -> String {
    value.map_or_else(|| UNKNOWN_FIELD.to_string(), |v| v.to_string())
}

/// The detail block printed by the `stations` command, one `Label: value` per line.
impl std::fmt::Display for ChargingStation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Station Name: {}", or_unknown(&self.station_name))?;
        writeln!(f, "City: {}", or_unknown(&self.city))?;
        writeln!(f, "State: {}", or_unknown(&self.state))?;
        writeln!(f, "Zip: {}", or_unknown(&self.zip))?;
        writeln!(f, "Latitude: {}", coordinate_or_unknown(self.latitude))?;
        writeln!(f, "Longitude: {}", coordinate_or_unknown(self.longitude))?;
        writeln!(f, "EV Connector Types: {}", self.connector_types())?;
        writeln!(f, "EV DC Fast Count: {}", self.ev_dc_fast_num.unwrap_or(0))?;
        writeln!(f, "EV Level 2 Count: {}", self.ev_level2_evse_num.unwrap_or(0))?;
        write!(f, "EV Network: {}", self.network())
    }
}

/// Stations whose city matches `city`, ignoring case. Stations without a city never match.
pub fn filter_by_city(stations: Vec<ChargingStation>, city: &str) -> Vec<ChargingStation> {
    stations.into_iter().filter(|s| s.is_in(city)).collect()
}
