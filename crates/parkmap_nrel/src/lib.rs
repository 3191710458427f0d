//! Electric vehicle charging stations from the NREL alternative fuel stations API.
//! Stations are asked per state, then kept only for the configured cities.

mod client;
mod export;
mod station;

pub use client::{
    resolve_api_key, CityStations, NrelClient, NrelError, API_KEY_ENV, DEFAULT_NREL_URL, DEMO_API_KEY,
    MAX_LIMIT,
};
pub use export::write_stations_csv;
pub use station::{filter_by_city, ChargingStation, NON_NETWORKED, UNKNOWN_FIELD};
