//! Parking lots straight from OpenStreetMap through the Overpass API, and the thinning that keeps
//! the static map readable when a city has thousands of them.

mod city;
mod export;
mod fetch;
mod query;
mod thinning;

pub use city::{BoundingBox, CitySpec, DEFAULT_DIVISION_FACTOR};
pub use export::write_lots_csv;
pub use fetch::{lots_from_response, OverpassClient, OverpassError, DEFAULT_OVERPASS_URL};
pub use query::build_query;
pub use thinning::{marker_budget, select_representatives, thin_by_city};
