//! Models shared by the marker widgets: the map, its layers, marker icons and the lots they stand for.
//! The map here is the in-memory counterpart of the leaflet map, it only exposes what the widgets need:
//! enumerate layers, subscribe to marker clicks, read and replace marker icons.

pub mod color;
pub mod icon;
pub mod layer;
pub mod lot;
pub mod map;

pub use color::MarkerColor;
pub use icon::IconDescriptor;
pub use layer::{Layer, MarkerClickHandler, MarkerLayer, MarkerState};
pub use lot::ParkingLot;
pub use map::{LeafletMap, MarkerMap, SharedMap};
