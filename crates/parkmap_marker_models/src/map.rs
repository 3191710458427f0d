use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use parkmap_core::LatLon;
use uuid::Uuid;

use crate::color::MarkerColor;
use crate::icon::IconDescriptor;
use crate::layer::{FeatureGroup, Layer, MarkerLayer, TileLayer};
use crate::lot::ParkingLot;

/// Center used when there is nothing to show: the geographic center of the contiguous US.
pub const DEFAULT_CENTER: LatLon = LatLon::new(39.8283, -98.5795);
pub const DEFAULT_ZOOM: u8 = 5;
pub const CITY_ZOOM: u8 = 10;

/// Capabilities the marker widgets need from a map.
pub trait MarkerMap {
    /// Visits every layer currently on the map, in insertion order.
    fn each_layer(&mut self, f: &mut dyn FnMut(&mut Layer));

    fn marker_mut(&mut self, guid: Uuid) -> Option<&mut MarkerLayer>;

    /// Dispatches a click to a marker. Returns false if there is no such marker.
    fn click(&mut self, guid: Uuid) -> bool {
        match self.marker_mut(guid) {
            Some(marker) => {
                marker.click();
                true
            }
            None => false,
        }
    }
}

#[derive(Debug)]
pub struct LeafletMap {
    pub center: LatLon,
    pub zoom: u8,
    layers: Vec<Layer>,
}

pub type SharedMap = Arc<Mutex<LeafletMap>>;

impl LeafletMap {
    pub fn new(center: LatLon, zoom: u8) -> Self {
        Self {
            center,
            zoom,
            layers: vec![Layer::Tile(TileLayer::default())],
        }
    }

    /// Builds the map of a set of lots: centered on their mean position, one red marker per lot,
    /// grouped per city when the lots know their city.
    pub fn from_lots(lots: &[ParkingLot]) -> Self {
        let mut map = if lots.is_empty() {
            Self::new(DEFAULT_CENTER, DEFAULT_ZOOM)
        } else {
            let n = lots.len() as f64;
            let lat = lots.iter().map(|l| l.lat).sum::<f64>() / n;
            let lon = lots.iter().map(|l| l.lon).sum::<f64>() / n;
            Self::new(LatLon::new(lat, lon), CITY_ZOOM)
        };
        // keeps the city layers in the order the lots were given
        let mut groups: IndexMap<String, Vec<Uuid>> = IndexMap::new();
        for lot in lots {
            let guid = map.add_marker(
                lot.position(),
                Some(IconDescriptor::awesome(MarkerColor::Red)),
                lot.popup_text(),
            );
            if let (Some(city), Some(state)) = (&lot.city, &lot.state) {
                groups.entry(format!("{city}, {state}")).or_default().push(guid);
            }
        }
        for (name, members) in groups {
            map.add_layer(Layer::FeatureGroup(FeatureGroup { name, members }));
        }
        map
    }

    pub fn into_shared(self) -> SharedMap {
        Arc::new(Mutex::new(self))
    }

    pub fn add_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    pub fn add_marker(
        &mut self,
        position: LatLon,
        icon: Option<IconDescriptor>,
        popup: impl Into<String>,
    ) -> Uuid {
        let marker = MarkerLayer::new(position, icon, popup);
        let guid = marker.guid();
        self.layers.push(Layer::Marker(marker));
        guid
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn markers(&self) -> impl Iterator<Item = &MarkerLayer> {
        self.layers.iter().filter_map(Layer::as_marker)
    }

    pub fn marker(&self, guid: Uuid) -> Option<&MarkerLayer> {
        self.markers().find(|m| m.guid() == guid)
    }

    /// Guid of the n-th marker, in insertion order.
    pub fn nth_marker(&self, index: usize) -> Option<Uuid> {
        self.markers().nth(index).map(MarkerLayer::guid)
    }
}

impl MarkerMap for LeafletMap {
    fn each_layer(&mut self, f: &mut dyn FnMut(&mut Layer)) {
        for layer in self.layers.iter_mut() {
            f(layer);
        }
    }

    fn marker_mut(&mut self, guid: Uuid) -> Option<&mut MarkerLayer> {
        self.layers
            .iter_mut()
            .filter_map(Layer::as_marker_mut)
            .find(|m| m.guid() == guid)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_empty_map_uses_default_center() {
        let map = LeafletMap::from_lots(&[]);
        assert_eq!(map.center, DEFAULT_CENTER);
        assert_eq!(map.zoom, DEFAULT_ZOOM);
        assert_eq!(map.markers().count(), 0);
        assert!(matches!(map.layers()[0], Layer::Tile(_)));
    }

    #[test]
    fn test_from_lots_builds_red_markers_and_city_groups() {
        let mut a = ParkingLot::new("A", 33.0, -112.0);
        a.city = Some("Phoenix".into());
        a.state = Some("Arizona".into());
        let mut b = ParkingLot::new("B", 35.0, -110.0);
        b.city = Some("Phoenix".into());
        b.state = Some("Arizona".into());
        let c = ParkingLot::new("C", 34.0, -111.0);
        let map = LeafletMap::from_lots(&[a, b, c]);

        assert_eq!(map.center, LatLon::new(34.0, -111.0));
        assert_eq!(map.markers().count(), 3);
        assert!(map
            .markers()
            .all(|m| m.icon() == Some(&IconDescriptor::awesome(MarkerColor::Red))));
        let groups: Vec<&FeatureGroup> = map
            .layers()
            .iter()
            .filter_map(|l| match l {
                Layer::FeatureGroup(g) => Some(g),
                _ => None,
            })
            .collect();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "Phoenix, Arizona");
        assert_eq!(groups[0].members.len(), 2);
    }

    #[test]
    fn test_click_unknown_marker() {
        let mut map = LeafletMap::new(DEFAULT_CENTER, DEFAULT_ZOOM);
        assert!(!map.click(Uuid::new_v4()));
        let guid = map.add_marker(LatLon::new(1.0, 1.0), None, "");
        assert!(map.click(guid));
        assert_eq!(map.nth_marker(0), Some(guid));
    }
}
