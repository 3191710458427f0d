use parkmap_core::LatLon;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

pub const UNKNOWN_ATTRIBUTE: &str = "unknown";

/// A parking facility as extracted from OpenStreetMap.
/// Only `name`, `lat` and `lon` are required, the rest is filled when the source knows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingLot {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<String>,
}

impl ParkingLot {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
            id: None,
            city: None,
            state: None,
            access: None,
            capacity: None,
            fee: None,
        }
    }

    pub fn position(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }

    /// Popup body for the static map: name, location, then the attributes that are actually known.
    pub fn popup_text(&self) -> String {
        let mut text = format!("<b>{}</b>", self.name);
        if let (Some(city), Some(state)) = (&self.city, &self.state) {
            text.push_str(&format!("<br>City: {city}, {state}"));
        }
        for (label, value) in [
            ("Capacity", &self.capacity),
            ("Access", &self.access),
            ("Fee", &self.fee),
        ] {
            match value.as_deref() {
                Some(v) if v != UNKNOWN_ATTRIBUTE && !v.is_empty() => {
                    text.push_str(&format!("<br>{label}: {v}"));
                }
                _ => {}
            }
        }
        text
    }
}

#[cfg(test)]
mod test {
    use super::ParkingLot;

    #[test]
    fn test_minimal_lot_deserializes() {
        let lot: ParkingLot =
            serde_json::from_str(r#"{"name": "Parking Lot A", "lat": 33.4484, "lon": -112.074}"#)
                .unwrap();
        assert_eq!(lot.name, "Parking Lot A");
        assert_eq!(lot.position().key(), "33.4484,-112.074");
        assert!(lot.city.is_none());
    }

    #[test]
    fn test_popup_skips_unknown_attributes() {
        let mut lot = ParkingLot::new("Garage", 27.95, -82.45);
        lot.city = Some("Tampa".into());
        lot.state = Some("Florida".into());
        lot.capacity = Some("120".to_string());
        lot.access = Some("unknown".to_string());
        lot.fee = Some("yes".to_string());
        assert_eq!(
            lot.popup_text(),
            "<b>Garage</b><br>City: Tampa, Florida<br>Capacity: 120<br>Fee: yes"
        );
    }
}
