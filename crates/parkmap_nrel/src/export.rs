use std::io::Write;

use serde::Serialize;

use crate::station::{ChargingStation, UNKNOWN_FIELD};

#[derive(Serialize)]
struct StationRow<'a> {
    #[serde(rename = "Station Name")]
    station_name: &'a str,
    #[serde(rename = "City")]
    city: &'a str,
    #[serde(rename = "State")]
    state: &'a str,
    #[serde(rename = "Zip")]
    zip: &'a str,
    #[serde(rename = "Latitude")]
    latitude: Option<f64>,
    #[serde(rename = "Longitude")]
    longitude: Option<f64>,
    #[serde(rename = "EV Connector Types")]
    connector_types: String,
    #[serde(rename = "EV DC Fast Count")]
    dc_fast: u32,
    #[serde(rename = "EV Level 2 Count")]
    level2: u32,
    #[serde(rename = "EV Network")]
    network: &'a str,
}

impl<'a> From<&'a ChargingStation> for StationRow<'a> {
    fn from(station: &'a ChargingStation) -> Self {
        let text = |value: &'a Option<String>| value.as_deref().unwrap_or(UNKNOWN_FIELD);
        Self {
            station_name: text(&station.station_name),
            city: text(&station.city),
            state: text(&station.state),
            zip: text(&station.zip),
            latitude: station.latitude,
            longitude: station.longitude,
            connector_types: station.connector_types(),
            dc_fast: station.ev_dc_fast_num.unwrap_or(0),
            level2: station.ev_level2_evse_num.unwrap_or(0),
            network: station.network(),
        }
    }
}

/// Writes the stations as CSV with a header line. A station without coordinates keeps empty cells there.
pub fn write_stations_csv<W: Write>(writer: W, stations: &[ChargingStation]) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for station in stations {
        writer.serialize(StationRow::from(station))?;
    }
    if stations.is_empty() {
        writer.write_record([
            "Station Name",
            "City",
            "State",
            "Zip",
            "Latitude",
            "Longitude",
            "EV Connector Types",
            "EV DC Fast Count",
            "EV Level 2 Count",
            "EV Network",
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    const HEADER: &str = "Station Name,City,State,Zip,Latitude,Longitude,EV Connector Types,EV DC Fast Count,EV Level 2 Count,EV Network\n";

    #[test]
    fn test_stations_csv() {
        let full = ChargingStation {
            station_name: Some("Civic Center".into()),
            city: Some("Phoenix".into()),
            state: Some("AZ".into()),
            zip: Some("85004".into()),
            latitude: Some(33.45),
            longitude: Some(-112.07),
            ev_connector_types: vec!["CHADEMO".into(), "J1772COMBO".into()],
            ev_dc_fast_num: Some(2),
            ev_level2_evse_num: None,
            ev_network: Some("EVgo".into()),
        };
        let mut out = Vec::new();
        write_stations_csv(&mut out, &[full, ChargingStation::default()]).unwrap();
        let expected = format!(
            "{HEADER}\
             Civic Center,Phoenix,AZ,85004,33.45,-112.07,\"CHADEMO, J1772COMBO\",2,0,EVgo\n\
             Unknown,Unknown,Unknown,Unknown,,,Unknown,0,0,Non-Networked\n"
        );
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn test_no_station_still_has_a_header() {
        let mut out = Vec::new();
        write_stations_csv(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), HEADER);
    }
}
