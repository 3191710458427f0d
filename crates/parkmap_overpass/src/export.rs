use std::io::Write;

use parkmap_marker_models::ParkingLot;
use serde::Serialize;

/// One CSV line per lot, every column always present so that the rows stay aligned.
#[derive(Serialize)]
struct LotRow<'a> {
    name: &'a str,
    lat: f64,
    lon: f64,
    id: Option<u64>,
    city: Option<&'a str>,
    state: Option<&'a str>,
    access: Option<&'a str>,
    capacity: Option<&'a str>,
    fee: Option<&'a str>,
}

impl<'a> From<&'a ParkingLot> for LotRow<'a> {
    fn from(lot: &'a ParkingLot) -> Self {
        Self {
            name: &lot.name,
            lat: lot.lat,
            lon: lot.lon,
            id: lot.id,
            city: lot.city.as_deref(),
            state: lot.state.as_deref(),
            access: lot.access.as_deref(),
            capacity: lot.capacity.as_deref(),
            fee: lot.fee.as_deref(),
        }
    }
}

/// Writes the lots as CSV with a header line, the table the static map is generated from.
pub fn write_lots_csv<W: Write>(writer: W, lots: &[ParkingLot]) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for lot in lots {
        writer.serialize(LotRow::from(lot))?;
    }
    if lots.is_empty() {
        // serialize writes the header with the first row only
        writer.write_record([
            "name", "lat", "lon", "id", "city", "state", "access", "capacity", "fee",
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lots_csv() {
        let mut full = ParkingLot::new("Lot One, North", 33.45, -112.07);
        full.id = Some(1);
        full.city = Some("Phoenix".into());
        full.state = Some("Arizona".into());
        full.access = Some("yes".to_string());
        full.capacity = Some("50".to_string());
        full.fee = Some("unknown".to_string());
        let bare = ParkingLot::new("Bare", 1.0, 2.5);

        let mut out = Vec::new();
        write_lots_csv(&mut out, &[full, bare]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "name,lat,lon,id,city,state,access,capacity,fee\n\
             \"Lot One, North\",33.45,-112.07,1,Phoenix,Arizona,yes,50,unknown\n\
             Bare,1.0,2.5,,,,,,\n"
        );
    }

    #[test]
    fn test_no_lots_still_has_a_header() {
        let mut out = Vec::new();
        write_lots_csv(&mut out, &[]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "name,lat,lon,id,city,state,access,capacity,fee\n"
        );
    }
}
