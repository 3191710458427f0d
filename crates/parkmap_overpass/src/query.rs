use crate::city::BoundingBox;

/// Overpass QL for every parking amenity inside `bbox`.
/// Ways and relations come back with their `center`, nodes with their own position.
pub fn build_query(bbox: &BoundingBox) -> String {
    format!(
        r#"[out:json];
(
  node["amenity"="parking"]({bbox});
  way["amenity"="parking"]({bbox});
  relation["amenity"="parking"]({bbox});
);
out center;
"#
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_query_uses_bbox_for_every_element_kind() {
        let query = build_query(&[27.9, -82.55, 28.15, -82.35].into());
        assert!(query.starts_with("[out:json];"));
        assert_eq!(query.matches("(27.9,-82.55,28.15,-82.35)").count(), 3);
        assert!(query.contains(r#"way["amenity"="parking"]"#));
        assert!(query.trim_end().ends_with("out center;"));
    }
}
