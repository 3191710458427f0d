use glam::DVec2;
use indexmap::IndexMap;
use parkmap_marker_models::ParkingLot;
use smol_str::SmolStr;
use tracing::info;

use crate::city::{CitySpec, DEFAULT_DIVISION_FACTOR};

const MAX_ITERATIONS: usize = 100;

/// How many markers a group of `count` lots is allowed: one per `division_factor` lots, never zero.
pub fn marker_budget(count: usize, division_factor: usize) -> usize {
    (count / division_factor.max(1)).max(1)
}

/// Keeps one lot per cluster group, grouped by `(city, state)` in the order groups first appear.
/// The division factor of a group comes from the matching entry of `cities`.
pub fn thin_by_city(lots: &[ParkingLot], cities: &[CitySpec]) -> Vec<ParkingLot> {
    let mut groups: IndexMap<(Option<SmolStr>, Option<SmolStr>), Vec<&ParkingLot>> =
        IndexMap::new();
    for lot in lots {
        groups
            .entry((lot.city.clone(), lot.state.clone()))
            .or_default()
            .push(lot);
    }

    let mut selected = Vec::new();
    for ((city, state), group) in groups {
        let division_factor = cities
            .iter()
            .find(|c| Some(&c.name) == city.as_ref() && Some(&c.state) == state.as_ref())
            .map(CitySpec::division_factor)
            .unwrap_or(DEFAULT_DIVISION_FACTOR);
        let budget = marker_budget(group.len(), division_factor);
        info!(
            city = city.as_deref().unwrap_or("?"),
            state = state.as_deref().unwrap_or("?"),
            lots = group.len(),
            markers = budget,
            "thinning parking lots"
        );
        selected.extend(select_representatives(&group, budget).into_iter().cloned());
    }
    selected
}

/// Clusters the lots into `k` groups (k-means on raw `(lat, lon)`) and returns, for each cluster,
/// the lot nearest to its centroid. When there are no more lots than `k`, all of them are kept.
/// Deterministic: same input, same output.
pub fn select_representatives<'a>(lots: &[&'a ParkingLot], k: usize) -> Vec<&'a ParkingLot> {
    if lots.len() <= k {
        return lots.to_vec();
    }
    if k == 0 {
        return Vec::new();
    }
    let points: Vec<DVec2> = lots.iter().map(|l| DVec2::new(l.lat, l.lon)).collect();
    let centers = kmeans(&points, k);
    let labels: Vec<usize> = points.iter().map(|p| nearest(&centers, *p)).collect();

    centers
        .iter()
        .enumerate()
        .filter_map(|(cluster, center)| {
            labels
                .iter()
                .enumerate()
                .filter(|(_, label)| **label == cluster)
                .map(|(index, _)| index)
                .min_by(|a, b| {
                    points[*a]
                        .distance_squared(*center)
                        .total_cmp(&points[*b].distance_squared(*center))
                })
                .map(|index| lots[index])
        })
        .collect()
}

fn nearest(centers: &[DVec2], point: DVec2) -> usize {
    centers
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.distance_squared(point)
                .total_cmp(&b.distance_squared(point))
        })
        .map(|(index, _)| index)
        .unwrap_or(0)
}

/// Farthest point seeding then Lloyd iterations until assignments settle.
fn kmeans(points: &[DVec2], k: usize) -> Vec<DVec2> {
    let mut centers = vec![points[0]];
    while centers.len() < k {
        let farthest = points
            .iter()
            .copied()
            .max_by(|a, b| {
                let da = centers[nearest(&centers, *a)].distance_squared(*a);
                let db = centers[nearest(&centers, *b)].distance_squared(*b);
                da.total_cmp(&db)
            })
            .unwrap_or(points[0]);
        centers.push(farthest);
    }

    let mut labels = vec![usize::MAX; points.len()];
    for _ in 0..MAX_ITERATIONS {
        let new_labels: Vec<usize> = points.iter().map(|p| nearest(&centers, *p)).collect();
        if new_labels == labels {
            break;
        }
        labels = new_labels;
        for (cluster, center) in centers.iter_mut().enumerate() {
            let (sum, count) = points
                .iter()
                .zip(&labels)
                .filter(|(_, label)| **label == cluster)
                .fold((DVec2::ZERO, 0usize), |(sum, count), (p, _)| (sum + *p, count + 1));
            // an empty cluster keeps its previous center
            if count > 0 {
                *center = sum / count as f64;
            }
        }
    }
    centers
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    fn lot(name: &str, lat: f64, lon: f64, city: &str, state: &str) -> ParkingLot {
        let mut lot = ParkingLot::new(name, lat, lon);
        lot.city = Some(city.into());
        lot.state = Some(state.into());
        lot
    }

    #[rstest]
    #[case(0, 80, 1)]
    #[case(79, 80, 1)]
    #[case(160, 80, 2)]
    #[case(1000, 160, 6)]
    #[case(10, 0, 10)]
    fn test_marker_budget(#[case] count: usize, #[case] factor: usize, #[case] expected: usize) {
        assert_eq!(marker_budget(count, factor), expected);
    }

    #[test]
    fn test_small_group_is_kept_whole() {
        let a = lot("a", 1.0, 1.0, "X", "Y");
        let b = lot("b", 2.0, 2.0, "X", "Y");
        let kept = select_representatives(&[&a, &b], 2);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_one_representative_per_cluster() {
        // two tight clusters far apart, the middle point of each is the nearest to its centroid
        let lots = [
            lot("w1", 10.0, 10.0, "X", "Y"),
            lot("w2", 10.1, 10.0, "X", "Y"),
            lot("w3", 10.2, 10.0, "X", "Y"),
            lot("e1", 50.0, 50.0, "X", "Y"),
            lot("e2", 50.1, 50.0, "X", "Y"),
            lot("e3", 50.2, 50.0, "X", "Y"),
        ];
        let refs: Vec<&ParkingLot> = lots.iter().collect();
        let mut names: Vec<&str> = select_representatives(&refs, 2)
            .into_iter()
            .map(|l| l.name.as_str())
            .collect();
        names.sort();
        assert_eq!(names, vec!["e2", "w2"]);
    }

    #[test]
    fn test_thin_by_city_uses_city_factor() {
        let mut cities = CitySpec::defaults();
        cities[1].division_factor = Some(2); // Tampa
        let mut lots = Vec::new();
        for i in 0..4 {
            lots.push(lot(&format!("t{i}"), 28.0 + i as f64 * 10.0, -82.4, "Tampa", "Florida"));
        }
        lots.push(lot("p0", 33.4, -112.0, "Phoenix", "Arizona"));
        lots.push(lot("p1", 33.5, -112.1, "Phoenix", "Arizona"));

        let selected = thin_by_city(&lots, &cities);
        let tampa = selected.iter().filter(|l| l.city.as_deref() == Some("Tampa")).count();
        let phoenix = selected.iter().filter(|l| l.city.as_deref() == Some("Phoenix")).count();
        assert_eq!(tampa, 2);
        assert_eq!(phoenix, 1);
        // groups keep their first appearance order
        assert_eq!(selected[0].city.as_deref(), Some("Tampa"));
    }
}
