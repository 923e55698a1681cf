//! Merging nearly-coincident network endpoints
//!
//! Drawing imprecision leaves polylines that should meet a few centimetres
//! apart, which would split the network into disconnected components.
//! Endpoints within the tolerance of each other are moved onto their common
//! centroid.
//!
//! This is a single pass without transitive closure: an endpoint joins the
//! first cluster that reaches it, and a cluster only claims endpoints that no
//! earlier cluster has claimed.
//!
//! A second pass is a no-op only when the resulting clusters are more than
//! the tolerance apart. An endpoint left out of a cluster can still be within
//! the tolerance of that cluster's centroid and gets merged on the next run.

use fixedbitset::FixedBitSet;
use geo::Coord;
use hashbrown::HashMap;
use log::{debug, info};

use crate::model::{NetworkSegment, VertexKey};
use crate::spatial::{point_tree, within_radius};

/// Snaps segment endpoints closer than `tolerance` metres to each other.
///
/// Every polyline vertex that sits exactly on an original endpoint follows
/// that endpoint. Returns the number of rewritten coordinates.
pub fn snap_endpoints(segments: &mut [NetworkSegment], tolerance: f64) -> usize {
    if tolerance <= 0.0 || segments.is_empty() {
        return 0;
    }

    info!("Snapping nearby network segment endpoints within {tolerance} m");

    let endpoints: Vec<Coord<f64>> = segments
        .iter()
        .filter_map(NetworkSegment::endpoints)
        .flat_map(|(first, last)| [first, last])
        .collect();

    let snapped = cluster_endpoints(&endpoints, tolerance);

    let moves: HashMap<VertexKey, Coord<f64>> = endpoints
        .iter()
        .zip(&snapped)
        .filter(|(original, target)| original != target)
        .map(|(original, target)| (VertexKey::new(*original), *target))
        .collect();

    if moves.is_empty() {
        debug!("No endpoints needed snapping");
        return 0;
    }

    let mut rewritten = 0;
    for segment in segments.iter_mut() {
        for coord in &mut segment.geometry.0 {
            if let Some(target) = moves.get(&VertexKey::new(*coord)) {
                *coord = *target;
                rewritten += 1;
            }
        }
    }

    info!("Finished snapping network endpoints, {rewritten} coordinates moved");
    rewritten
}

/// Returns the snapped position of every endpoint, same order as the input.
fn cluster_endpoints(endpoints: &[Coord<f64>], tolerance: f64) -> Vec<Coord<f64>> {
    let tree = point_tree(endpoints.iter().copied());
    let mut visited = FixedBitSet::with_capacity(endpoints.len());
    let mut snapped = endpoints.to_vec();

    for seed in 0..endpoints.len() {
        if visited.contains(seed) {
            continue;
        }

        let members: Vec<usize> = within_radius(&tree, endpoints[seed], tolerance)
            .into_iter()
            .filter(|&idx| !visited.contains(idx))
            .collect();
        for &idx in &members {
            visited.insert(idx);
        }

        if members.len() < 2 {
            continue;
        }

        let first = endpoints[members[0]];
        if members.iter().all(|&idx| endpoints[idx] == first) {
            // Already coincident
            continue;
        }

        let centroid = centroid_of(members.iter().map(|&idx| endpoints[idx]));
        for &idx in &members {
            snapped[idx] = centroid;
        }
    }

    snapped
}

#[allow(clippy::cast_precision_loss)]
fn centroid_of(coords: impl Iterator<Item = Coord<f64>>) -> Coord<f64> {
    let (sum, count) = coords.fold((Coord { x: 0.0, y: 0.0 }, 0usize), |(sum, n), c| {
        (sum + c, n + 1)
    });
    sum / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(coords: &[(f64, f64)]) -> NetworkSegment {
        NetworkSegment::from_coords(coords)
    }

    fn assert_close(actual: Coord<f64>, x: f64, y: f64) {
        assert!(
            (actual.x - x).abs() < 1e-9 && (actual.y - y).abs() < 1e-9,
            "expected ({x}, {y}), got {actual:?}"
        );
    }

    #[test]
    fn near_endpoints_merge_to_centroid() {
        let mut segments = vec![
            segment(&[(0.0, 0.0), (100.0, 0.0)]),
            segment(&[(100.4, 0.0), (200.0, 0.0)]),
        ];
        let moved = snap_endpoints(&mut segments, 1.0);
        assert_eq!(moved, 2);
        assert_close(segments[0].geometry.0[1], 100.2, 0.0);
        assert_eq!(segments[0].geometry.0[1], segments[1].geometry.0[0]);
        // Far endpoints untouched
        assert_eq!(segments[0].geometry.0[0], Coord { x: 0.0, y: 0.0 });
        assert_eq!(segments[1].geometry.0[1], Coord { x: 200.0, y: 0.0 });
    }

    #[test]
    fn endpoints_beyond_tolerance_stay_apart() {
        let mut segments = vec![
            segment(&[(0.0, 0.0), (100.0, 0.0)]),
            segment(&[(102.0, 0.0), (200.0, 0.0)]),
        ];
        assert_eq!(snap_endpoints(&mut segments, 1.0), 0);
        assert_eq!(segments[1].geometry.0[0], Coord { x: 102.0, y: 0.0 });
    }

    #[test]
    fn zero_tolerance_disables_snapping() {
        let mut segments = vec![
            segment(&[(0.0, 0.0), (100.0, 0.0)]),
            segment(&[(100.1, 0.0), (200.0, 0.0)]),
        ];
        assert_eq!(snap_endpoints(&mut segments, 0.0), 0);
    }

    #[test]
    fn interior_vertex_on_an_endpoint_follows_it() {
        let mut segments = vec![
            segment(&[(0.0, 0.0), (50.0, 0.0), (100.0, 0.0)]),
            segment(&[(50.0, 0.0), (50.0, 80.0)]),
            segment(&[(50.6, 0.0), (50.0, -80.0)]),
        ];
        snap_endpoints(&mut segments, 1.0);
        // (50, 0) is an endpoint of the second polyline and merged with (50.6, 0)
        assert_close(segments[0].geometry.0[1], 50.3, 0.0);
        assert_eq!(segments[1].geometry.0[0], segments[0].geometry.0[1]);
        assert_eq!(segments[2].geometry.0[0], segments[0].geometry.0[1]);
    }

    #[test]
    fn chain_is_not_closed_transitively() {
        // a - b within tolerance, b - c within tolerance, a - c not
        let mut segments = vec![
            segment(&[(0.0, 0.0), (-100.0, 0.0)]),
            segment(&[(0.9, 0.0), (0.9, 100.0)]),
            segment(&[(1.8, 0.0), (100.0, 0.0)]),
        ];
        snap_endpoints(&mut segments, 1.0);
        let a = segments[0].geometry.0[0];
        let b = segments[1].geometry.0[0];
        let c = segments[2].geometry.0[0];
        assert_eq!(a, b);
        assert_close(a, 0.45, 0.0);
        assert_eq!(c, Coord { x: 1.8, y: 0.0 });
    }

    #[test]
    fn snapping_twice_changes_nothing() {
        let mut segments = vec![
            segment(&[(0.0, 0.0), (100.0, 0.0)]),
            segment(&[(100.3, 0.2), (200.0, 0.0)]),
            segment(&[(99.8, -0.1), (100.0, -90.0)]),
            segment(&[(200.5, 0.0), (300.0, 0.0)]),
        ];
        snap_endpoints(&mut segments, 1.0);
        let once = segments.clone();
        assert_eq!(snap_endpoints(&mut segments, 1.0), 0);
        assert_eq!(segments, once);
    }

    #[test]
    fn second_pass_can_merge_an_endpoint_left_out() {
        let mut segments = vec![
            segment(&[(0.0, 0.0), (-100.0, 0.0)]),
            segment(&[(1.0, 0.0), (1.0, 100.0)]),
            segment(&[(1.05, 0.0), (100.0, 0.0)]),
        ];

        // 0 and 1.0 are exactly the tolerance apart, 1.05 is beyond it
        assert_eq!(snap_endpoints(&mut segments, 1.0), 2);
        assert_close(segments[0].geometry.0[0], 0.5, 0.0);
        assert_close(segments[1].geometry.0[0], 0.5, 0.0);
        assert_eq!(segments[2].geometry.0[0], Coord { x: 1.05, y: 0.0 });

        // The centroid at 0.5 is now within reach of 1.05
        assert_eq!(snap_endpoints(&mut segments, 1.0), 3);
        let merged = (0.5 + 0.5 + 1.05) / 3.0;
        for segment in &segments {
            assert_close(segment.geometry.0[0], merged, 0.0);
        }
    }
}
