//! R-tree helpers for nearest-neighbour and radius queries in planar space.
//!
//! Query results are ordered by distance, ties broken by the smaller item
//! index, so that graph construction does not depend on tree layout.

use geo::Coord;
use rstar::RTree;
use rstar::primitives::{GeomWithData, Line};

use crate::model::NetworkSegment;

/// Point tagged with its position in the source collection
pub type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Straight piece of a polyline tagged with the polyline's index
pub type IndexedSegment = GeomWithData<Line<[f64; 2]>, usize>;

pub fn point_tree<I>(coords: I) -> RTree<IndexedPoint>
where
    I: IntoIterator<Item = Coord<f64>>,
{
    let items = coords
        .into_iter()
        .enumerate()
        .map(|(idx, c)| IndexedPoint::new([c.x, c.y], idx))
        .collect();
    RTree::bulk_load(items)
}

pub fn segment_tree(segments: &[NetworkSegment]) -> RTree<IndexedSegment> {
    let items = segments
        .iter()
        .enumerate()
        .flat_map(|(idx, segment)| {
            segment
                .geometry
                .0
                .windows(2)
                .map(move |pair| {
                    IndexedSegment::new(
                        Line::new([pair[0].x, pair[0].y], [pair[1].x, pair[1].y]),
                        idx,
                    )
                })
        })
        .collect();
    RTree::bulk_load(items)
}

/// Up to `k` nearest items as `(index, distance)`, closest first.
pub fn nearest_k(tree: &RTree<IndexedPoint>, at: Coord<f64>, k: usize) -> Vec<(usize, f64)> {
    if k == 0 {
        return Vec::new();
    }
    let mut found: Vec<(usize, f64)> = Vec::with_capacity(k + 1);
    let mut cutoff = f64::INFINITY;
    for (item, distance_2) in tree.nearest_neighbor_iter_with_distance_2(&[at.x, at.y]) {
        if found.len() >= k && distance_2 > cutoff {
            break;
        }
        found.push((item.data, distance_2));
        if found.len() == k {
            cutoff = distance_2;
        }
    }
    finish(found, k)
}

/// Like [`nearest_k`] but skips the item with index `exclude`.
pub fn nearest_k_excluding(
    tree: &RTree<IndexedPoint>,
    at: Coord<f64>,
    k: usize,
    exclude: usize,
) -> Vec<(usize, f64)> {
    let mut found = nearest_k(tree, at, k + 1);
    found.retain(|(idx, _)| *idx != exclude);
    found.truncate(k);
    found
}

/// Indices of all items within `radius` (inclusive), in index order.
pub fn within_radius(tree: &RTree<IndexedPoint>, at: Coord<f64>, radius: f64) -> Vec<usize> {
    let mut found: Vec<usize> = tree
        .locate_within_distance([at.x, at.y], radius * radius)
        .map(|item| item.data)
        .collect();
    found.sort_unstable();
    found
}

/// Index of the polyline closest to `at`, the lowest index on ties.
pub fn nearest_segment(tree: &RTree<IndexedSegment>, at: Coord<f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (item, distance_2) in tree.nearest_neighbor_iter_with_distance_2(&[at.x, at.y]) {
        match best {
            Some((_, best_d)) if distance_2 > best_d => break,
            Some((best_idx, best_d)) if item.data < best_idx => best = Some((item.data, best_d)),
            Some(_) => {}
            None => best = Some((item.data, distance_2)),
        }
    }
    best.map(|(idx, _)| idx)
}

fn finish(mut found: Vec<(usize, f64)>, k: usize) -> Vec<(usize, f64)> {
    found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    found.truncate(k);
    found
        .into_iter()
        .map(|(idx, distance_2)| (idx, distance_2.sqrt()))
        .collect()
}
