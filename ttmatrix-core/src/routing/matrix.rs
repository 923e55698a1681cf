//! All-pairs travel-time matrix between the origin/destination points

use log::{info, warn};
use rayon::prelude::*;

use super::dijkstra::travel_times_to;
use crate::model::{MultimodalModel, PointId};
use crate::{Error, MatrixConfig, Minutes};

/// Square matrix of shortest travel times between points, in input order.
///
/// `values[i][j]` is the time from point `i` to point `j`, `None` when `j`
/// cannot be reached from `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct TravelTimeMatrix {
    /// Name of the identifier property, used as label prefix
    pub id_field: String,
    pub ids: Vec<PointId>,
    pub values: Vec<Vec<Option<Minutes>>>,
}

impl TravelTimeMatrix {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn get(&self, from: usize, to: usize) -> Option<Minutes> {
        self.values.get(from)?.get(to).copied().flatten()
    }

    /// Row/column label of point `i`: the id field name followed by its id
    pub fn label(&self, i: usize) -> String {
        format!("{}{}", self.id_field, self.ids[i])
    }

    pub fn labels(&self) -> Vec<String> {
        (0..self.len()).map(|i| self.label(i)).collect()
    }

    /// Mean travel time from every point to all other reachable points.
    ///
    /// `None` for points that reach no other point.
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_travel_times(&self) -> Vec<Option<Minutes>> {
        self.values
            .iter()
            .enumerate()
            .map(|(from, row)| {
                let (sum, count) = row
                    .iter()
                    .enumerate()
                    .filter(|&(to, _)| to != from)
                    .filter_map(|(_, time)| *time)
                    .fold((0.0, 0usize), |(sum, n), time| (sum + time, n + 1));
                (count > 0).then(|| sum / count as f64)
            })
            .collect()
    }
}

/// Computes the travel-time matrix between all points of the model.
///
/// One shortest-path search runs per origin on a pool of `config.workers`
/// threads (all cores when unset). Row order always follows point order.
///
/// # Errors
///
/// Returns [`Error::WorkerPool`] if the thread pool cannot be created.
pub fn travel_time_matrix(
    model: &MultimodalModel,
    id_field: &str,
    config: &MatrixConfig,
) -> Result<TravelTimeMatrix, Error> {
    let graph = &model.graph;
    let targets: Vec<_> = (0..model.point_count())
        .filter_map(|i| graph.point_node(i))
        .collect();
    if targets.len() != model.point_count() {
        return Err(Error::InvalidGeometry(format!(
            "graph holds {} of {} points",
            targets.len(),
            model.point_count()
        )));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(workers) = config.workers {
        builder = builder.num_threads(workers);
    }
    let pool = builder.build()?;

    info!(
        "Computing travel times for {} points on {} threads",
        targets.len(),
        pool.current_num_threads()
    );

    let mut values: Vec<Vec<Option<Minutes>>> = pool.install(|| {
        targets
            .par_iter()
            .map(|&origin| travel_times_to(graph, origin, &targets))
            .collect()
    });
    symmetrize(&mut values);

    let unreachable = values.iter().flatten().filter(|t| t.is_none()).count();
    if unreachable > 0 {
        warn!("{unreachable} origin/destination pairs are unreachable");
    }
    info!("Travel time matrix computed");

    Ok(TravelTimeMatrix {
        id_field: id_field.to_string(),
        ids: model.points.iter().map(|p| p.id.clone()).collect(),
        values,
    })
}

/// Makes `values[i][j]` and `values[j][i]` identical.
///
/// Both directions follow the same undirected path but sum the edge weights
/// in opposite order, so they can differ in the last bit. The smaller time
/// is kept for both cells.
fn symmetrize(values: &mut [Vec<Option<Minutes>>]) {
    for i in 0..values.len() {
        for j in (i + 1)..values.len() {
            let time = match (values[i][j], values[j][i]) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
            values[i][j] = time;
            values[j][i] = time;
        }
    }
}
