use std::collections::BinaryHeap;

use fixedbitset::FixedBitSet;
use petgraph::{graph::NodeIndex, visit::EdgeRef};

use super::state::State;
use crate::Minutes;
use crate::model::MultimodalGraph;

/// Dijkstra's algorithm over the multimodal graph
///
/// Returns the shortest travel time in minutes from `start` to each of
/// `targets`, in target order, `None` for unreachable targets. The search
/// stops as soon as every target is settled.
pub fn travel_times_to(
    graph: &MultimodalGraph,
    start: NodeIndex,
    targets: &[NodeIndex],
) -> Vec<Option<Minutes>> {
    let node_count = graph.node_count();
    let mut wanted = FixedBitSet::with_capacity(node_count);
    for target in targets {
        wanted.insert(target.index());
    }
    let mut remaining = wanted.count_ones(..);

    let mut search = Search::new(graph, start);
    while remaining > 0 {
        let Some(node) = search.settle_next() else {
            break;
        };
        if wanted.contains(node.index()) {
            remaining -= 1;
        }
    }

    targets
        .iter()
        .map(|target| search.settled_cost(*target))
        .collect()
}

struct Search<'a> {
    graph: &'a MultimodalGraph,
    distances: Vec<Minutes>,
    settled: FixedBitSet,
    heap: BinaryHeap<State>,
}

impl<'a> Search<'a> {
    fn new(graph: &'a MultimodalGraph, start: NodeIndex) -> Self {
        let node_count = graph.node_count();
        let mut distances = vec![Minutes::INFINITY; node_count];
        let mut heap = BinaryHeap::new();

        // Start node has distance 0
        if start.index() < node_count {
            distances[start.index()] = 0.0;
            heap.push(State {
                cost: 0.0,
                node: start,
            });
        }

        Self {
            graph,
            distances,
            settled: FixedBitSet::with_capacity(node_count),
            heap,
        }
    }

    /// Pops the next closest node, relaxes its edges and returns it
    fn settle_next(&mut self) -> Option<NodeIndex> {
        while let Some(State { cost, node }) = self.heap.pop() {
            // Skip stale heap entries
            if self.settled.contains(node.index()) || cost > self.distances[node.index()] {
                continue;
            }
            self.settled.insert(node.index());

            for edge in self.graph.edges(node) {
                let next = edge.target();
                let next_cost = cost + edge.weight().weight;
                if next_cost < self.distances[next.index()] {
                    self.distances[next.index()] = next_cost;
                    self.heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                }
            }
            return Some(node);
        }
        None
    }

    fn settled_cost(&self, node: NodeIndex) -> Option<Minutes> {
        self.settled
            .contains(node.index())
            .then(|| self.distances[node.index()])
    }
}
