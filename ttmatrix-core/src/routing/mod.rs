//! Shortest-path search over the multimodal graph and the travel-time matrix
//! built from it.

pub mod dijkstra;
pub mod matrix;

pub use dijkstra::travel_times_to;
pub use matrix::{TravelTimeMatrix, travel_time_matrix};
