mod regular_dijkstra;
mod state;

pub use regular_dijkstra::travel_times_to;
