pub mod engine;
pub mod heuristic;
pub mod normalize;
pub mod pipeline;
pub mod quant;

pub use engine::ScoringEngine;
pub use heuristic::base_score;
pub use pipeline::{fuse, Fetched, Signals};
