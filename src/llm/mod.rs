pub mod client;
pub mod embedder;
pub mod narrator;
pub mod planner;
pub mod prompts;
pub mod types;
pub mod utils;

pub use client::*;
pub use embedder::*;
pub use narrator::*;
pub use planner::*;
pub use types::*;
