//! State module for tracking crawl progress across runs
//!
//! # Components
//!
//! - `VisitedIndex`: In-memory set of URLs already processed, rebuilt from the record sink
//! - `RunSnapshot`: The pending frontier, written at the end of every run and read at the start of the next

mod snapshot;
mod visited;

// Re-export main types
pub use snapshot::{RunSnapshot, SnapshotError};
pub use visited::VisitedIndex;
