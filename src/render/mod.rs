/// Incremental rendering module
///
/// This module reveals the sorted/filtered view a batch at a time:
/// - Batch emission and id-based resumption (batch.rs)
/// - Visibility signal sources (watcher.rs)

pub mod batch;
pub mod watcher;

pub use batch::{Advance, Batch, BatchRenderer};
pub use watcher::{ScrollPosition, ScrollWatcher, VisibilityWatcher};
