/// State management module
///
/// This module handles all gallery state, including:
/// - Shared data structures (data.rs)
/// - Sort/filter composition over the record set (collection.rs)
/// - Durable preferences: favorites, identity, sort/filter (preferences.rs)
/// - Display helpers (format.rs)

pub mod collection;
pub mod data;
pub mod format;
pub mod preferences;
