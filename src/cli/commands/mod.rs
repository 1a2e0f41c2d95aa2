//! CLI command implementations

pub mod completions;
pub mod order;
pub mod repo;
pub mod search;
pub mod template;
pub mod utils;
