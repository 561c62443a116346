pub mod paths;
mod sqlite;
mod store;

pub use sqlite::*;
pub use store::*;

/// SQL migration for the node table
pub const MIGRATION_001_NODES: &str = include_str!("migrations/001_nodes.sql");
