/// JSON-loadable settings.
pub mod config;
/// Shared value types: frame indices, loop modes, directions.
pub mod core;
/// Error taxonomy.
pub mod error;
