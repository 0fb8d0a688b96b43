use crate::SnowflakeId;

/// A minimal interface for generating Snowflake IDs.
pub trait SnowflakeGenerator {
    /// Returns the node ID encoded into every generated ID.
    fn node(&self) -> u64;

    /// Generates the next ID. Never fails and never blocks.
    fn next_id(&self) -> SnowflakeId;
}
