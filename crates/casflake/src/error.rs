use crate::id::SnowflakeId;

/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors `casflake` can produce.
///
/// Generating IDs is infallible. The only failure is handing a generator a
/// node ID that does not fit the 10-bit node field.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The node ID is outside `0..=1023`.
    #[error("invalid node id {node_id}; must be 0 <= id <= {max}", max = SnowflakeId::MAX_NODE_ID)]
    InvalidNodeId {
        /// The rejected node ID.
        node_id: u64,
    },
}
