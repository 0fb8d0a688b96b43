use crate::{AtomicSnowflakeGenerator, DEFAULT_EPOCH, Error, Result, SnowflakeId, TimeSource};
#[cfg(feature = "std")]
use crate::SystemClock;

/// Everything a node needs to start generating IDs.
///
/// How the node ID gets assigned (static config, a registry, a lease) is up to
/// the caller; this type only carries and checks the values. With the `serde`
/// feature it deserializes from any serde format, with `epoch` optional.
///
/// # Example
///
/// ```
/// use casflake::{CUSTOM_EPOCH, GeneratorConfig};
///
/// let generator = GeneratorConfig::new(12)
///     .with_epoch(CUSTOM_EPOCH)
///     .build()
///     .unwrap();
/// assert_eq!(generator.node(), 12);
/// assert_eq!(generator.epoch(), CUSTOM_EPOCH);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(deny_unknown_fields))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeneratorConfig {
    /// Node ID in `0..=1023`, unique among cooperating generators.
    pub node_id: u64,
    /// Origin of the timestamp field, in milliseconds since the Unix epoch.
    #[cfg_attr(feature = "serde", serde(default = "default_epoch"))]
    pub epoch: i64,
}

#[cfg(feature = "serde")]
const fn default_epoch() -> i64 {
    DEFAULT_EPOCH
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::new(0)
    }
}

impl GeneratorConfig {
    /// A config for `node_id` using [`DEFAULT_EPOCH`].
    pub const fn new(node_id: u64) -> Self {
        Self {
            node_id,
            epoch: DEFAULT_EPOCH,
        }
    }

    /// Replaces the epoch.
    #[must_use]
    pub const fn with_epoch(mut self, epoch: i64) -> Self {
        self.epoch = epoch;
        self
    }

    /// Checks that the node ID fits the 10-bit node field.
    ///
    /// # Errors
    /// Returns [`Error::InvalidNodeId`] if `node_id` exceeds
    /// [`SnowflakeId::MAX_NODE_ID`].
    pub fn validate(&self) -> Result<()> {
        if self.node_id > SnowflakeId::MAX_NODE_ID {
            #[cfg(feature = "tracing")]
            tracing::warn!(node_id = self.node_id, "rejected out-of-range node id");
            return Err(Error::InvalidNodeId {
                node_id: self.node_id,
            });
        }
        Ok(())
    }

    /// Builds a generator on the system wall clock.
    ///
    /// # Errors
    /// Returns [`Error::InvalidNodeId`] if the node ID is out of range.
    #[cfg_attr(docsrs, doc(cfg(feature = "std")))]
    #[cfg(feature = "std")]
    pub fn build(self) -> Result<AtomicSnowflakeGenerator<SystemClock>> {
        self.build_with_time(SystemClock)
    }

    /// Builds a generator reading time from `time`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidNodeId`] if the node ID is out of range.
    pub fn build_with_time<T: TimeSource>(self, time: T) -> Result<AtomicSnowflakeGenerator<T>> {
        AtomicSnowflakeGenerator::with_time(self.node_id, self.epoch, time)
    }
}
