use core::fmt;

/// A 64-bit Snowflake ID.
///
/// - 42 bits timestamp (ms since the generator's epoch)
/// - 10 bits node ID
/// - 12 bits sequence
///
/// ```text
///  Bit Index:  63             22 21             12 11             0
///              +----------------+-----------------+---------------+
///  Field:      | timestamp (42) |   node ID (10)  | sequence (12) |
///              +----------------+-----------------+---------------+
///              |<------------ MSB ------ 64 bits ------ LSB ------>|
/// ```
///
/// Ordering is the ordering of the raw integer, so IDs sort by timestamp, then
/// node ID, then sequence.
///
/// # Example
///
/// ```
/// use casflake::SnowflakeId;
///
/// let id = SnowflakeId::from_components(1000, 2, 1);
/// assert_eq!(id.timestamp(), 1000);
/// assert_eq!(id.node_id(), 2);
/// assert_eq!(id.sequence(), 1);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SnowflakeId {
    id: u64,
}

impl SnowflakeId {
    /// Width of the timestamp field.
    pub const TIMESTAMP_BITS: u32 = 42;

    /// Width of the node ID field.
    pub const NODE_ID_BITS: u32 = 10;

    /// Width of the sequence field.
    pub const SEQUENCE_BITS: u32 = 12;

    /// Bitmask for extracting the 42-bit timestamp field. Occupies bits 22
    /// through 63.
    pub const TIMESTAMP_MASK: u64 = (1 << Self::TIMESTAMP_BITS) - 1;

    /// Bitmask for extracting the 10-bit node ID field. Occupies bits 12
    /// through 21.
    pub const NODE_ID_MASK: u64 = (1 << Self::NODE_ID_BITS) - 1;

    /// Bitmask for extracting the 12-bit sequence field. Occupies bits 0
    /// through 11.
    pub const SEQUENCE_MASK: u64 = (1 << Self::SEQUENCE_BITS) - 1;

    /// Number of bits to shift the timestamp to its position (bit 22).
    pub const TIMESTAMP_SHIFT: u32 = Self::NODE_ID_SHIFT + Self::NODE_ID_BITS;

    /// Number of bits to shift the node ID to its position (bit 12).
    pub const NODE_ID_SHIFT: u32 = Self::SEQUENCE_SHIFT + Self::SEQUENCE_BITS;

    /// Number of bits to shift the sequence field (bit 0).
    pub const SEQUENCE_SHIFT: u32 = 0;

    /// Largest timestamp the layout can hold; about 139 years of
    /// milliseconds.
    pub const MAX_TIMESTAMP: u64 = Self::TIMESTAMP_MASK;

    /// Largest valid node ID.
    pub const MAX_NODE_ID: u64 = Self::NODE_ID_MASK;

    /// Largest sequence value within one millisecond.
    pub const MAX_SEQUENCE: u64 = Self::SEQUENCE_MASK;

    /// Packs the three fields into an ID. Each field is masked to its width.
    pub const fn from_components(timestamp: u64, node_id: u64, sequence: u64) -> Self {
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let node_id = (node_id & Self::NODE_ID_MASK) << Self::NODE_ID_SHIFT;
        let sequence = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self {
            id: timestamp | node_id | sequence,
        }
    }

    /// Wraps a raw packed value.
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Returns the raw packed value.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Returns the packed value reinterpreted as a signed integer, for stores
    /// that only offer a signed 64-bit column.
    ///
    /// The result is non-negative while the timestamp stays below `2^41`.
    #[allow(clippy::cast_possible_wrap)]
    pub const fn to_i64(&self) -> i64 {
        self.id as i64
    }

    /// Extracts the timestamp (ms since the generator's epoch).
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the node ID.
    pub const fn node_id(&self) -> u64 {
        (self.id >> Self::NODE_ID_SHIFT) & Self::NODE_ID_MASK
    }

    /// Extracts the sequence number.
    pub const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    /// Returns the embedded timestamp as milliseconds since the Unix epoch,
    /// given the epoch the ID was generated against.
    ///
    /// ```
    /// use casflake::{SnowflakeId, TWITTER_EPOCH};
    ///
    /// let id = SnowflakeId::from_components(5, 0, 0);
    /// assert_eq!(id.unix_millis(TWITTER_EPOCH), TWITTER_EPOCH + 5);
    /// ```
    #[allow(clippy::cast_possible_wrap)]
    pub const fn unix_millis(&self, epoch: i64) -> i64 {
        epoch.wrapping_add(self.timestamp() as i64)
    }
}

impl From<u64> for SnowflakeId {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl From<SnowflakeId> for u64 {
    fn from(id: SnowflakeId) -> Self {
        id.to_raw()
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeId")
            .field("id", &self.id)
            .field("timestamp", &self.timestamp())
            .field("node_id", &self.node_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn layout_covers_all_64_bits() {
        assert_eq!(
            SnowflakeId::TIMESTAMP_BITS + SnowflakeId::NODE_ID_BITS + SnowflakeId::SEQUENCE_BITS,
            64
        );
        assert_eq!(SnowflakeId::TIMESTAMP_SHIFT, 22);
        assert_eq!(SnowflakeId::NODE_ID_SHIFT, 12);
        assert_eq!(SnowflakeId::MAX_NODE_ID, 1023);
        assert_eq!(SnowflakeId::MAX_SEQUENCE, 4095);
        assert_eq!(SnowflakeId::MAX_TIMESTAMP, (1 << 42) - 1);
    }

    #[test]
    fn components_round_trip_at_boundaries() {
        let timestamps = [0, SnowflakeId::MAX_TIMESTAMP];
        let nodes = [0, SnowflakeId::MAX_NODE_ID];
        let sequences = [0, SnowflakeId::MAX_SEQUENCE];

        for &ts in &timestamps {
            for &node in &nodes {
                for &seq in &sequences {
                    let id = SnowflakeId::from_components(ts, node, seq);
                    assert_eq!(id.timestamp(), ts);
                    assert_eq!(id.node_id(), node);
                    assert_eq!(id.sequence(), seq);
                    assert_eq!(SnowflakeId::from_raw(id.to_raw()), id);
                }
            }
        }
    }

    #[test]
    fn all_fields_max_is_all_ones() {
        let id = SnowflakeId::from_components(
            SnowflakeId::MAX_TIMESTAMP,
            SnowflakeId::MAX_NODE_ID,
            SnowflakeId::MAX_SEQUENCE,
        );
        assert_eq!(id.to_raw(), u64::MAX);
        assert_eq!(id.to_i64(), -1);
    }

    #[test]
    fn out_of_range_components_are_masked() {
        let id = SnowflakeId::from_components(SnowflakeId::MAX_TIMESTAMP + 1, 1024, 4096);
        assert_eq!(id.to_raw(), 0);

        let id = SnowflakeId::from_components(3, 1025, 4097);
        assert_eq!(id.timestamp(), 3);
        assert_eq!(id.node_id(), 1);
        assert_eq!(id.sequence(), 1);
    }

    #[test]
    fn ordering_follows_timestamp_then_node_then_sequence() {
        let a = SnowflakeId::from_components(1, 1023, 4095);
        let b = SnowflakeId::from_components(2, 0, 0);
        let c = SnowflakeId::from_components(2, 0, 1);
        let d = SnowflakeId::from_components(2, 1, 0);
        assert!(a < b && b < c && c < d);
    }

    #[test]
    fn unix_millis_rebases_onto_epoch() {
        let id = SnowflakeId::from_components(1_000, 3, 0);
        assert_eq!(id.unix_millis(0), 1_000);
        assert_eq!(id.unix_millis(-5_000), -4_000);
    }

    #[test]
    fn display_prints_raw_integer() {
        let id = SnowflakeId::from_components(1, 0, 0);
        assert_eq!(id.to_string(), (1u64 << 22).to_string());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_raw_integer() {
        let id = SnowflakeId::from_components(42, 7, 9);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, id.to_raw().to_string());
        let back: SnowflakeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
