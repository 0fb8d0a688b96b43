use core::fmt;

use portable_atomic::{AtomicU64, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{GeneratorConfig, Result, SnowflakeGenerator, SnowflakeId, TimeSource};
#[cfg(feature = "std")]
use crate::{DEFAULT_EPOCH, SystemClock};

/// Number of compare-and-swap attempts [`AtomicSnowflakeGenerator::next_id`]
/// makes before falling back to a blind increment. Each attempt costs tens of
/// nanoseconds, which caps a call at a few microseconds.
pub const MAX_CAS_ATTEMPTS: usize = 100;

/// A lock-free Snowflake ID generator suitable for multi-threaded environments.
///
/// The mutable part of an ID (timestamp and sequence) lives in one
/// [`AtomicU64`]. The node ID is fixed at construction and OR-ed in when an ID
/// is emitted, so it never takes part in the atomic update.
///
/// ## Guarantees
/// - IDs from one generator are unique, and strictly increasing in the order
///   their calls linearize.
/// - [`Self::next_id`] never blocks and never fails. Worst case it makes
///   [`MAX_CAS_ATTEMPTS`] attempts and then takes the contention fallback.
///
/// ## Clock drift
/// When a millisecond's 4096 sequence values run out, the generator borrows
/// the next millisecond instead of waiting for the clock. Under sustained load
/// the embedded timestamp can therefore run ahead of the wall clock; it
/// resynchronizes as soon as real time overtakes it. The contention fallback
/// can likewise push the timestamp forward by one millisecond without
/// consulting the clock. Neither case is reported as an error.
pub struct AtomicSnowflakeGenerator<T>
where
    T: TimeSource,
{
    // Packed as `timestamp << SEQUENCE_BITS | sequence`. Keeping the node bits
    // out of the word means a carry out of the sequence lands in the
    // timestamp.
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    state: AtomicU64,
    node_id: u64,
    epoch: i64,
    time: T,
}

#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
#[cfg(feature = "std")]
impl AtomicSnowflakeGenerator<SystemClock> {
    /// Creates a generator for `node_id` against [`DEFAULT_EPOCH`], reading
    /// the system wall clock.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidNodeId`] if `node_id` exceeds
    /// [`SnowflakeId::MAX_NODE_ID`].
    ///
    /// # Example
    /// ```
    /// use casflake::AtomicSnowflakeGenerator;
    ///
    /// let generator = AtomicSnowflakeGenerator::new(3).unwrap();
    /// assert_eq!(generator.node(), 3);
    /// assert!(AtomicSnowflakeGenerator::new(1024).is_err());
    /// ```
    pub fn new(node_id: u64) -> Result<Self> {
        Self::with_epoch(node_id, DEFAULT_EPOCH)
    }

    /// Creates a generator for `node_id` with a custom epoch, in milliseconds
    /// since the Unix epoch. Any value is accepted, including dates before
    /// 1970 or in the future.
    ///
    /// Keep the epoch stable across restarts of the same node, or IDs issued
    /// after the restart will not sort after the ones issued before it.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidNodeId`] if `node_id` exceeds
    /// [`SnowflakeId::MAX_NODE_ID`].
    pub fn with_epoch(node_id: u64, epoch: i64) -> Result<Self> {
        Self::with_time(node_id, epoch, SystemClock)
    }
}

impl<T> AtomicSnowflakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a generator reading time from `time`.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidNodeId`] if `node_id` exceeds
    /// [`SnowflakeId::MAX_NODE_ID`].
    ///
    /// # Example
    /// ```
    /// use casflake::{AtomicSnowflakeGenerator, TimeSource};
    ///
    /// struct FixedTime;
    /// impl TimeSource for FixedTime {
    ///     fn current_millis(&self) -> i64 {
    ///         1_042
    ///     }
    /// }
    ///
    /// let generator = AtomicSnowflakeGenerator::with_time(1, 1_000, FixedTime).unwrap();
    /// let id = generator.next_id();
    /// assert_eq!(id.timestamp(), 42);
    /// assert_eq!(id.sequence(), 0);
    /// ```
    pub fn with_time(node_id: u64, epoch: i64, time: T) -> Result<Self> {
        Self::from_components(0, 0, node_id, epoch, time)
    }

    /// Creates a generator whose last issued ID had the given `timestamp` and
    /// `sequence`.
    ///
    /// Useful for resuming after a restart from the last persisted ID, and for
    /// driving the generator into edge states in tests. Both values are masked
    /// to their field widths.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidNodeId`] if `node_id` exceeds
    /// [`SnowflakeId::MAX_NODE_ID`].
    pub fn from_components(
        timestamp: u64,
        sequence: u64,
        node_id: u64,
        epoch: i64,
        time: T,
    ) -> Result<Self> {
        GeneratorConfig { node_id, epoch }.validate()?;

        let initial = pack_state(timestamp, sequence);
        #[cfg(feature = "tracing")]
        tracing::debug!(node_id, epoch, timestamp, sequence, "created snowflake generator");

        Ok(Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(AtomicU64::new(initial)),
            #[cfg(not(feature = "cache-padded"))]
            state: AtomicU64::new(initial),
            node_id,
            epoch,
            time,
        })
    }

    /// Returns the configured node ID.
    pub const fn node(&self) -> u64 {
        self.node_id
    }

    /// Returns the configured epoch, in milliseconds since the Unix epoch.
    pub const fn epoch(&self) -> i64 {
        self.epoch
    }

    /// Generates the next ID.
    ///
    /// Each attempt reads the clock, derives the successor of the current
    /// state and tries to publish it with a single compare-and-swap:
    ///
    /// - the clock is past the stored millisecond: move to it, sequence 0
    /// - the sequence is exhausted: borrow the next millisecond, sequence 0
    /// - otherwise: bump the sequence
    ///
    /// After [`MAX_CAS_ATTEMPTS`] lost races the state is incremented
    /// unconditionally, which still yields a unique, larger ID but skips the
    /// clock check.
    ///
    /// # Example
    /// ```
    /// use casflake::AtomicSnowflakeGenerator;
    ///
    /// let generator = AtomicSnowflakeGenerator::new(0).unwrap();
    /// let a = generator.next_id();
    /// let b = generator.next_id();
    /// assert!(a < b);
    /// ```
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> SnowflakeId {
        let state = (0..MAX_CAS_ATTEMPTS)
            .find_map(|_| self.try_advance())
            .unwrap_or_else(|| self.cold_increment());

        let (timestamp, sequence) = unpack_state(state);
        SnowflakeId::from_components(timestamp, self.node_id, sequence)
    }

    /// Milliseconds since the epoch, truncated to the timestamp field.
    #[allow(clippy::cast_sign_loss)]
    fn elapsed_millis(&self) -> u64 {
        let elapsed = self.time.current_millis().wrapping_sub(self.epoch);
        (elapsed as u64) & SnowflakeId::TIMESTAMP_MASK
    }

    /// One compare-and-swap attempt. Returns the published state on success.
    #[inline]
    fn try_advance(&self) -> Option<u64> {
        let now = self.elapsed_millis();
        let current = self.state.load(Ordering::Relaxed);
        let next = successor(current, now);

        // Every write is an RMW on this one word, so their modification order
        // alone keeps states unique and increasing.
        self.state
            .compare_exchange(current, next, Ordering::Relaxed, Ordering::Relaxed)
            .ok()
            .map(|_| next)
    }

    /// Contention fallback. A full sequence carries into the timestamp.
    #[cold]
    #[inline(never)]
    fn cold_increment(&self) -> u64 {
        let state = self.state.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        #[cfg(feature = "tracing")]
        tracing::debug!(
            node_id = self.node_id,
            attempts = MAX_CAS_ATTEMPTS,
            "cas attempts exhausted, incrementing state unconditionally"
        );
        state
    }
}

impl<T> SnowflakeGenerator for AtomicSnowflakeGenerator<T>
where
    T: TimeSource,
{
    fn node(&self) -> u64 {
        self.node()
    }

    fn next_id(&self) -> SnowflakeId {
        self.next_id()
    }
}

impl<T> fmt::Debug for AtomicSnowflakeGenerator<T>
where
    T: TimeSource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (timestamp, sequence) = unpack_state(self.state.load(Ordering::Relaxed));
        f.debug_struct("AtomicSnowflakeGenerator")
            .field("node_id", &self.node_id)
            .field("epoch", &self.epoch)
            .field("timestamp", &timestamp)
            .field("sequence", &sequence)
            .finish_non_exhaustive()
    }
}

const fn pack_state(timestamp: u64, sequence: u64) -> u64 {
    ((timestamp & SnowflakeId::TIMESTAMP_MASK) << SnowflakeId::SEQUENCE_BITS)
        | (sequence & SnowflakeId::SEQUENCE_MASK)
}

const fn unpack_state(state: u64) -> (u64, u64) {
    (
        (state >> SnowflakeId::SEQUENCE_BITS) & SnowflakeId::TIMESTAMP_MASK,
        state & SnowflakeId::SEQUENCE_MASK,
    )
}

/// The state that follows `current` when the clock reads `now`.
const fn successor(current: u64, now: u64) -> u64 {
    let (current_ts, current_seq) = unpack_state(current);

    if now > current_ts {
        pack_state(now, 0)
    } else if current_seq == SnowflakeId::MAX_SEQUENCE {
        // Clock hasn't caught up; run ahead of it.
        pack_state(current_ts + 1, 0)
    } else {
        // Cannot carry: a full sequence took the branch above.
        current.wrapping_add(1)
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    struct FixedTime;
    impl TimeSource for FixedTime {
        fn current_millis(&self) -> i64 {
            42
        }
    }

    #[test]
    fn successor_moves_to_newer_millisecond() {
        let current = pack_state(10, 17);
        assert_eq!(unpack_state(successor(current, 11)), (11, 0));
    }

    #[test]
    fn successor_borrows_next_millisecond_when_sequence_is_full() {
        let current = pack_state(10, SnowflakeId::MAX_SEQUENCE);
        assert_eq!(unpack_state(successor(current, 10)), (11, 0));
        // Clock behind the stored timestamp takes the same path.
        assert_eq!(unpack_state(successor(current, 3)), (11, 0));
    }

    #[test]
    fn successor_bumps_sequence_within_millisecond() {
        let current = pack_state(10, 5);
        assert_eq!(unpack_state(successor(current, 10)), (10, 6));
        assert_eq!(unpack_state(successor(current, 9)), (10, 6));
    }

    #[test]
    fn successor_wraps_timestamp_at_field_width() {
        let current = pack_state(SnowflakeId::MAX_TIMESTAMP, SnowflakeId::MAX_SEQUENCE);
        assert_eq!(
            unpack_state(successor(current, SnowflakeId::MAX_TIMESTAMP)),
            (0, 0)
        );
    }

    #[test]
    fn cold_increment_carries_full_sequence_into_timestamp() {
        let generator = AtomicSnowflakeGenerator::from_components(
            42,
            SnowflakeId::MAX_SEQUENCE,
            1023,
            0,
            FixedTime,
        )
        .unwrap();

        let state = generator.cold_increment();
        assert_eq!(unpack_state(state), (43, 0));

        // The node field is untouched by the carry.
        let id = generator.next_id();
        assert_eq!(id.timestamp(), 43);
        assert_eq!(id.node_id(), 1023);
        assert_eq!(id.sequence(), 1);
    }

    #[test]
    fn cold_increment_bumps_sequence() {
        let generator = AtomicSnowflakeGenerator::from_components(42, 7, 0, 0, FixedTime).unwrap();
        assert_eq!(unpack_state(generator.cold_increment()), (42, 8));
        assert_eq!(unpack_state(generator.cold_increment()), (42, 9));
    }

    #[test]
    fn debug_shows_state_fields() {
        let generator = AtomicSnowflakeGenerator::from_components(42, 7, 5, 0, FixedTime).unwrap();
        let debug = format!("{generator:?}");
        assert!(debug.contains("node_id: 5"));
        assert!(debug.contains("timestamp: 42"));
        assert!(debug.contains("sequence: 7"));
    }
}
