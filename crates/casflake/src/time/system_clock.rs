#[cfg(not(all(target_arch = "wasm32", target_os = "unknown")))]
use std::time::{SystemTime, UNIX_EPOCH};
#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
use web_time::{SystemTime, UNIX_EPOCH};

use crate::TimeSource;

/// The system wall clock.
///
/// Every call reads `SystemTime::now()`. The clock is not monotonic: NTP
/// adjustments can move it backward, which the generator absorbs by
/// continuing to count within its last observed millisecond.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn current_millis(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(since) => since.as_millis() as i64,
            // A clock set before 1970 reports how far behind it is.
            Err(e) => -(e.duration().as_millis() as i64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CUSTOM_EPOCH;

    #[test]
    fn system_clock_reports_present_day() {
        let now = SystemClock.current_millis();
        assert!(now > CUSTOM_EPOCH);
    }

    #[test]
    fn system_clock_does_not_jump_far_between_reads() {
        let a = SystemClock.current_millis();
        let b = SystemClock.current_millis();
        assert!((b - a).abs() < 1_000);
    }
}
