// Copyright 2026 the Afferent Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic clock reads.

use afferent_core::time::Nanos;
use rustix::time::{clock_gettime, ClockId, Timespec};

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Returns the current `CLOCK_MONOTONIC` time in nanoseconds.
///
/// This is the clock consume times are stamped with and the clock frame
/// deadlines are expressed in.
#[must_use]
pub fn monotonic_now() -> Nanos {
    timespec_to_nanos(clock_gettime(ClockId::Monotonic))
}

fn timespec_to_nanos(timespec: Timespec) -> Nanos {
    timespec
        .tv_sec
        .saturating_mul(NANOS_PER_SECOND)
        .saturating_add(timespec.tv_nsec)
}

#[cfg(test)]
mod tests {
    use super::{monotonic_now, timespec_to_nanos};
    use rustix::time::Timespec;

    #[test]
    fn now_is_monotonic_non_decreasing() {
        let first = monotonic_now();
        let second = monotonic_now();
        assert!(second >= first, "monotonic clock should not go backwards");
    }

    #[test]
    fn timespec_conversion_builds_nanoseconds() {
        let input = Timespec {
            tv_sec: 12,
            tv_nsec: 345_678_901,
        };
        assert_eq!(timespec_to_nanos(input), 12_345_678_901);
    }

    #[test]
    fn timespec_conversion_saturates_on_large_values() {
        let input = Timespec {
            tv_sec: i64::MAX,
            tv_nsec: 999_999_999,
        };
        assert_eq!(timespec_to_nanos(input), i64::MAX);
    }
}
