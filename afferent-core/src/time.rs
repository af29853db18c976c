// Copyright 2026 the Afferent Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Nanosecond time vocabulary.
//!
//! All transport timestamps are signed nanoseconds in the host's monotonic
//! clock domain. The transport never interprets them as wall-clock values;
//! it only compares and subtracts them, so a plain alias keeps the batching
//! and resampling arithmetic readable.

/// A point in time or a duration, in nanoseconds of the monotonic clock.
pub type Nanos = i64;

/// Nanoseconds per millisecond.
pub const NANOS_PER_MS: Nanos = 1_000_000;

/// Converts whole milliseconds to [`Nanos`].
#[inline]
#[must_use]
pub const fn millis(ms: i64) -> Nanos {
    ms * NANOS_PER_MS
}

#[cfg(test)]
mod tests {
    use super::{millis, NANOS_PER_MS};

    #[test]
    fn millis_scale_by_a_million() {
        assert_eq!(millis(0), 0);
        assert_eq!(millis(5), 5 * NANOS_PER_MS);
        assert_eq!(millis(-3), -3_000_000);
    }
}
