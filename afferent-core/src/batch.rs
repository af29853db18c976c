// Copyright 2026 the Afferent Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Motion sample batching.
//!
//! Consecutive `MOVE`/`HOVER_MOVE` samples from one (device, source) stream
//! are queued in a [`Batch`] instead of being delivered one by one. When the
//! consumer flushes at a frame deadline, every queued sample no later than
//! the deadline is merged into a single delivered motion event; the rest
//! stay queued for the next frame. Batching never reorders samples, it only
//! merges adjacent compatible ones.

use alloc::vec;
use alloc::vec::Vec;

use crate::time::Nanos;
use crate::wire::MotionPayload;

/// One queued motion sample together with its wire sequence number.
#[derive(Clone, Copy, Debug)]
pub struct MotionSample {
    /// Sequence number the publisher assigned to this sample.
    pub seq: u32,
    /// The sample's wire payload.
    pub motion: MotionPayload,
}

/// A nonempty queue of consecutive compatible motion samples for one
/// (device, source) stream.
#[derive(Clone, Debug)]
pub struct Batch {
    /// Queued samples, oldest first. Nonempty while the batch is alive.
    pub samples: Vec<MotionSample>,
}

impl Batch {
    /// Starts a batch from its first sample.
    #[must_use]
    pub fn new(sample: MotionSample) -> Self {
        Self {
            samples: vec![sample],
        }
    }

    /// The oldest queued sample.
    #[must_use]
    pub fn head(&self) -> &MotionSample {
        &self.samples[0]
    }

    /// Device id of this batch's stream.
    #[must_use]
    pub fn device_id(&self) -> i32 {
        self.head().motion.device_id
    }

    /// Raw source bits of this batch's stream.
    #[must_use]
    pub fn source(&self) -> u32 {
        self.head().motion.source
    }

    /// Whether `motion` may be appended to this batch.
    ///
    /// A sample is appendable only when merging it into one delivered event
    /// keeps that event well-formed: identical pointer count, identical
    /// action code, and identical per-pointer properties in the same order.
    #[must_use]
    pub fn can_append(&self, motion: &MotionPayload) -> bool {
        let head = &self.head().motion;
        let pointer_count = motion.pointer_count;
        if head.pointer_count != pointer_count || head.action != motion.action {
            return false;
        }
        for i in 0..pointer_count as usize {
            if head.pointers[i].properties != motion.pointers[i].properties {
                return false;
            }
        }
        true
    }

    /// Index of the newest sample with `event_time <= time`, or `None` when
    /// even the oldest sample is later than `time`.
    #[must_use]
    pub fn last_index_no_later_than(&self, time: Nanos) -> Option<usize> {
        let mut index = 0;
        while index < self.samples.len() && self.samples[index].motion.event_time <= time {
            index += 1;
        }
        index.checked_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use bytemuck::Zeroable;

    use super::{Batch, MotionSample};
    use crate::event::{MotionAction, PointerCoords, PointerProperties, Source, ToolType};
    use crate::time::Nanos;
    use crate::wire::MotionPayload;

    fn sample(seq: u32, event_time: Nanos, pointer_ids: &[i32]) -> MotionSample {
        let mut motion = MotionPayload::zeroed();
        motion.pointer_count = pointer_ids.len() as u32;
        motion.event_time = event_time;
        motion.device_id = 1;
        motion.source = Source::TOUCHSCREEN.bits();
        motion.action = MotionAction::Move.code();
        for (i, &id) in pointer_ids.iter().enumerate() {
            motion.pointers[i].properties = PointerProperties::new(id, ToolType::Finger);
            motion.pointers[i].coords = PointerCoords::from_xy(id as f32, 0.0);
        }
        MotionSample { seq, motion }
    }

    #[test]
    fn compatible_moves_are_appendable() {
        let batch = Batch::new(sample(1, 10, &[0]));
        assert!(batch.can_append(&sample(2, 20, &[0]).motion));
    }

    #[test]
    fn pointer_count_change_blocks_append() {
        let batch = Batch::new(sample(1, 10, &[0]));
        assert!(!batch.can_append(&sample(2, 20, &[0, 1]).motion));
    }

    #[test]
    fn action_change_blocks_append() {
        let batch = Batch::new(sample(1, 10, &[0]));
        let mut up = sample(2, 20, &[0]).motion;
        up.action = MotionAction::Up.code();
        assert!(!batch.can_append(&up));
    }

    #[test]
    fn property_change_blocks_append() {
        let batch = Batch::new(sample(1, 10, &[0, 1]));
        // Same ids in a different order is a different event shape.
        assert!(!batch.can_append(&sample(2, 20, &[1, 0]).motion));

        let mut stylus = sample(2, 20, &[0, 1]).motion;
        stylus.pointers[1].properties = PointerProperties::new(1, ToolType::Stylus);
        assert!(!batch.can_append(&stylus));
    }

    #[test]
    fn split_search_finds_newest_sample_at_or_before_time() {
        let mut batch = Batch::new(sample(1, 10, &[0]));
        batch.samples.push(sample(2, 15, &[0]));
        batch.samples.push(sample(3, 20, &[0]));

        assert_eq!(batch.last_index_no_later_than(9), None);
        assert_eq!(batch.last_index_no_later_than(10), Some(0));
        assert_eq!(batch.last_index_no_later_than(18), Some(1));
        assert_eq!(batch.last_index_no_later_than(20), Some(2));
        assert_eq!(batch.last_index_no_later_than(100), Some(2));
    }
}
