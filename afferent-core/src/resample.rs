// Copyright 2026 the Afferent Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Touch resampling.
//!
//! Display frames and touch reports tick on unrelated clocks, so the newest
//! queued sample is rarely aligned with the frame being drawn. The
//! [`Resampler`] synthesizes one extra sample per delivered move event at
//! the frame's chosen `sample_time`: by *interpolating* between the newest
//! delivered sample and a still-queued future one when available, or by
//! bounded *extrapolation* from the two most recent samples otherwise.
//!
//! Sampling a few milliseconds behind the frame deadline
//! ([`RESAMPLE_LATENCY`]) tolerates producer jitter; extrapolation is capped
//! ([`RESAMPLE_MAX_PREDICTION`], and half the last delta) to bound
//! overshoot; and once a coordinate has been resampled, an unmoved pointer
//! keeps reporting the synthesized position so a stationary finger does not
//! shimmer between the raw and smoothed values.

use alloc::vec::Vec;
use core::cmp::min;

use crate::event::{
    axis, MotionAction, MotionEvent, PointerCoords, Source, MAX_POINTERS, MAX_POINTER_ID,
};
use crate::time::{Nanos, NANOS_PER_MS};
use crate::wire::MotionPayload;

/// Latency subtracted from the frame time to pick the resample point. A few
/// milliseconds reduces the impact of mispredicted touch positions.
pub const RESAMPLE_LATENCY: Nanos = 5 * NANOS_PER_MS;

/// Minimum delta between the samples feeding a resample.
pub const RESAMPLE_MIN_DELTA: Nanos = 2 * NANOS_PER_MS;

/// Maximum delta between the samples feeding an extrapolation.
pub const RESAMPLE_MAX_DELTA: Nanos = 20 * NANOS_PER_MS;

/// Hard cap on how far ahead of the newest sample an extrapolation may
/// predict; additionally bounded by half the last sample delta.
pub const RESAMPLE_MAX_PREDICTION: Nanos = 8 * NANOS_PER_MS;

#[inline]
fn lerp(a: f32, b: f32, alpha: f32) -> f32 {
    a + alpha * (b - a)
}

/// A small bitset over pointer ids `0..=MAX_POINTER_ID`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointerIdBits(u32);

impl PointerIdBits {
    /// Marks `id` as present.
    #[inline]
    pub fn mark(&mut self, id: u32) {
        debug_assert!(id <= MAX_POINTER_ID);
        self.0 |= 1 << id;
    }

    /// Clears `id`.
    #[inline]
    pub fn clear(&mut self, id: u32) {
        debug_assert!(id <= MAX_POINTER_ID);
        self.0 &= !(1 << id);
    }

    /// Whether `id` is present.
    #[inline]
    #[must_use]
    pub const fn has(self, id: u32) -> bool {
        self.0 & (1 << id) != 0
    }

    /// Clears every id.
    #[inline]
    pub fn clear_all(&mut self) {
        self.0 = 0;
    }

    /// Number of ids present.
    #[inline]
    #[must_use]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }
}

/// One recorded touch sample: the coordinates of every live pointer at one
/// event time, addressable by pointer id.
///
/// Invariants: `id_bits` holds exactly the ids present in `pointers`, and
/// the id→index map is a bijection onto `0..count`.
#[derive(Clone, Copy, Debug)]
pub struct History {
    /// When this sample occurred.
    pub event_time: Nanos,
    /// The pointer ids present in this sample.
    pub id_bits: PointerIdBits,
    id_to_index: [u8; (MAX_POINTER_ID + 1) as usize],
    /// Per-pointer coordinates, indexed by the id→index map.
    pub pointers: [PointerCoords; MAX_POINTERS],
}

impl History {
    /// An empty sample at time zero.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            event_time: 0,
            id_bits: PointerIdBits::default(),
            id_to_index: [0; (MAX_POINTER_ID + 1) as usize],
            pointers: [PointerCoords::default(); MAX_POINTERS],
        }
    }

    /// Captures the pointers of one motion payload.
    #[must_use]
    pub fn from_motion(motion: &MotionPayload) -> Self {
        let mut history = Self::empty();
        history.event_time = motion.event_time;
        for i in 0..motion.pointer_count as usize {
            let id = motion.pointers[i].properties.id as u32;
            history.assign_index(id, i);
            history.pointers[i] = motion.pointers[i].coords;
        }
        history
    }

    /// Whether pointer `id` is present in this sample.
    #[inline]
    #[must_use]
    pub const fn has_pointer_id(&self, id: u32) -> bool {
        self.id_bits.has(id)
    }

    /// Coordinates of pointer `id`.
    ///
    /// # Panics
    ///
    /// May return stale data or panic if `id` is not present; check
    /// [`has_pointer_id`](Self::has_pointer_id) first.
    #[inline]
    #[must_use]
    pub fn coords_for_id(&self, id: u32) -> &PointerCoords {
        debug_assert!(self.has_pointer_id(id));
        &self.pointers[self.id_to_index[id as usize] as usize]
    }

    /// Maps pointer `id` to slot `index` and marks it present.
    pub fn assign_index(&mut self, id: u32, index: usize) {
        debug_assert!(index < MAX_POINTERS);
        self.id_to_index[id as usize] = index as u8;
        self.id_bits.mark(id);
    }
}

impl Default for History {
    fn default() -> Self {
        Self::empty()
    }
}

/// Per-stream resampling state, created on `DOWN` and destroyed on
/// `UP`/`CANCEL`.
#[derive(Clone, Debug)]
pub struct TouchState {
    /// Device of this stream.
    pub device_id: i32,
    /// Source of this stream.
    pub source: Source,
    history_current: usize,
    history_size: usize,
    history: [History; 2],
    /// The coordinates most recently synthesized for this stream.
    pub last_resample: History,
}

impl TouchState {
    fn new(device_id: i32, source: Source) -> Self {
        Self {
            device_id,
            source,
            history_current: 0,
            history_size: 0,
            history: [History::empty(); 2],
            last_resample: History::empty(),
        }
    }

    fn reinitialize(&mut self, device_id: i32, source: Source) {
        self.device_id = device_id;
        self.source = source;
        self.history_current = 0;
        self.history_size = 0;
        self.last_resample = History::empty();
    }

    fn add_history(&mut self, motion: &MotionPayload) {
        self.history_current ^= 1;
        if self.history_size < 2 {
            self.history_size += 1;
        }
        self.history[self.history_current] = History::from_motion(motion);
    }

    /// Recorded sample `index` back from the most recent (0 or 1).
    #[must_use]
    pub fn history(&self, index: usize) -> &History {
        debug_assert!(index < self.history_size);
        &self.history[(self.history_current + index) & 1]
    }

    /// Number of recorded samples (at most 2).
    #[must_use]
    pub fn history_size(&self) -> usize {
        self.history_size
    }

    /// Whether pointer `id` reported identical coordinates in the two most
    /// recent raw samples.
    #[must_use]
    pub fn recent_coordinates_are_identical(&self, id: u32) -> bool {
        if self.history_size < 2 {
            return false;
        }
        let current = self.history(0);
        let previous = self.history(1);
        if !current.has_pointer_id(id) || !previous.has_pointer_id(id) {
            return false;
        }
        let current_coords = current.coords_for_id(id);
        let previous_coords = previous.coords_for_id(id);
        current_coords.x() == previous_coords.x() && current_coords.y() == previous_coords.y()
    }
}

/// The consumer's set of per-stream touch states and the resampling rules
/// over them.
#[derive(Clone, Debug, Default)]
pub struct Resampler {
    states: Vec<TouchState>,
}

impl Resampler {
    /// Creates a resampler with no active streams.
    #[must_use]
    pub const fn new() -> Self {
        Self { states: Vec::new() }
    }

    /// Number of active touch streams.
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Folds one incoming motion into the per-stream state, enforcing
    /// resampling consistency on its coordinates.
    ///
    /// `DOWN` creates (or reinitializes) the stream state; `MOVE` records
    /// history and may overwrite the message's coordinates with previously
    /// synthesized ones (see [`TouchState::last_resample`]); `POINTER_DOWN`
    /// and `POINTER_UP` retire the affected pointer's resample;
    /// `UP`/`CANCEL` destroy the state. Non-pointer sources are ignored.
    pub fn update(&mut self, msg: &mut MotionPayload) {
        if !Source::from_bits_retain(msg.source).is_pointer() {
            return;
        }
        let device_id = msg.device_id;
        let source = Source::from_bits_retain(msg.source);

        let Some(action) = MotionAction::from_code(msg.action) else {
            return;
        };
        match action {
            MotionAction::Down => {
                let index = match self.find_state(device_id, msg.source) {
                    Some(index) => index,
                    None => {
                        self.states.push(TouchState::new(device_id, source));
                        self.states.len() - 1
                    }
                };
                let state = &mut self.states[index];
                state.reinitialize(device_id, source);
                state.add_history(msg);
            }
            MotionAction::Move => {
                if let Some(index) = self.find_state(device_id, msg.source) {
                    let state = &mut self.states[index];
                    state.add_history(msg);
                    Self::rewrite_message(state, msg);
                }
            }
            MotionAction::PointerDown => {
                if let Some(index) = self.find_state(device_id, msg.source) {
                    let state = &mut self.states[index];
                    state
                        .last_resample
                        .id_bits
                        .clear(msg.action_pointer_id() as u32);
                    Self::rewrite_message(state, msg);
                }
            }
            MotionAction::PointerUp => {
                if let Some(index) = self.find_state(device_id, msg.source) {
                    let state = &mut self.states[index];
                    Self::rewrite_message(state, msg);
                    state
                        .last_resample
                        .id_bits
                        .clear(msg.action_pointer_id() as u32);
                }
            }
            MotionAction::Scroll => {
                if let Some(index) = self.find_state(device_id, msg.source) {
                    Self::rewrite_message(&mut self.states[index], msg);
                }
            }
            MotionAction::Up | MotionAction::Cancel => {
                if let Some(index) = self.find_state(device_id, msg.source) {
                    Self::rewrite_message(&mut self.states[index], msg);
                    self.states.remove(index);
                }
            }
            _ => {}
        }
    }

    /// Appends one synthesized sample at `sample_time` to a delivered move
    /// event.
    ///
    /// `next` is the oldest still-queued raw sample of the same stream, if
    /// any; its presence selects interpolation over extrapolation. Bails
    /// without appending whenever the predicate rules fail (wrong action,
    /// missing history, missing pointers, deltas outside
    /// [`RESAMPLE_MIN_DELTA`]..[`RESAMPLE_MAX_DELTA`], or a duplicate
    /// sample time).
    pub fn resample(
        &mut self,
        sample_time: Nanos,
        event: &mut MotionEvent,
        next: Option<&MotionPayload>,
    ) {
        if !event.source.is_pointer() || MotionAction::from_code(event.action) != Some(MotionAction::Move)
        {
            return;
        }

        let Some(index) = self.find_state(event.device_id, event.source.bits()) else {
            return;
        };
        let state = &mut self.states[index];
        if state.history_size() < 1 {
            return;
        }

        // The synthesized sample must cover every pointer the event reports.
        let pointer_count = event.pointer_count();
        for i in 0..pointer_count {
            if !state.history(0).has_pointer_id(event.pointer_id(i) as u32) {
                return;
            }
        }

        let current = *state.history(0);
        let mut sample_time = sample_time;
        let (other, alpha) = if let Some(next) = next {
            // Interpolate between the current and the queued future sample:
            // current.event_time <= sample_time <= future.event_time.
            let future = History::from_motion(next);
            let delta = future.event_time - current.event_time;
            if delta < RESAMPLE_MIN_DELTA {
                return;
            }
            let alpha = (sample_time - current.event_time) as f32 / delta as f32;
            (future, alpha)
        } else if state.history_size() >= 2 {
            // Extrapolate from the past sample through the current one:
            // other.event_time <= current.event_time <= sample_time.
            let other = *state.history(1);
            let delta = current.event_time - other.event_time;
            if !(RESAMPLE_MIN_DELTA..=RESAMPLE_MAX_DELTA).contains(&delta) {
                return;
            }
            let max_predict = current.event_time + min(delta / 2, RESAMPLE_MAX_PREDICTION);
            if sample_time > max_predict {
                sample_time = max_predict;
            }
            let alpha = (current.event_time - sample_time) as f32 / delta as f32;
            (other, alpha)
        } else {
            return;
        };

        if current.event_time == sample_time {
            // Never emit two samples with identical times.
            return;
        }

        let old_last_resample = state.last_resample;
        let mut new_resample = History::empty();
        new_resample.event_time = sample_time;
        for i in 0..pointer_count {
            let id = event.pointer_id(i) as u32;
            new_resample.assign_index(id, i);
            if old_last_resample.has_pointer_id(id) && state.recent_coordinates_are_identical(id) {
                // The raw coordinates have not moved since the last
                // synthesized sample, so keep reporting that sample's
                // position. The mapping from id to index may have changed,
                // which is why the slot is re-derived from the old record.
                new_resample.pointers[i] = *old_last_resample.coords_for_id(id);
                continue;
            }

            let current_coords = current.coords_for_id(id);
            let mut resampled_coords = *current_coords;
            resampled_coords.set_resampled(true);
            if other.has_pointer_id(id) && event.tool_type(i).is_resampleable() {
                let other_coords = other.coords_for_id(id);
                resampled_coords.set_axis_value(
                    axis::X,
                    lerp(current_coords.x(), other_coords.x(), alpha),
                );
                resampled_coords.set_axis_value(
                    axis::Y,
                    lerp(current_coords.y(), other_coords.y(), alpha),
                );
            }
            new_resample.pointers[i] = resampled_coords;
        }
        state.last_resample = new_resample;

        let coords = &state.last_resample.pointers[..pointer_count];
        event.add_sample(sample_time, coords);
    }

    fn find_state(&self, device_id: i32, source: u32) -> Option<usize> {
        self.states
            .iter()
            .position(|state| state.device_id == device_id && state.source.bits() == source)
    }

    /// Replaces coordinates in `msg` with the previously synthesized ones
    /// where the resample is still authoritative.
    ///
    /// A pointer's resample stays authoritative while the incoming message
    /// is older than it, or while the pointer's raw coordinates have not
    /// changed between the two most recent samples. Otherwise the resample
    /// is stale and its id bit is retired, never touching ids absent from
    /// `msg`.
    fn rewrite_message(state: &mut TouchState, msg: &mut MotionPayload) {
        let event_time = msg.event_time;
        for i in 0..msg.pointer_count as usize {
            let id = msg.pointers[i].properties.id as u32;
            if !state.last_resample.id_bits.has(id) {
                continue;
            }
            if event_time < state.last_resample.event_time
                || state.recent_coordinates_are_identical(id)
            {
                let resample_coords = *state.last_resample.coords_for_id(id);
                let msg_coords = &mut msg.pointers[i].coords;
                msg_coords.set_axis_value(axis::X, resample_coords.x());
                msg_coords.set_axis_value(axis::Y, resample_coords.y());
                msg_coords.set_resampled(true);
            } else {
                state.last_resample.id_bits.clear(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use bytemuck::Zeroable;

    use super::*;
    use crate::event::{classification, MotionArgs, PointerProperties, ToolType};
    use crate::time::millis;
    use crate::transform::Transform2d;

    fn motion_msg(action: MotionAction, event_time: Nanos, pointers: &[(i32, f32, f32)]) -> MotionPayload {
        motion_msg_with_tool(action, event_time, pointers, ToolType::Finger)
    }

    fn motion_msg_with_tool(
        action: MotionAction,
        event_time: Nanos,
        pointers: &[(i32, f32, f32)],
        tool: ToolType,
    ) -> MotionPayload {
        let mut motion = MotionPayload::zeroed();
        motion.pointer_count = pointers.len() as u32;
        motion.event_time = event_time;
        motion.device_id = 1;
        motion.source = Source::TOUCHSCREEN.bits();
        motion.action = action.code();
        for (i, &(id, x, y)) in pointers.iter().enumerate() {
            motion.pointers[i].properties = PointerProperties::new(id, tool);
            motion.pointers[i].coords = PointerCoords::from_xy(x, y);
        }
        motion
    }

    fn move_event(msg: &MotionPayload) -> MotionEvent {
        let mut properties = Vec::new();
        let mut coords = Vec::new();
        for i in 0..msg.pointer_count as usize {
            properties.push(msg.pointers[i].properties);
            coords.push(msg.pointers[i].coords);
        }
        let mut event = MotionEvent::default();
        event.initialize(&MotionArgs {
            event_id: 0,
            device_id: msg.device_id,
            source: Source::from_bits_retain(msg.source),
            display_id: 0,
            hmac: [0; 32],
            action: msg.action,
            action_button: 0,
            flags: 0,
            edge_flags: 0,
            meta_state: 0,
            button_state: 0,
            classification: classification::NONE,
            transform: Transform2d::IDENTITY,
            x_precision: 1.0,
            y_precision: 1.0,
            x_cursor_position: 0.0,
            y_cursor_position: 0.0,
            raw_transform: Transform2d::IDENTITY,
            down_time: 0,
            event_time: msg.event_time,
            pointer_properties: &properties,
            pointer_coords: &coords,
        });
        event
    }

    /// Drives a DOWN followed by MOVEs through the resampler, returning the
    /// event built from the last MOVE.
    fn drive(resampler: &mut Resampler, moves: &[(Nanos, f32)]) -> MotionEvent {
        let mut down = motion_msg(MotionAction::Down, moves[0].0 - millis(10), &[(0, moves[0].1, moves[0].1)]);
        resampler.update(&mut down);
        let mut last = None;
        for &(t, x) in moves {
            let mut msg = motion_msg(MotionAction::Move, t, &[(0, x, x)]);
            resampler.update(&mut msg);
            last = Some(msg);
        }
        move_event(&last.expect("at least one move"))
    }

    #[test]
    fn interpolates_toward_a_queued_future_sample() {
        let mut resampler = Resampler::new();
        let mut event = drive(&mut resampler, &[(millis(0), 0.0)]);
        let next = motion_msg(MotionAction::Move, millis(10), &[(0, 10.0, 10.0)]);

        resampler.resample(millis(7), &mut event, Some(&next));

        assert_eq!(event.history_size(), 1);
        assert_eq!(event.event_time(), millis(7));
        let coords = event.pointer_coords(0);
        assert!((coords.x() - 7.0).abs() < 1e-4, "x = {}", coords.x());
        assert!(coords.is_resampled());
    }

    #[test]
    fn extrapolates_within_the_prediction_cap() {
        let mut resampler = Resampler::new();
        let mut event = drive(&mut resampler, &[(millis(0), 0.0), (millis(10), 10.0)]);

        resampler.resample(millis(15), &mut event, None);

        assert_eq!(event.event_time(), millis(15));
        let coords = event.pointer_coords(0);
        assert!((coords.x() - 15.0).abs() < 1e-4, "x = {}", coords.x());
        assert!(coords.is_resampled());
    }

    #[test]
    fn clamps_prediction_too_far_in_the_future() {
        let mut resampler = Resampler::new();
        let mut event = drive(&mut resampler, &[(millis(0), 0.0), (millis(10), 10.0)]);

        // maxPredict = 10ms + min(5ms, 8ms) = 15ms; 20ms must clamp there.
        resampler.resample(millis(20), &mut event, None);

        assert_eq!(event.event_time(), millis(15));
        let coords = event.pointer_coords(0);
        assert!((coords.x() - 15.0).abs() < 1e-4, "x = {}", coords.x());
    }

    #[test]
    fn bails_when_the_interpolation_delta_is_too_small() {
        let mut resampler = Resampler::new();
        let mut event = drive(&mut resampler, &[(millis(0), 0.0)]);
        let next = motion_msg(MotionAction::Move, millis(1), &[(0, 1.0, 1.0)]);

        resampler.resample(millis(1), &mut event, Some(&next));
        assert_eq!(event.history_size(), 0, "no sample appended");
    }

    #[test]
    fn bails_when_the_extrapolation_delta_is_too_large() {
        let mut resampler = Resampler::new();
        let mut event = drive(&mut resampler, &[(millis(0), 0.0), (millis(30), 30.0)]);

        resampler.resample(millis(35), &mut event, None);
        assert_eq!(event.history_size(), 0, "30ms delta exceeds the cap");
    }

    #[test]
    fn bails_with_a_single_sample_and_no_future() {
        let mut resampler = Resampler::new();
        let mut event = drive(&mut resampler, &[(millis(0), 0.0)]);

        resampler.resample(millis(5), &mut event, None);
        assert_eq!(event.history_size(), 0);
    }

    #[test]
    fn bails_when_a_pointer_is_missing_from_history() {
        let mut resampler = Resampler::new();
        let mut down = motion_msg(MotionAction::Down, millis(0), &[(0, 0.0, 0.0)]);
        resampler.update(&mut down);
        let mut one = motion_msg(MotionAction::Move, millis(5), &[(0, 1.0, 1.0)]);
        resampler.update(&mut one);

        // Event claims pointers 0 and 1, but history only has 0.
        let two = motion_msg(MotionAction::Move, millis(10), &[(0, 2.0, 2.0), (1, 2.0, 2.0)]);
        let mut event = move_event(&two);
        let next = motion_msg(MotionAction::Move, millis(20), &[(0, 3.0, 3.0), (1, 3.0, 3.0)]);

        resampler.resample(millis(12), &mut event, Some(&next));
        assert_eq!(event.history_size(), 0);
    }

    #[test]
    fn never_duplicates_the_current_sample_time() {
        let mut resampler = Resampler::new();
        let mut event = drive(&mut resampler, &[(millis(0), 0.0), (millis(10), 10.0)]);

        // Clamp path: maxPredict = 10ms + min(5, 8) = 15ms... but with a
        // sample_time equal to the newest raw time nothing may be emitted.
        resampler.resample(millis(10), &mut event, None);
        assert_eq!(event.history_size(), 0);
    }

    #[test]
    fn non_resampleable_tools_keep_raw_coordinates() {
        let mut resampler = Resampler::new();
        let mut down =
            motion_msg_with_tool(MotionAction::Down, millis(-10), &[(0, 0.0, 0.0)], ToolType::Stylus);
        resampler.update(&mut down);
        let mut mv =
            motion_msg_with_tool(MotionAction::Move, millis(0), &[(0, 0.0, 0.0)], ToolType::Stylus);
        resampler.update(&mut mv);
        let mut event = move_event(&mv);
        let next =
            motion_msg_with_tool(MotionAction::Move, millis(10), &[(0, 10.0, 10.0)], ToolType::Stylus);

        resampler.resample(millis(7), &mut event, Some(&next));

        // A sample is appended, but the stylus position is not predicted.
        assert_eq!(event.history_size(), 1);
        let coords = event.pointer_coords(0);
        assert_eq!(coords.x(), 0.0);
        assert!(coords.is_resampled());
    }

    #[test]
    fn stationary_pointer_keeps_the_synthesized_position() {
        let mut resampler = Resampler::new();
        // Raw samples at t=0 and t=16, both at (50, 50).
        let mut event = drive(&mut resampler, &[(millis(0), 50.0)]);
        let next = motion_msg(MotionAction::Move, millis(16), &[(0, 50.0, 50.0)]);

        // Resample at t=11 between them.
        resampler.resample(millis(11), &mut event, Some(&next));
        let coords = *event.pointer_coords(0);
        assert_eq!((coords.x(), coords.y()), (50.0, 50.0));
        assert!(coords.is_resampled());

        // The t=16 raw now arrives; identical recent coordinates mean the
        // synthesized position stays authoritative.
        let mut msg = motion_msg(MotionAction::Move, millis(16), &[(0, 50.0, 50.0)]);
        resampler.update(&mut msg);
        assert_eq!((msg.pointers[0].coords.x(), msg.pointers[0].coords.y()), (50.0, 50.0));
        assert!(msg.pointers[0].coords.is_resampled());

        // And again at t=32 with the finger still parked.
        let mut msg = motion_msg(MotionAction::Move, millis(32), &[(0, 50.0, 50.0)]);
        resampler.update(&mut msg);
        assert!(msg.pointers[0].coords.is_resampled());
        assert_eq!(msg.pointers[0].coords.x(), 50.0);
    }

    #[test]
    fn movement_retires_a_stale_resample() {
        let mut resampler = Resampler::new();
        let mut event = drive(&mut resampler, &[(millis(0), 50.0)]);
        let next = motion_msg(MotionAction::Move, millis(16), &[(0, 60.0, 60.0)]);
        resampler.resample(millis(11), &mut event, Some(&next));

        // The finger actually moved, so the raw coordinates win and the
        // resample bit is retired.
        let mut msg = motion_msg(MotionAction::Move, millis(16), &[(0, 60.0, 60.0)]);
        resampler.update(&mut msg);
        assert_eq!(msg.pointers[0].coords.x(), 60.0);
        assert!(!msg.pointers[0].coords.is_resampled());
    }

    #[test]
    fn up_destroys_the_stream_state() {
        let mut resampler = Resampler::new();
        let _ = drive(&mut resampler, &[(millis(0), 0.0), (millis(10), 10.0)]);
        assert_eq!(resampler.state_count(), 1);

        let mut up = motion_msg(MotionAction::Up, millis(20), &[(0, 10.0, 10.0)]);
        resampler.update(&mut up);
        assert_eq!(resampler.state_count(), 0);
    }

    #[test]
    fn non_pointer_sources_are_ignored() {
        let mut resampler = Resampler::new();
        let mut msg = motion_msg(MotionAction::Down, millis(0), &[(0, 0.0, 0.0)]);
        msg.source = Source::TRACKBALL.bits();
        resampler.update(&mut msg);
        assert_eq!(resampler.state_count(), 0);
    }

    #[test]
    fn pointer_up_retires_only_that_pointers_resample() {
        let mut resampler = Resampler::new();
        let mut down = motion_msg(MotionAction::Down, millis(0), &[(0, 0.0, 0.0)]);
        resampler.update(&mut down);
        let mut pointer_down = motion_msg(MotionAction::PointerDown, millis(2), &[(0, 0.0, 0.0), (1, 5.0, 5.0)]);
        pointer_down.action = MotionAction::PointerDown.with_pointer_index(1);
        resampler.update(&mut pointer_down);

        let mut mv = motion_msg(MotionAction::Move, millis(10), &[(0, 1.0, 1.0), (1, 6.0, 6.0)]);
        resampler.update(&mut mv);
        let mut event = move_event(&mv);
        let next = motion_msg(MotionAction::Move, millis(20), &[(0, 2.0, 2.0), (1, 7.0, 7.0)]);
        resampler.resample(millis(15), &mut event, Some(&next));
        assert_eq!(event.history_size(), 1, "both pointers resampled");

        let mut pointer_up = motion_msg(MotionAction::PointerUp, millis(20), &[(0, 2.0, 2.0), (1, 7.0, 7.0)]);
        pointer_up.action = MotionAction::PointerUp.with_pointer_index(1);
        resampler.update(&mut pointer_up);
        assert_eq!(resampler.state_count(), 1, "stream stays alive");
    }
}
