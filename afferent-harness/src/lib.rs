// Copyright 2026 the Afferent Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reusable test doubles and event builders for transport tests.
//!
//! Everything here is deterministic: a [`ScriptedClock`] that only moves
//! when told to, a [`RecordingFactory`] that counts (and can refuse)
//! allocations, and builders producing publish arguments without the
//! ceremony of filling every field.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use afferent_core::event::{
    CaptureEvent, DragEvent, EventFactory, FocusEvent, KeyArgs, KeyEvent, MotionAction,
    MotionArgs, MotionEvent, PointerCoords, PointerProperties, Source, TouchModeEvent, ToolType,
    classification,
};
use afferent_core::time::Nanos;
use afferent_core::transform::Transform2d;

/// A monotonic clock that advances only when the test says so.
#[derive(Debug, Default)]
pub struct ScriptedClock {
    now: AtomicI64,
}

impl ScriptedClock {
    /// Creates a clock reading `start`.
    #[must_use]
    pub fn new(start: Nanos) -> Arc<Self> {
        Arc::new(Self {
            now: AtomicI64::new(start),
        })
    }

    /// Current reading.
    #[must_use]
    pub fn now(&self) -> Nanos {
        self.now.load(Ordering::Relaxed)
    }

    /// Jumps the clock to `now`.
    pub fn set(&self, now: Nanos) {
        self.now.store(now, Ordering::Relaxed);
    }

    /// Advances the clock by `delta`.
    pub fn advance(&self, delta: Nanos) {
        self.now.fetch_add(delta, Ordering::Relaxed);
    }

    /// Returns a closure suitable for `Consumer::with_clock`; call on a
    /// clone to keep a handle for driving the clock.
    #[must_use]
    pub fn clock_fn(self: Arc<Self>) -> Box<dyn Fn() -> Nanos> {
        Box::new(move || self.now())
    }
}

/// An [`EventFactory`] that counts allocations and can simulate exhaustion.
#[derive(Debug, Default)]
pub struct RecordingFactory {
    /// When set, every allocation fails.
    pub deny_allocations: bool,
    /// Number of key events allocated.
    pub keys_created: usize,
    /// Number of motion events allocated.
    pub motions_created: usize,
    /// Number of focus events allocated.
    pub focus_created: usize,
    /// Number of capture events allocated.
    pub captures_created: usize,
    /// Number of drag events allocated.
    pub drags_created: usize,
    /// Number of touch-mode events allocated.
    pub touch_modes_created: usize,
}

impl RecordingFactory {
    /// A factory that refuses every allocation.
    #[must_use]
    pub fn denying() -> Self {
        Self {
            deny_allocations: true,
            ..Self::default()
        }
    }
}

impl EventFactory for RecordingFactory {
    fn create_key_event(&mut self) -> Option<Box<KeyEvent>> {
        if self.deny_allocations {
            return None;
        }
        self.keys_created += 1;
        Some(Box::default())
    }

    fn create_motion_event(&mut self) -> Option<Box<MotionEvent>> {
        if self.deny_allocations {
            return None;
        }
        self.motions_created += 1;
        Some(Box::default())
    }

    fn create_focus_event(&mut self) -> Option<Box<FocusEvent>> {
        if self.deny_allocations {
            return None;
        }
        self.focus_created += 1;
        Some(Box::default())
    }

    fn create_capture_event(&mut self) -> Option<Box<CaptureEvent>> {
        if self.deny_allocations {
            return None;
        }
        self.captures_created += 1;
        Some(Box::default())
    }

    fn create_drag_event(&mut self) -> Option<Box<DragEvent>> {
        if self.deny_allocations {
            return None;
        }
        self.drags_created += 1;
        Some(Box::default())
    }

    fn create_touch_mode_event(&mut self) -> Option<Box<TouchModeEvent>> {
        if self.deny_allocations {
            return None;
        }
        self.touch_modes_created += 1;
        Some(Box::default())
    }
}

/// Publish arguments for a key with everything else defaulted.
#[must_use]
pub fn key_args(key_code: i32, action: u32, event_time: Nanos) -> KeyArgs {
    KeyArgs {
        event_id: key_code,
        device_id: 1,
        source: Source::KEYBOARD,
        display_id: 0,
        hmac: [0; 32],
        action,
        flags: 0,
        key_code,
        scan_code: 0,
        meta_state: 0,
        repeat_count: 0,
        down_time: event_time,
        event_time,
    }
}

/// Builder for motion publish arguments.
///
/// ```
/// use afferent_core::event::MotionAction;
/// use afferent_harness::MotionSpec;
///
/// let spec = MotionSpec::touch(MotionAction::Move, 10_000_000).pointer(0, 5.0, 5.0);
/// assert_eq!(spec.args().pointer_properties.len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct MotionSpec {
    /// Full action code of the motion.
    pub action: u32,
    /// Sample time.
    pub event_time: Nanos,
    /// Gesture down time.
    pub down_time: Nanos,
    /// Device id.
    pub device_id: i32,
    /// Source of the motion.
    pub source: Source,
    /// Meta key state.
    pub meta_state: u32,
    properties: Vec<PointerProperties>,
    coords: Vec<PointerCoords>,
}

impl MotionSpec {
    /// A touchscreen motion on device 1 with no pointers yet.
    #[must_use]
    pub fn touch(action: MotionAction, event_time: Nanos) -> Self {
        Self {
            action: action.code(),
            event_time,
            down_time: 0,
            device_id: 1,
            source: Source::TOUCHSCREEN,
            meta_state: 0,
            properties: Vec::new(),
            coords: Vec::new(),
        }
    }

    /// Overrides the full action code (for pointer-indexed actions).
    #[must_use]
    pub fn action_code(mut self, code: u32) -> Self {
        self.action = code;
        self
    }

    /// Overrides the device id.
    #[must_use]
    pub fn device(mut self, device_id: i32) -> Self {
        self.device_id = device_id;
        self
    }

    /// Overrides the source.
    #[must_use]
    pub fn source(mut self, source: Source) -> Self {
        self.source = source;
        self
    }

    /// Overrides the meta-state bits.
    #[must_use]
    pub fn meta_state(mut self, meta_state: u32) -> Self {
        self.meta_state = meta_state;
        self
    }

    /// Appends a finger pointer at the given position.
    #[must_use]
    pub fn pointer(mut self, id: i32, x: f32, y: f32) -> Self {
        self.properties.push(PointerProperties::new(id, ToolType::Finger));
        self.coords.push(PointerCoords::from_xy(x, y));
        self
    }

    /// The publish arguments, borrowing this spec's pointer arrays.
    #[must_use]
    pub fn args(&self) -> MotionArgs<'_> {
        MotionArgs {
            event_id: 0,
            device_id: self.device_id,
            source: self.source,
            display_id: 0,
            hmac: [0; 32],
            action: self.action,
            action_button: 0,
            flags: 0,
            edge_flags: 0,
            meta_state: self.meta_state,
            button_state: 0,
            classification: classification::NONE,
            transform: Transform2d::IDENTITY,
            x_precision: 1.0,
            y_precision: 1.0,
            x_cursor_position: 0.0,
            y_cursor_position: 0.0,
            raw_transform: Transform2d::IDENTITY,
            down_time: self.down_time,
            event_time: self.event_time,
            pointer_properties: &self.properties,
            pointer_coords: &self.coords,
        }
    }
}
