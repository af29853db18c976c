// Copyright 2026 the Afferent Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Input-event data model.
//!
//! This module holds the vocabulary shared by both endpoints — sources,
//! actions, tool types, pointer data — together with the concrete event
//! types the consumer hands to the application and the
//! [`EventFactory`] allocation seam.
//!
//! [`PointerProperties`] and [`PointerCoords`] are `repr(C)` plain-old-data
//! and travel on the wire verbatim; see [`crate::wire`] for the framing
//! around them.

use alloc::boxed::Box;
use alloc::vec::Vec;

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};

use crate::time::Nanos;
use crate::transform::Transform2d;

/// Maximum number of simultaneous pointers in one motion event.
///
/// Both endpoints must agree on this value; it fixes the wire layout.
pub const MAX_POINTERS: usize = 16;

/// Maximum number of axis values one pointer can carry.
pub const MAX_AXES: usize = 30;

/// Largest pointer id a device may report.
pub const MAX_POINTER_ID: u32 = 31;

/// Motion axis identifiers indexing into [`PointerCoords`].
pub mod axis {
    /// X position.
    pub const X: u32 = 0;
    /// Y position.
    pub const Y: u32 = 1;
    /// Normalized pressure.
    pub const PRESSURE: u32 = 2;
    /// Normalized contact size.
    pub const SIZE: u32 = 3;
    /// Major axis of the touch ellipse.
    pub const TOUCH_MAJOR: u32 = 4;
    /// Minor axis of the touch ellipse.
    pub const TOUCH_MINOR: u32 = 5;
    /// Major axis of the tool ellipse.
    pub const TOOL_MAJOR: u32 = 6;
    /// Minor axis of the tool ellipse.
    pub const TOOL_MINOR: u32 = 7;
    /// Tool orientation in radians.
    pub const ORIENTATION: u32 = 8;
}

/// Motion classification values.
pub mod classification {
    /// No additional classification.
    pub const NONE: u32 = 0;
    /// The gesture is ambiguous and may be reclassified.
    pub const AMBIGUOUS_GESTURE: u32 = 1;
    /// The user is pressing harder than a normal tap.
    pub const DEEP_PRESS: u32 = 2;
}

bitflags! {
    /// Input source bitmask.
    ///
    /// The low byte holds the source *class* bits; concrete sources combine
    /// a class with a distinguishing high bit. Batching keys on the full
    /// value; the resampler only cares whether `CLASS_POINTER` is present.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Source: u32 {
        /// Source has buttons or keys.
        const CLASS_BUTTON = 1 << 0;
        /// Source reports absolute pointer coordinates.
        const CLASS_POINTER = 1 << 1;
        /// Source reports relative navigation motions.
        const CLASS_NAVIGATION = 1 << 2;
        /// Source reports absolute positions without pointer semantics.
        const CLASS_POSITION = 1 << 3;
        /// Source is a joystick.
        const CLASS_JOYSTICK = 1 << 4;

        /// Keyboard.
        const KEYBOARD = 0x0100 | Self::CLASS_BUTTON.bits();
        /// Directional pad.
        const DPAD = 0x0200 | Self::CLASS_BUTTON.bits();
        /// Game controller buttons.
        const GAMEPAD = 0x0400 | Self::CLASS_BUTTON.bits();
        /// Touchscreen.
        const TOUCHSCREEN = 0x1000 | Self::CLASS_POINTER.bits();
        /// Mouse.
        const MOUSE = 0x2000 | Self::CLASS_POINTER.bits();
        /// Stylus digitizer.
        const STYLUS = 0x4000 | Self::CLASS_POINTER.bits();
        /// Trackball.
        const TRACKBALL = 0x0001_0000 | Self::CLASS_NAVIGATION.bits();
        /// Touchpad in absolute-position mode.
        const TOUCHPAD = 0x0010_0000 | Self::CLASS_POSITION.bits();
        /// Rotary encoder.
        const ROTARY_ENCODER = 0x0040_0000;
        /// Joystick axes.
        const JOYSTICK = 0x0100_0000 | Self::CLASS_JOYSTICK.bits();
    }
}

impl Default for Source {
    fn default() -> Self {
        Self::empty()
    }
}

impl Source {
    /// Mask covering the class bits of a source value.
    pub const CLASS_MASK: u32 = 0xff;

    /// Returns `true` when this source reports pointer coordinates, which
    /// makes its motion stream eligible for touch resampling.
    #[inline]
    #[must_use]
    pub const fn is_pointer(self) -> bool {
        self.bits() & Self::CLASS_POINTER.bits() == Self::CLASS_POINTER.bits()
    }
}

/// The tool that produced a pointer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ToolType {
    /// Unknown tool; treated like a finger for resampling.
    #[default]
    Unknown = 0,
    /// A finger on a touch surface.
    Finger = 1,
    /// A stylus tip.
    Stylus = 2,
    /// A mouse cursor.
    Mouse = 3,
    /// The eraser end of a stylus.
    Eraser = 4,
    /// A palm contact.
    Palm = 5,
}

impl ToolType {
    /// Decodes a raw wire value, mapping anything unrecognized to
    /// [`ToolType::Unknown`].
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            1 => Self::Finger,
            2 => Self::Stylus,
            3 => Self::Mouse,
            4 => Self::Eraser,
            5 => Self::Palm,
            _ => Self::Unknown,
        }
    }

    /// Whether samples from this tool may be resampled. Predicting stylus or
    /// mouse positions produces visible overshoot, so only finger-like tools
    /// qualify.
    #[inline]
    #[must_use]
    pub const fn is_resampleable(self) -> bool {
        matches!(self, Self::Finger | Self::Unknown)
    }
}

/// Mask extracting the base action from a motion action code.
pub const ACTION_MASK: u32 = 0xff;

/// Mask extracting the pointer-index field from a motion action code.
pub const ACTION_POINTER_INDEX_MASK: u32 = 0xff00;

/// Shift of the pointer-index field within a motion action code.
pub const ACTION_POINTER_INDEX_SHIFT: u32 = 8;

/// Base motion actions, the low byte of a motion action code.
///
/// `PointerDown` and `PointerUp` carry the index of the affected pointer in
/// bits 8..16 of the full code; see [`MotionAction::pointer_index`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MotionAction {
    /// A pressed gesture has started.
    Down,
    /// The last pointer has lifted.
    Up,
    /// A pointer has moved during a pressed gesture.
    Move,
    /// The gesture was aborted; the event must be discarded.
    Cancel,
    /// A press began outside the target's bounds.
    Outside,
    /// An additional pointer has gone down.
    PointerDown,
    /// A non-final pointer has gone up.
    PointerUp,
    /// A pointer has moved with no buttons pressed.
    HoverMove,
    /// The scroll wheel moved.
    Scroll,
    /// A hovering pointer has entered the target's bounds.
    HoverEnter,
    /// A hovering pointer has left the target's bounds.
    HoverExit,
    /// A button was pressed.
    ButtonPress,
    /// A button was released.
    ButtonRelease,
}

impl MotionAction {
    /// Decodes the base action of a full action code. Returns `None` for
    /// codes this transport does not know; such events still travel through
    /// the channel untouched.
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        match code & ACTION_MASK {
            0 => Some(Self::Down),
            1 => Some(Self::Up),
            2 => Some(Self::Move),
            3 => Some(Self::Cancel),
            4 => Some(Self::Outside),
            5 => Some(Self::PointerDown),
            6 => Some(Self::PointerUp),
            7 => Some(Self::HoverMove),
            8 => Some(Self::Scroll),
            9 => Some(Self::HoverEnter),
            10 => Some(Self::HoverExit),
            11 => Some(Self::ButtonPress),
            12 => Some(Self::ButtonRelease),
            _ => None,
        }
    }

    /// Returns the full action code for this base action with pointer index
    /// zero.
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Extracts the pointer-index field of a full action code.
    #[inline]
    #[must_use]
    pub const fn pointer_index(code: u32) -> usize {
        ((code & ACTION_POINTER_INDEX_MASK) >> ACTION_POINTER_INDEX_SHIFT) as usize
    }

    /// Builds a full action code from a base action and a pointer index.
    #[inline]
    #[must_use]
    pub const fn with_pointer_index(self, index: usize) -> u32 {
        self.code() | ((index as u32) << ACTION_POINTER_INDEX_SHIFT)
    }
}

/// Key event action codes.
pub mod key_action {
    /// The key has been pressed.
    pub const DOWN: u32 = 0;
    /// The key has been released.
    pub const UP: u32 = 1;
}

/// Identity of one pointer within a motion event.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct PointerProperties {
    /// Stable id of this pointer for the duration of its gesture.
    pub id: i32,
    tool_type: u32,
}

impl PointerProperties {
    /// Creates properties for the given pointer id and tool.
    #[must_use]
    pub const fn new(id: i32, tool_type: ToolType) -> Self {
        Self {
            id,
            tool_type: tool_type as u32,
        }
    }

    /// The tool that produced this pointer.
    #[inline]
    #[must_use]
    pub const fn tool_type(self) -> ToolType {
        ToolType::from_raw(self.tool_type)
    }
}

/// Axis values of one pointer at one sample time.
///
/// `bits` records which axes are populated; `values` stores those axes'
/// values densely, in ascending axis order. The struct is `repr(C)` with
/// explicit padding and travels on the wire verbatim.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PointerCoords {
    /// Bitset of populated axes, bit `n` for axis `n`.
    pub bits: u64,
    /// Dense axis values, one per set bit of `bits`, ascending by axis.
    pub values: [f32; MAX_AXES],
    resampled: u32,
    _reserved: u32,
}

impl PointerCoords {
    /// Creates coords holding only an X/Y position.
    #[must_use]
    pub fn from_xy(x: f32, y: f32) -> Self {
        let mut coords = Self::zeroed();
        coords.set_axis_value(axis::X, x);
        coords.set_axis_value(axis::Y, y);
        coords
    }

    /// Returns the value of `axis`, or `None` when it is not populated.
    #[must_use]
    pub fn axis_value(&self, axis: u32) -> Option<f32> {
        debug_assert!((axis as usize) < MAX_AXES);
        let bit = 1u64 << axis;
        if self.bits & bit == 0 {
            return None;
        }
        Some(self.values[self.dense_index(axis)])
    }

    /// Sets the value of `axis`, inserting it into the dense array if it was
    /// not populated before.
    pub fn set_axis_value(&mut self, axis: u32, value: f32) {
        debug_assert!((axis as usize) < MAX_AXES);
        let bit = 1u64 << axis;
        let index = self.dense_index(axis);
        if self.bits & bit == 0 {
            let count = self.bits.count_ones() as usize;
            let mut i = count;
            while i > index {
                self.values[i] = self.values[i - 1];
                i -= 1;
            }
            self.bits |= bit;
        }
        self.values[index] = value;
    }

    /// X position, or `0.0` when absent.
    #[inline]
    #[must_use]
    pub fn x(&self) -> f32 {
        self.axis_value(axis::X).unwrap_or(0.0)
    }

    /// Y position, or `0.0` when absent.
    #[inline]
    #[must_use]
    pub fn y(&self) -> f32 {
        self.axis_value(axis::Y).unwrap_or(0.0)
    }

    /// Whether this sample was synthesized by the resampler rather than
    /// reported by the device.
    #[inline]
    #[must_use]
    pub const fn is_resampled(&self) -> bool {
        self.resampled != 0
    }

    /// Marks or clears the resampled flag.
    #[inline]
    pub fn set_resampled(&mut self, resampled: bool) {
        self.resampled = u32::from(resampled);
    }

    fn dense_index(&self, axis: u32) -> usize {
        let below = self.bits & ((1u64 << axis) - 1);
        below.count_ones() as usize
    }
}

impl Default for PointerCoords {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// The two timestamps of the graphics pipeline reported back to the
/// publisher for one input event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GraphicsTimeline {
    /// When the GPU finished rendering the frame containing the event.
    pub gpu_completed_time: Nanos,
    /// When that frame was presented on screen. Must be later than
    /// [`gpu_completed_time`](Self::gpu_completed_time).
    pub present_time: Nanos,
}

/// Arguments of one published key event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyArgs {
    /// Globally unique id of this event.
    pub event_id: i32,
    /// Device that produced the event.
    pub device_id: i32,
    /// Source of the event.
    pub source: Source,
    /// Display the event is targeted at.
    pub display_id: i32,
    /// Integrity tag assigned by the server.
    pub hmac: [u8; 32],
    /// Key action code; see [`key_action`].
    pub action: u32,
    /// Key event flags.
    pub flags: u32,
    /// Key code.
    pub key_code: i32,
    /// Hardware scan code.
    pub scan_code: i32,
    /// Meta key state.
    pub meta_state: u32,
    /// Repeat count for held keys.
    pub repeat_count: i32,
    /// When the key first went down.
    pub down_time: Nanos,
    /// When this event occurred.
    pub event_time: Nanos,
}

/// Arguments of one published motion event, borrowing the caller's pointer
/// arrays.
#[derive(Clone, Debug, PartialEq)]
pub struct MotionArgs<'a> {
    /// Globally unique id of this event.
    pub event_id: i32,
    /// Device that produced the event.
    pub device_id: i32,
    /// Source of the event.
    pub source: Source,
    /// Display the event is targeted at.
    pub display_id: i32,
    /// Integrity tag assigned by the server.
    pub hmac: [u8; 32],
    /// Full motion action code; see [`MotionAction`].
    pub action: u32,
    /// Button associated with a button press/release action.
    pub action_button: u32,
    /// Motion event flags.
    pub flags: u32,
    /// Edge flags for touches at the display edge.
    pub edge_flags: u32,
    /// Meta key state.
    pub meta_state: u32,
    /// Currently pressed buttons.
    pub button_state: u32,
    /// Gesture classification; see [`classification`].
    pub classification: u32,
    /// Transform into the target window's coordinates.
    pub transform: Transform2d,
    /// X precision of the reported coordinates.
    pub x_precision: f32,
    /// Y precision of the reported coordinates.
    pub y_precision: f32,
    /// X position of the mouse cursor, if any.
    pub x_cursor_position: f32,
    /// Y position of the mouse cursor, if any.
    pub y_cursor_position: f32,
    /// Transform into raw display coordinates.
    pub raw_transform: Transform2d,
    /// When the gesture first went down.
    pub down_time: Nanos,
    /// When this sample occurred.
    pub event_time: Nanos,
    /// Per-pointer identities, one per pointer.
    pub pointer_properties: &'a [PointerProperties],
    /// Per-pointer coordinates, parallel to `pointer_properties`.
    pub pointer_coords: &'a [PointerCoords],
}

/// A key press or release delivered to the application.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyEvent {
    /// Globally unique id of this event.
    pub event_id: i32,
    /// Device that produced the event.
    pub device_id: i32,
    /// Source of the event.
    pub source: Source,
    /// Display the event is targeted at.
    pub display_id: i32,
    /// Integrity tag assigned by the server.
    pub hmac: [u8; 32],
    /// Key action code; see [`key_action`].
    pub action: u32,
    /// Key event flags.
    pub flags: u32,
    /// Key code.
    pub key_code: i32,
    /// Hardware scan code.
    pub scan_code: i32,
    /// Meta key state.
    pub meta_state: u32,
    /// Repeat count for held keys.
    pub repeat_count: i32,
    /// When the key first went down.
    pub down_time: Nanos,
    /// When this event occurred.
    pub event_time: Nanos,
}

impl KeyEvent {
    /// Populates this event from publish arguments.
    pub fn initialize(&mut self, args: &KeyArgs) {
        self.event_id = args.event_id;
        self.device_id = args.device_id;
        self.source = args.source;
        self.display_id = args.display_id;
        self.hmac = args.hmac;
        self.action = args.action;
        self.flags = args.flags;
        self.key_code = args.key_code;
        self.scan_code = args.scan_code;
        self.meta_state = args.meta_state;
        self.repeat_count = args.repeat_count;
        self.down_time = args.down_time;
        self.event_time = args.event_time;
    }
}

/// A pointer motion delivered to the application.
///
/// A motion event carries one or more *samples*: the batched history of
/// device reports merged into this delivery, oldest first, plus optionally
/// one trailing resampled sample. Scalar accessors refer to the most recent
/// sample; earlier ones are reachable through the `historical_*` accessors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MotionEvent {
    /// Globally unique id of this event.
    pub event_id: i32,
    /// Device that produced the event.
    pub device_id: i32,
    /// Source of the event.
    pub source: Source,
    /// Display the event is targeted at.
    pub display_id: i32,
    /// Integrity tag assigned by the server.
    pub hmac: [u8; 32],
    /// Full motion action code; see [`MotionAction`].
    pub action: u32,
    /// Button associated with a button press/release action.
    pub action_button: u32,
    /// Motion event flags.
    pub flags: u32,
    /// Edge flags for touches at the display edge.
    pub edge_flags: u32,
    /// Meta key state, merged across all samples.
    pub meta_state: u32,
    /// Currently pressed buttons.
    pub button_state: u32,
    /// Gesture classification; see [`classification`].
    pub classification: u32,
    /// Transform into the target window's coordinates.
    pub transform: Transform2d,
    /// X precision of the reported coordinates.
    pub x_precision: f32,
    /// Y precision of the reported coordinates.
    pub y_precision: f32,
    /// X position of the mouse cursor, if any.
    pub x_cursor_position: f32,
    /// Y position of the mouse cursor, if any.
    pub y_cursor_position: f32,
    /// Transform into raw display coordinates.
    pub raw_transform: Transform2d,
    /// When the gesture first went down.
    pub down_time: Nanos,
    pointer_properties: Vec<PointerProperties>,
    sample_event_times: Vec<Nanos>,
    sample_coords: Vec<PointerCoords>,
}

impl MotionEvent {
    /// Populates this event from publish arguments, discarding any previous
    /// samples.
    ///
    /// # Panics
    ///
    /// Panics if the pointer arrays differ in length.
    pub fn initialize(&mut self, args: &MotionArgs<'_>) {
        assert_eq!(
            args.pointer_properties.len(),
            args.pointer_coords.len(),
            "pointer arrays must be parallel"
        );
        self.event_id = args.event_id;
        self.device_id = args.device_id;
        self.source = args.source;
        self.display_id = args.display_id;
        self.hmac = args.hmac;
        self.action = args.action;
        self.action_button = args.action_button;
        self.flags = args.flags;
        self.edge_flags = args.edge_flags;
        self.meta_state = args.meta_state;
        self.button_state = args.button_state;
        self.classification = args.classification;
        self.transform = args.transform;
        self.x_precision = args.x_precision;
        self.y_precision = args.y_precision;
        self.x_cursor_position = args.x_cursor_position;
        self.y_cursor_position = args.y_cursor_position;
        self.raw_transform = args.raw_transform;
        self.down_time = args.down_time;
        self.pointer_properties.clear();
        self.pointer_properties
            .extend_from_slice(args.pointer_properties);
        self.sample_event_times.clear();
        self.sample_event_times.push(args.event_time);
        self.sample_coords.clear();
        self.sample_coords.extend_from_slice(args.pointer_coords);
    }

    /// Appends one sample shared by all pointers of this event.
    ///
    /// # Panics
    ///
    /// Panics if `coords` does not match this event's pointer count.
    pub fn add_sample(&mut self, event_time: Nanos, coords: &[PointerCoords]) {
        assert_eq!(
            coords.len(),
            self.pointer_count(),
            "sample must cover every pointer"
        );
        self.sample_event_times.push(event_time);
        self.sample_coords.extend_from_slice(coords);
    }

    /// Number of pointers in this event.
    #[must_use]
    pub fn pointer_count(&self) -> usize {
        self.pointer_properties.len()
    }

    /// Id of the pointer at `index`.
    #[must_use]
    pub fn pointer_id(&self, index: usize) -> i32 {
        self.pointer_properties[index].id
    }

    /// Tool of the pointer at `index`.
    #[must_use]
    pub fn tool_type(&self, index: usize) -> ToolType {
        self.pointer_properties[index].tool_type()
    }

    /// Per-pointer identities.
    #[must_use]
    pub fn pointer_properties(&self) -> &[PointerProperties] {
        &self.pointer_properties
    }

    /// Time of the most recent sample.
    #[must_use]
    pub fn event_time(&self) -> Nanos {
        *self.sample_event_times.last().expect("initialized event")
    }

    /// Number of samples preceding the most recent one.
    #[must_use]
    pub fn history_size(&self) -> usize {
        self.sample_event_times.len() - 1
    }

    /// Coordinates of pointer `index` in the most recent sample.
    #[must_use]
    pub fn pointer_coords(&self, index: usize) -> &PointerCoords {
        self.historical_coords(index, self.history_size())
    }

    /// Time of historical sample `position` (0 is the oldest).
    #[must_use]
    pub fn historical_event_time(&self, position: usize) -> Nanos {
        self.sample_event_times[position]
    }

    /// Coordinates of pointer `index` in historical sample `position`.
    #[must_use]
    pub fn historical_coords(&self, index: usize, position: usize) -> &PointerCoords {
        debug_assert!(index < self.pointer_count());
        &self.sample_coords[position * self.pointer_count() + index]
    }
}

/// A focus gain or loss delivered to the application.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FocusEvent {
    /// Globally unique id of this event.
    pub event_id: i32,
    /// Whether the window now has focus.
    pub has_focus: bool,
}

impl FocusEvent {
    /// Populates this event.
    pub fn initialize(&mut self, event_id: i32, has_focus: bool) {
        self.event_id = event_id;
        self.has_focus = has_focus;
    }
}

/// A pointer-capture state change delivered to the application.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaptureEvent {
    /// Globally unique id of this event.
    pub event_id: i32,
    /// Whether pointer capture is now enabled for the window.
    pub pointer_capture_enabled: bool,
}

impl CaptureEvent {
    /// Populates this event.
    pub fn initialize(&mut self, event_id: i32, pointer_capture_enabled: bool) {
        self.event_id = event_id;
        self.pointer_capture_enabled = pointer_capture_enabled;
    }
}

/// A drag-location update delivered to the application.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DragEvent {
    /// Globally unique id of this event.
    pub event_id: i32,
    /// Drag X position in window coordinates.
    pub x: f32,
    /// Drag Y position in window coordinates.
    pub y: f32,
    /// Whether the drag is leaving the window.
    pub is_exiting: bool,
}

impl DragEvent {
    /// Populates this event.
    pub fn initialize(&mut self, event_id: i32, x: f32, y: f32, is_exiting: bool) {
        self.event_id = event_id;
        self.x = x;
        self.y = y;
        self.is_exiting = is_exiting;
    }
}

/// A touch-mode state change delivered to the application.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TouchModeEvent {
    /// Globally unique id of this event.
    pub event_id: i32,
    /// Whether the display is now in touch mode.
    pub is_in_touch_mode: bool,
}

impl TouchModeEvent {
    /// Populates this event.
    pub fn initialize(&mut self, event_id: i32, is_in_touch_mode: bool) {
        self.event_id = event_id;
        self.is_in_touch_mode = is_in_touch_mode;
    }
}

/// One delivered input event, owning its factory-allocated object.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    /// A key press or release.
    Key(Box<KeyEvent>),
    /// A pointer motion, possibly carrying batched history.
    Motion(Box<MotionEvent>),
    /// A focus change.
    Focus(Box<FocusEvent>),
    /// A pointer-capture change.
    Capture(Box<CaptureEvent>),
    /// A drag-location update.
    Drag(Box<DragEvent>),
    /// A touch-mode change.
    TouchMode(Box<TouchModeEvent>),
}

impl InputEvent {
    /// Returns the motion event, if this is one.
    #[must_use]
    pub fn as_motion(&self) -> Option<&MotionEvent> {
        match self {
            Self::Motion(event) => Some(event),
            _ => None,
        }
    }

    /// Returns the key event, if this is one.
    #[must_use]
    pub fn as_key(&self) -> Option<&KeyEvent> {
        match self {
            Self::Key(event) => Some(event),
            _ => None,
        }
    }
}

/// Allocation seam for event objects.
///
/// The consumer populates events through their typed `initialize` methods
/// and hands them to the caller; supplying the allocator lets embedders pool
/// or arena-allocate event objects. Returning `None` signals allocation
/// failure and surfaces as
/// [`TransportError::OutOfMemory`](crate::error::TransportError::OutOfMemory).
pub trait EventFactory {
    /// Allocates an empty key event.
    fn create_key_event(&mut self) -> Option<Box<KeyEvent>>;
    /// Allocates an empty motion event.
    fn create_motion_event(&mut self) -> Option<Box<MotionEvent>>;
    /// Allocates an empty focus event.
    fn create_focus_event(&mut self) -> Option<Box<FocusEvent>>;
    /// Allocates an empty capture event.
    fn create_capture_event(&mut self) -> Option<Box<CaptureEvent>>;
    /// Allocates an empty drag event.
    fn create_drag_event(&mut self) -> Option<Box<DragEvent>>;
    /// Allocates an empty touch-mode event.
    fn create_touch_mode_event(&mut self) -> Option<Box<TouchModeEvent>>;
}

/// The plain heap-backed [`EventFactory`].
#[derive(Clone, Copy, Debug, Default)]
pub struct HeapEventFactory;

impl EventFactory for HeapEventFactory {
    fn create_key_event(&mut self) -> Option<Box<KeyEvent>> {
        Some(Box::default())
    }

    fn create_motion_event(&mut self) -> Option<Box<MotionEvent>> {
        Some(Box::default())
    }

    fn create_focus_event(&mut self) -> Option<Box<FocusEvent>> {
        Some(Box::default())
    }

    fn create_capture_event(&mut self) -> Option<Box<CaptureEvent>> {
        Some(Box::default())
    }

    fn create_drag_event(&mut self) -> Option<Box<DragEvent>> {
        Some(Box::default())
    }

    fn create_touch_mode_event(&mut self) -> Option<Box<TouchModeEvent>> {
        Some(Box::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_sources_contain_the_pointer_class() {
        assert!(Source::TOUCHSCREEN.is_pointer());
        assert!(Source::MOUSE.is_pointer());
        assert!(Source::STYLUS.is_pointer());
        assert!(!Source::KEYBOARD.is_pointer());
        assert!(!Source::TRACKBALL.is_pointer());
        assert!(!Source::ROTARY_ENCODER.is_pointer());
    }

    #[test]
    fn coords_pack_axis_values_densely() {
        let mut coords = PointerCoords::zeroed();
        coords.set_axis_value(axis::Y, 2.0);
        coords.set_axis_value(axis::PRESSURE, 0.5);
        // Inserting X afterwards must shift Y and PRESSURE right.
        coords.set_axis_value(axis::X, 1.0);

        assert_eq!(coords.axis_value(axis::X), Some(1.0));
        assert_eq!(coords.axis_value(axis::Y), Some(2.0));
        assert_eq!(coords.axis_value(axis::PRESSURE), Some(0.5));
        assert_eq!(coords.axis_value(axis::SIZE), None);
        assert_eq!(coords.values[..3], [1.0, 2.0, 0.5]);
    }

    #[test]
    fn coords_overwrite_in_place() {
        let mut coords = PointerCoords::from_xy(10.0, 20.0);
        coords.set_axis_value(axis::X, 11.0);
        assert_eq!(coords.x(), 11.0);
        assert_eq!(coords.y(), 20.0);
        assert_eq!(coords.bits.count_ones(), 2);
    }

    #[test]
    fn motion_action_codes_round_trip_with_pointer_index() {
        let code = MotionAction::PointerDown.with_pointer_index(3);
        assert_eq!(MotionAction::from_code(code), Some(MotionAction::PointerDown));
        assert_eq!(MotionAction::pointer_index(code), 3);
        assert_eq!(MotionAction::from_code(0x00ff), None, "unknown base action");
    }

    #[test]
    fn unknown_tool_types_decode_to_unknown() {
        assert_eq!(ToolType::from_raw(99), ToolType::Unknown);
        assert!(ToolType::Finger.is_resampleable());
        assert!(ToolType::Unknown.is_resampleable());
        assert!(!ToolType::Stylus.is_resampleable());
        assert!(!ToolType::Mouse.is_resampleable());
    }

    #[test]
    fn motion_event_samples_accumulate() {
        let properties = [PointerProperties::new(0, ToolType::Finger)];
        let coords = [PointerCoords::from_xy(10.0, 10.0)];
        let mut event = MotionEvent::default();
        event.initialize(&MotionArgs {
            event_id: 1,
            device_id: 2,
            source: Source::TOUCHSCREEN,
            display_id: 0,
            hmac: [0; 32],
            action: MotionAction::Move.code(),
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
            event_time: 1_000,
            pointer_properties: &properties,
            pointer_coords: &coords,
        });
        event.add_sample(2_000, &[PointerCoords::from_xy(11.0, 10.0)]);

        assert_eq!(event.pointer_count(), 1);
        assert_eq!(event.history_size(), 1);
        assert_eq!(event.event_time(), 2_000);
        assert_eq!(event.historical_event_time(0), 1_000);
        assert_eq!(event.historical_coords(0, 0).x(), 10.0);
        assert_eq!(event.pointer_coords(0).x(), 11.0);
    }

    #[test]
    fn heap_factory_always_allocates() {
        let mut factory = HeapEventFactory;
        assert!(factory.create_key_event().is_some());
        assert!(factory.create_motion_event().is_some());
        assert!(factory.create_touch_mode_event().is_some());
    }
}
