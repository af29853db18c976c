// Copyright 2026 the Afferent Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-layout wire messages and their codec.
//!
//! Every event crosses the channel as exactly one datagram: an 8-byte
//! [`Header`] followed by one payload struct. Payloads are `repr(C)`
//! plain-old-data with *explicit* padding fields, so their in-memory bytes
//! are the wire bytes; compile-time size assertions below pin the layout.
//!
//! Three rules keep the boundary safe:
//!
//! - [`Message::sanitized`] produces a copy whose bytes are fully
//!   determined by the declared fields of the active payload — padding,
//!   unused pointer slots, and unpopulated axis values are zero. Nothing is
//!   sent without passing through it, so stack garbage never leaks to the
//!   peer.
//! - [`Message::decode`] accepts a datagram only when its size matches the
//!   expected size for its kind exactly, a motion's pointer count is in
//!   `1..=MAX_POINTERS`, and a timeline's present time is after its GPU
//!   completion time. All other field values are trusted, matching the
//!   producer-trusted envelope of the protocol.
//! - The layout is *not* endian- or ABI-portable: both endpoints must be
//!   the same build running on the same host. The transport is a local
//!   socketpair and must never be pointed across machines.

use bytemuck::{Pod, Zeroable};
use core::mem::size_of;

use crate::event::{PointerCoords, PointerProperties, MAX_AXES, MAX_POINTERS};
use crate::time::Nanos;

/// Size in bytes of the message [`Header`].
pub const HEADER_SIZE: usize = size_of::<Header>();

/// Size in bytes of the largest possible message (a full-pointer MOTION).
pub const MAX_MESSAGE_SIZE: usize = HEADER_SIZE + size_of::<MotionPayload>();

/// Size in bytes of a MOTION payload with all pointer slots stripped.
const MOTION_FIXED_SIZE: usize =
    size_of::<MotionPayload>() - MAX_POINTERS * size_of::<MotionPointer>();

/// Wire size in bytes of a MOTION payload carrying `pointer_count` pointers.
const fn motion_body_size(pointer_count: usize) -> usize {
    MOTION_FIXED_SIZE + pointer_count * size_of::<MotionPointer>()
}

/// Discriminates the payload carried by a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageKind {
    /// A key press or release.
    Key = 0,
    /// A pointer motion sample.
    Motion = 1,
    /// Consumer→publisher acknowledgment of one event.
    Finished = 2,
    /// A focus change.
    Focus = 3,
    /// A pointer-capture change.
    Capture = 4,
    /// A drag-location update.
    Drag = 5,
    /// Consumer→publisher graphics timeline for one event.
    Timeline = 6,
    /// A touch-mode change.
    TouchMode = 7,
}

impl MessageKind {
    /// Decodes a raw header value.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Key),
            1 => Some(Self::Motion),
            2 => Some(Self::Finished),
            3 => Some(Self::Focus),
            4 => Some(Self::Capture),
            5 => Some(Self::Drag),
            6 => Some(Self::Timeline),
            7 => Some(Self::TouchMode),
            _ => None,
        }
    }
}

/// Fixed message header preceding every payload.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct Header {
    /// Raw [`MessageKind`] value.
    pub kind: u32,
    /// Sequence number; nonzero for published events, zero only for
    /// TIMELINE.
    pub seq: u32,
}

/// Wire payload of a KEY message.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct KeyPayload {
    /// Globally unique id of this event.
    pub event_id: i32,
    _pad0: u32,
    /// When this event occurred.
    pub event_time: Nanos,
    /// Device that produced the event.
    pub device_id: i32,
    /// Raw source bits.
    pub source: u32,
    /// Display the event is targeted at.
    pub display_id: i32,
    /// Integrity tag assigned by the server.
    pub hmac: [u8; 32],
    /// Key action code.
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
    _pad1: u32,
    /// When the key first went down.
    pub down_time: Nanos,
}

/// One pointer slot of a MOTION payload.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MotionPointer {
    /// Identity of this pointer.
    pub properties: PointerProperties,
    /// Axis values of this pointer.
    pub coords: PointerCoords,
}

/// Wire payload of a MOTION message.
///
/// Only the first [`pointer_count`](Self::pointer_count) entries of
/// [`pointers`](Self::pointers) travel on the wire; the payload is
/// truncated after them.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MotionPayload {
    /// Globally unique id of this event.
    pub event_id: i32,
    /// Number of valid entries in [`pointers`](Self::pointers).
    pub pointer_count: u32,
    /// When this sample occurred.
    pub event_time: Nanos,
    /// Device that produced the event.
    pub device_id: i32,
    /// Raw source bits.
    pub source: u32,
    /// Display the event is targeted at.
    pub display_id: i32,
    _pad0: u32,
    /// Integrity tag assigned by the server.
    pub hmac: [u8; 32],
    /// Full motion action code.
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
    /// Gesture classification.
    pub classification: u32,
    _pad1: u32,
    /// When the gesture first went down.
    pub down_time: Nanos,
    /// Cooked transform, wire slot order `(dsdx, dtdx, tx, dtdy, dsdy, ty)`.
    pub transform: [f32; 6],
    /// Raw transform, same slot order.
    pub raw_transform: [f32; 6],
    /// X precision of the reported coordinates.
    pub x_precision: f32,
    /// Y precision of the reported coordinates.
    pub y_precision: f32,
    /// X position of the mouse cursor, if any.
    pub x_cursor_position: f32,
    /// Y position of the mouse cursor, if any.
    pub y_cursor_position: f32,
    /// Pointer slots; only the first `pointer_count` are meaningful.
    pub pointers: [MotionPointer; MAX_POINTERS],
}

impl MotionPayload {
    /// Id of the pointer addressed by the action code's pointer index.
    #[must_use]
    pub fn action_pointer_id(&self) -> i32 {
        let index = crate::event::MotionAction::pointer_index(self.action);
        self.pointers[index].properties.id
    }
}

/// Wire payload of a FINISHED message.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct FinishedPayload {
    /// Nonzero when the consumer handled the event.
    pub handled: u32,
    _pad0: u32,
    /// When the consumer read the event off the channel.
    pub consume_time: Nanos,
}

/// Wire payload of a FOCUS message.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct FocusPayload {
    /// Globally unique id of this event.
    pub event_id: i32,
    /// Nonzero when the window gained focus.
    pub has_focus: u32,
}

/// Wire payload of a CAPTURE message.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct CapturePayload {
    /// Globally unique id of this event.
    pub event_id: i32,
    /// Nonzero when pointer capture is enabled.
    pub pointer_capture_enabled: u32,
}

/// Wire payload of a DRAG message.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct DragPayload {
    /// Globally unique id of this event.
    pub event_id: i32,
    /// Drag X position in window coordinates.
    pub x: f32,
    /// Drag Y position in window coordinates.
    pub y: f32,
    /// Nonzero when the drag is leaving the window.
    pub is_exiting: u32,
}

/// Wire payload of a TIMELINE message.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct TimelinePayload {
    /// Id of the input event this timeline describes.
    pub event_id: i32,
    _pad0: u32,
    /// When the GPU finished rendering the frame containing the event.
    pub gpu_completed_time: Nanos,
    /// When that frame was presented; must be later than
    /// [`gpu_completed_time`](Self::gpu_completed_time).
    pub present_time: Nanos,
}

/// Wire payload of a TOUCH_MODE message.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct TouchModePayload {
    /// Globally unique id of this event.
    pub event_id: i32,
    /// Nonzero when the display is in touch mode.
    pub is_in_touch_mode: u32,
}

// The wire layout is frozen; a drifting struct is a protocol break, so pin
// every size at compile time.
const _: () = assert!(size_of::<Header>() == 8);
const _: () = assert!(size_of::<KeyPayload>() == 96);
const _: () = assert!(size_of::<PointerProperties>() == 8);
const _: () = assert!(size_of::<PointerCoords>() == 16 + MAX_AXES * 4);
const _: () = assert!(size_of::<MotionPointer>() == 144);
const _: () = assert!(size_of::<MotionPayload>() == 168 + MAX_POINTERS * 144);
const _: () = assert!(size_of::<FinishedPayload>() == 16);
const _: () = assert!(size_of::<FocusPayload>() == 8);
const _: () = assert!(size_of::<CapturePayload>() == 8);
const _: () = assert!(size_of::<DragPayload>() == 16);
const _: () = assert!(size_of::<TimelinePayload>() == 24);
const _: () = assert!(size_of::<TouchModePayload>() == 8);

/// The payload of one message, tagged by kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Payload {
    /// A key press or release.
    Key(KeyPayload),
    /// A pointer motion sample.
    Motion(MotionPayload),
    /// An acknowledgment of one event.
    Finished(FinishedPayload),
    /// A focus change.
    Focus(FocusPayload),
    /// A pointer-capture change.
    Capture(CapturePayload),
    /// A drag-location update.
    Drag(DragPayload),
    /// A graphics timeline for one event.
    Timeline(TimelinePayload),
    /// A touch-mode change.
    TouchMode(TouchModePayload),
}

/// One complete wire message.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Message {
    /// Sequence number; nonzero for published events, zero only for
    /// TIMELINE.
    pub seq: u32,
    /// The typed payload.
    pub payload: Payload,
}

impl Message {
    /// The kind of this message.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self.payload {
            Payload::Key(_) => MessageKind::Key,
            Payload::Motion(_) => MessageKind::Motion,
            Payload::Finished(_) => MessageKind::Finished,
            Payload::Focus(_) => MessageKind::Focus,
            Payload::Capture(_) => MessageKind::Capture,
            Payload::Drag(_) => MessageKind::Drag,
            Payload::Timeline(_) => MessageKind::Timeline,
            Payload::TouchMode(_) => MessageKind::TouchMode,
        }
    }

    /// Number of bytes this message occupies on the wire.
    #[must_use]
    pub fn wire_size(&self) -> usize {
        let body = match &self.payload {
            Payload::Key(_) => size_of::<KeyPayload>(),
            Payload::Motion(motion) => motion_body_size(motion.pointer_count as usize),
            Payload::Finished(_) => size_of::<FinishedPayload>(),
            Payload::Focus(_) => size_of::<FocusPayload>(),
            Payload::Capture(_) => size_of::<CapturePayload>(),
            Payload::Drag(_) => size_of::<DragPayload>(),
            Payload::Timeline(_) => size_of::<TimelinePayload>(),
            Payload::TouchMode(_) => size_of::<TouchModePayload>(),
        };
        HEADER_SIZE + body
    }

    /// Returns a copy whose wire bytes depend only on the declared fields
    /// of the active payload.
    ///
    /// Padding, pointer slots at and beyond `pointer_count`, and axis value
    /// slots beyond each pointer's populated count are forced to zero.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let payload = match &self.payload {
            Payload::Key(key) => {
                let mut clean = KeyPayload::zeroed();
                clean.event_id = key.event_id;
                clean.event_time = key.event_time;
                clean.device_id = key.device_id;
                clean.source = key.source;
                clean.display_id = key.display_id;
                clean.hmac = key.hmac;
                clean.action = key.action;
                clean.flags = key.flags;
                clean.key_code = key.key_code;
                clean.scan_code = key.scan_code;
                clean.meta_state = key.meta_state;
                clean.repeat_count = key.repeat_count;
                clean.down_time = key.down_time;
                Payload::Key(clean)
            }
            Payload::Motion(motion) => {
                let mut clean = MotionPayload::zeroed();
                clean.event_id = motion.event_id;
                clean.pointer_count = motion.pointer_count;
                clean.event_time = motion.event_time;
                clean.device_id = motion.device_id;
                clean.source = motion.source;
                clean.display_id = motion.display_id;
                clean.hmac = motion.hmac;
                clean.action = motion.action;
                clean.action_button = motion.action_button;
                clean.flags = motion.flags;
                clean.edge_flags = motion.edge_flags;
                clean.meta_state = motion.meta_state;
                clean.button_state = motion.button_state;
                clean.classification = motion.classification;
                clean.down_time = motion.down_time;
                clean.transform = motion.transform;
                clean.raw_transform = motion.raw_transform;
                clean.x_precision = motion.x_precision;
                clean.y_precision = motion.y_precision;
                clean.x_cursor_position = motion.x_cursor_position;
                clean.y_cursor_position = motion.y_cursor_position;
                let count = (motion.pointer_count as usize).min(MAX_POINTERS);
                for i in 0..count {
                    let src = &motion.pointers[i];
                    let dst = &mut clean.pointers[i];
                    dst.properties = src.properties;
                    dst.coords.bits = src.coords.bits;
                    let populated = (src.coords.bits.count_ones() as usize).min(MAX_AXES);
                    dst.coords.values[..populated].copy_from_slice(&src.coords.values[..populated]);
                    dst.coords.set_resampled(src.coords.is_resampled());
                }
                Payload::Motion(clean)
            }
            Payload::Finished(finished) => {
                let mut clean = FinishedPayload::zeroed();
                clean.handled = finished.handled;
                clean.consume_time = finished.consume_time;
                Payload::Finished(clean)
            }
            Payload::Focus(focus) => {
                let mut clean = FocusPayload::zeroed();
                clean.event_id = focus.event_id;
                clean.has_focus = focus.has_focus;
                Payload::Focus(clean)
            }
            Payload::Capture(capture) => {
                let mut clean = CapturePayload::zeroed();
                clean.event_id = capture.event_id;
                clean.pointer_capture_enabled = capture.pointer_capture_enabled;
                Payload::Capture(clean)
            }
            Payload::Drag(drag) => {
                let mut clean = DragPayload::zeroed();
                clean.event_id = drag.event_id;
                clean.x = drag.x;
                clean.y = drag.y;
                clean.is_exiting = drag.is_exiting;
                Payload::Drag(clean)
            }
            Payload::Timeline(timeline) => {
                let mut clean = TimelinePayload::zeroed();
                clean.event_id = timeline.event_id;
                clean.gpu_completed_time = timeline.gpu_completed_time;
                clean.present_time = timeline.present_time;
                Payload::Timeline(clean)
            }
            Payload::TouchMode(touch_mode) => {
                let mut clean = TouchModePayload::zeroed();
                clean.event_id = touch_mode.event_id;
                clean.is_in_touch_mode = touch_mode.is_in_touch_mode;
                Payload::TouchMode(clean)
            }
        };
        Self {
            seq: self.seq,
            payload,
        }
    }

    /// Writes this message's wire bytes into `buf`, returning the number of
    /// bytes written.
    ///
    /// Bytes are written as-is; callers sending across the trust boundary
    /// must encode a [`sanitized`](Self::sanitized) copy.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is shorter than [`wire_size`](Self::wire_size).
    pub fn encode_into(&self, buf: &mut [u8]) -> usize {
        let size = self.wire_size();
        let header = Header {
            kind: self.kind() as u32,
            seq: self.seq,
        };
        buf[..HEADER_SIZE].copy_from_slice(bytemuck::bytes_of(&header));
        let body = &mut buf[HEADER_SIZE..size];
        match &self.payload {
            Payload::Key(key) => body.copy_from_slice(bytemuck::bytes_of(key)),
            Payload::Motion(motion) => {
                body.copy_from_slice(&bytemuck::bytes_of(motion)[..body.len()]);
            }
            Payload::Finished(finished) => body.copy_from_slice(bytemuck::bytes_of(finished)),
            Payload::Focus(focus) => body.copy_from_slice(bytemuck::bytes_of(focus)),
            Payload::Capture(capture) => body.copy_from_slice(bytemuck::bytes_of(capture)),
            Payload::Drag(drag) => body.copy_from_slice(bytemuck::bytes_of(drag)),
            Payload::Timeline(timeline) => body.copy_from_slice(bytemuck::bytes_of(timeline)),
            Payload::TouchMode(touch_mode) => {
                body.copy_from_slice(bytemuck::bytes_of(touch_mode));
            }
        }
        size
    }

    /// Decodes one received datagram.
    ///
    /// Returns `None` when the kind is unknown, the size does not match the
    /// kind exactly, a motion's pointer count is out of range, or a
    /// timeline is non-increasing.
    #[must_use]
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_SIZE {
            return None;
        }
        let header: Header = bytemuck::pod_read_unaligned(&bytes[..HEADER_SIZE]);
        let kind = MessageKind::from_raw(header.kind)?;
        let body = &bytes[HEADER_SIZE..];
        let payload = match kind {
            MessageKind::Key => Payload::Key(read_exact::<KeyPayload>(body)?),
            MessageKind::Motion => {
                if body.len() < MOTION_FIXED_SIZE || body.len() > size_of::<MotionPayload>() {
                    return None;
                }
                let mut motion = MotionPayload::zeroed();
                bytemuck::bytes_of_mut(&mut motion)[..body.len()].copy_from_slice(body);
                let count = motion.pointer_count as usize;
                if count < 1 || count > MAX_POINTERS {
                    return None;
                }
                if body.len() != motion_body_size(count) {
                    return None;
                }
                Payload::Motion(motion)
            }
            MessageKind::Finished => Payload::Finished(read_exact::<FinishedPayload>(body)?),
            MessageKind::Focus => Payload::Focus(read_exact::<FocusPayload>(body)?),
            MessageKind::Capture => Payload::Capture(read_exact::<CapturePayload>(body)?),
            MessageKind::Drag => Payload::Drag(read_exact::<DragPayload>(body)?),
            MessageKind::Timeline => {
                let timeline = read_exact::<TimelinePayload>(body)?;
                if timeline.present_time <= timeline.gpu_completed_time {
                    return None;
                }
                Payload::Timeline(timeline)
            }
            MessageKind::TouchMode => Payload::TouchMode(read_exact::<TouchModePayload>(body)?),
        };
        Some(Self {
            seq: header.seq,
            payload,
        })
    }
}

fn read_exact<T: Pod>(body: &[u8]) -> Option<T> {
    if body.len() != size_of::<T>() {
        return None;
    }
    Some(bytemuck::pod_read_unaligned(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{axis, MotionAction, PointerCoords, PointerProperties, Source, ToolType};

    fn key_message(seq: u32) -> Message {
        let mut key = KeyPayload::zeroed();
        key.event_id = 77;
        key.event_time = 1_000_000;
        key.device_id = 3;
        key.source = Source::KEYBOARD.bits();
        key.display_id = 0;
        key.hmac = [0xab; 32];
        key.action = 0;
        key.key_code = 66;
        key.scan_code = 17;
        key.meta_state = 0x41;
        key.repeat_count = 1;
        key.down_time = 900_000;
        Message {
            seq,
            payload: Payload::Key(key),
        }
    }

    fn motion_message(seq: u32, pointer_count: u32) -> Message {
        let mut motion = MotionPayload::zeroed();
        motion.event_id = 12;
        motion.pointer_count = pointer_count;
        motion.event_time = 5_000_000;
        motion.device_id = 2;
        motion.source = Source::TOUCHSCREEN.bits();
        motion.action = MotionAction::Move.code();
        motion.down_time = 4_000_000;
        motion.transform = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        motion.raw_transform = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        motion.x_precision = 1.5;
        motion.y_precision = 1.5;
        for i in 0..pointer_count as usize {
            motion.pointers[i].properties = PointerProperties::new(i as i32, ToolType::Finger);
            motion.pointers[i].coords = PointerCoords::from_xy(10.0 + i as f32, 20.0);
        }
        Message {
            seq,
            payload: Payload::Motion(motion),
        }
    }

    #[test]
    fn key_round_trips_byte_for_byte() {
        let message = key_message(5);
        let mut buf = [0u8; MAX_MESSAGE_SIZE];
        let len = message.sanitized().encode_into(&mut buf);
        assert_eq!(len, HEADER_SIZE + 96);

        let decoded = Message::decode(&buf[..len]).expect("valid key");
        assert_eq!(decoded.seq, 5);
        assert_eq!(decoded, message.sanitized());
    }

    #[test]
    fn motion_wire_size_truncates_unused_pointers() {
        let one = motion_message(1, 1);
        let two = motion_message(1, 2);
        assert_eq!(two.wire_size() - one.wire_size(), size_of::<MotionPointer>());
        assert!(two.wire_size() < MAX_MESSAGE_SIZE);

        let full = motion_message(1, MAX_POINTERS as u32);
        assert_eq!(full.wire_size(), MAX_MESSAGE_SIZE);
    }

    #[test]
    fn motion_round_trips_through_the_codec() {
        let message = motion_message(9, 2);
        let mut buf = [0u8; MAX_MESSAGE_SIZE];
        let len = message.sanitized().encode_into(&mut buf);

        let decoded = Message::decode(&buf[..len]).expect("valid motion");
        assert_eq!(decoded.seq, 9);
        let Payload::Motion(motion) = decoded.payload else {
            panic!("expected motion payload");
        };
        assert_eq!(motion.pointer_count, 2);
        assert_eq!(motion.pointers[0].coords.x(), 10.0);
        assert_eq!(motion.pointers[1].coords.x(), 11.0);
        assert_eq!(motion.pointers[1].properties.id, 1);
    }

    #[test]
    fn sanitize_preserves_wire_size() {
        let message = motion_message(3, 2);
        assert_eq!(message.sanitized().wire_size(), message.wire_size());
    }

    #[test]
    fn sanitize_zeroes_undeclared_bytes() {
        let mut message = motion_message(3, 1);
        let Payload::Motion(motion) = &mut message.payload else {
            unreachable!();
        };
        // Scribble over slots that are not part of the declared payload: a
        // pointer beyond pointer_count and axis values beyond the populated
        // prefix of pointer 0.
        motion.pointers[1].coords = PointerCoords::from_xy(999.0, 999.0);
        motion.pointers[0].coords.values[5] = 123.0;

        let clean = message.sanitized();
        let Payload::Motion(clean_motion) = clean.payload else {
            unreachable!();
        };
        assert_eq!(clean_motion.pointers[1], MotionPointer::default());
        assert_eq!(clean_motion.pointers[0].coords.values[5], 0.0);
        assert_eq!(clean_motion.pointers[0].coords.x(), 10.0);
    }

    #[test]
    fn sanitize_keeps_the_resampled_flag() {
        let mut message = motion_message(3, 1);
        let Payload::Motion(motion) = &mut message.payload else {
            unreachable!();
        };
        motion.pointers[0].coords.set_resampled(true);

        let Payload::Motion(clean) = message.sanitized().payload else {
            unreachable!();
        };
        assert!(clean.pointers[0].coords.is_resampled());
    }

    #[test]
    fn decode_rejects_wrong_sizes() {
        let message = key_message(1);
        let mut buf = [0u8; MAX_MESSAGE_SIZE];
        let len = message.sanitized().encode_into(&mut buf);

        assert!(Message::decode(&buf[..len - 1]).is_none(), "truncated");
        assert!(Message::decode(&buf[..len + 8]).is_none(), "oversized");
        assert!(Message::decode(&buf[..4]).is_none(), "sub-header");
    }

    #[test]
    fn decode_rejects_unknown_kinds() {
        let header = Header { kind: 99, seq: 1 };
        let mut buf = [0u8; HEADER_SIZE];
        buf.copy_from_slice(bytemuck::bytes_of(&header));
        assert!(Message::decode(&buf).is_none());
    }

    #[test]
    fn decode_rejects_bad_pointer_counts() {
        for bad_count in [0u32, MAX_POINTERS as u32 + 1] {
            let mut message = motion_message(1, 1);
            let Payload::Motion(motion) = &mut message.payload else {
                unreachable!();
            };
            motion.pointer_count = bad_count;
            // Encode with a one-pointer body but a lying count.
            let mut buf = [0u8; MAX_MESSAGE_SIZE];
            let body = motion_body_size(1);
            let header = Header {
                kind: MessageKind::Motion as u32,
                seq: 1,
            };
            buf[..HEADER_SIZE].copy_from_slice(bytemuck::bytes_of(&header));
            buf[HEADER_SIZE..HEADER_SIZE + body]
                .copy_from_slice(&bytemuck::bytes_of(motion)[..body]);
            assert!(
                Message::decode(&buf[..HEADER_SIZE + body]).is_none(),
                "pointer_count={bad_count}"
            );
        }
    }

    #[test]
    fn decode_rejects_non_increasing_timelines() {
        let mut timeline = TimelinePayload::zeroed();
        timeline.event_id = 4;
        timeline.gpu_completed_time = 2_000;
        timeline.present_time = 2_000;
        let message = Message {
            seq: 0,
            payload: Payload::Timeline(timeline),
        };
        let mut buf = [0u8; MAX_MESSAGE_SIZE];
        let len = message.encode_into(&mut buf);
        assert!(Message::decode(&buf[..len]).is_none());

        let mut ok = timeline;
        ok.present_time = 3_000;
        let message = Message {
            seq: 0,
            payload: Payload::Timeline(ok),
        };
        let len = message.encode_into(&mut buf);
        assert!(Message::decode(&buf[..len]).is_some());
    }

    #[test]
    fn finished_and_small_payloads_round_trip() {
        let mut finished = FinishedPayload::zeroed();
        finished.handled = 1;
        finished.consume_time = 42_000;
        let messages = [
            Message {
                seq: 8,
                payload: Payload::Finished(finished),
            },
            Message {
                seq: 9,
                payload: Payload::Focus(FocusPayload {
                    event_id: 1,
                    has_focus: 1,
                }),
            },
            Message {
                seq: 10,
                payload: Payload::Capture(CapturePayload {
                    event_id: 2,
                    pointer_capture_enabled: 0,
                }),
            },
            Message {
                seq: 11,
                payload: Payload::Drag(DragPayload {
                    event_id: 3,
                    x: 4.5,
                    y: -1.0,
                    is_exiting: 1,
                }),
            },
            Message {
                seq: 12,
                payload: Payload::TouchMode(TouchModePayload {
                    event_id: 4,
                    is_in_touch_mode: 1,
                }),
            },
        ];
        for message in messages {
            let mut buf = [0u8; MAX_MESSAGE_SIZE];
            let len = message.sanitized().encode_into(&mut buf);
            let decoded = Message::decode(&buf[..len]).expect("valid message");
            assert_eq!(decoded, message);
        }
    }

    #[test]
    fn coords_with_populated_axes_survive_sanitize() {
        let mut message = motion_message(2, 1);
        let Payload::Motion(motion) = &mut message.payload else {
            unreachable!();
        };
        motion.pointers[0]
            .coords
            .set_axis_value(axis::PRESSURE, 0.75);

        let Payload::Motion(clean) = message.sanitized().payload else {
            unreachable!();
        };
        assert_eq!(clean.pointers[0].coords.axis_value(axis::PRESSURE), Some(0.75));
        assert_eq!(clean.pointers[0].coords.x(), 10.0);
        assert_eq!(clean.pointers[0].coords.y(), 20.0);
    }
}
