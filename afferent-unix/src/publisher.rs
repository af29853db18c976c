// Copyright 2026 the Afferent Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The publishing endpoint.
//!
//! A [`Publisher`] sits on the window-system server's side of a channel:
//! each `publish_*` call serializes one typed event and sends it as one
//! datagram, and [`receive_consumer_response`](Publisher::receive_consumer_response)
//! drains the FINISHED/TIMELINE traffic flowing back.
//!
//! The publisher trusts its caller to emit a well-formed motion stream; an
//! optional [`MotionVerifier`] can be installed to check that assumption,
//! and a verifier failure aborts the process — it indicates a bug in the
//! producer, not a peer problem.

use afferent_core::error::TransportError;
use afferent_core::event::{GraphicsTimeline, KeyArgs, MotionArgs, MAX_POINTERS};
use afferent_core::time::Nanos;
use afferent_core::wire::{
    CapturePayload, DragPayload, FocusPayload, KeyPayload, Message, MotionPayload, Payload,
    TouchModePayload,
};
use bytemuck::Zeroable;

use crate::channel::Channel;

/// Injected outbound stream verification.
///
/// Fed every motion before it is sent. Returning an error is fatal to the
/// publishing process.
pub trait MotionVerifier {
    /// Checks one motion against the stream seen so far.
    ///
    /// # Errors
    ///
    /// A description of the inconsistency; the publisher aborts with it.
    fn process_movement(&mut self, args: &MotionArgs<'_>) -> Result<(), String>;
}

/// One response received from the consumer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsumerResponse {
    /// The consumer finished processing a published event.
    Finished {
        /// Sequence number of the finished event.
        seq: u32,
        /// Whether the application handled the event.
        handled: bool,
        /// When the consumer read the event off the channel.
        consume_time: Nanos,
    },
    /// The consumer reported the graphics timeline of a processed event.
    Timeline {
        /// Id of the input event the timeline describes.
        event_id: i32,
        /// The reported timeline.
        timeline: GraphicsTimeline,
    },
}

/// The event-publishing endpoint of a channel.
pub struct Publisher {
    channel: Channel,
    verifier: Option<Box<dyn MotionVerifier>>,
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("channel", &self.channel)
            .field("verifier", &self.verifier.is_some())
            .finish_non_exhaustive()
    }
}

impl Publisher {
    /// Creates a publisher over a channel, without stream verification.
    #[must_use]
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            verifier: None,
        }
    }

    /// Installs outbound motion-stream verification.
    pub fn set_verifier(&mut self, verifier: Box<dyn MotionVerifier>) {
        self.verifier = Some(verifier);
    }

    /// The underlying channel.
    #[must_use]
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Publishes a key event.
    ///
    /// # Errors
    ///
    /// [`TransportError::InvalidSeq`] when `seq` is zero; otherwise any
    /// channel send failure.
    pub fn publish_key_event(&mut self, seq: u32, args: &KeyArgs) -> Result<(), TransportError> {
        tracing::debug!(
            channel = %self.channel.name(),
            seq,
            key_code = args.key_code,
            action = args.action,
            "publish key event"
        );
        if seq == 0 {
            tracing::debug!("attempted to publish a key event with sequence number 0");
            return Err(TransportError::InvalidSeq);
        }

        let mut key = KeyPayload::zeroed();
        key.event_id = args.event_id;
        key.event_time = args.event_time;
        key.device_id = args.device_id;
        key.source = args.source.bits();
        key.display_id = args.display_id;
        key.hmac = args.hmac;
        key.action = args.action;
        key.flags = args.flags;
        key.key_code = args.key_code;
        key.scan_code = args.scan_code;
        key.meta_state = args.meta_state;
        key.repeat_count = args.repeat_count;
        key.down_time = args.down_time;
        self.channel.send_message(&Message {
            seq,
            payload: Payload::Key(key),
        })
    }

    /// Publishes one motion sample.
    ///
    /// # Errors
    ///
    /// [`TransportError::InvalidSeq`] when `seq` is zero;
    /// [`TransportError::InvalidMessage`] when the pointer arrays are empty,
    /// larger than [`MAX_POINTERS`], or of unequal length; otherwise any
    /// channel send failure.
    ///
    /// # Panics
    ///
    /// Aborts when an installed [`MotionVerifier`] rejects the stream; the
    /// producer is emitting inconsistent motions.
    pub fn publish_motion_event(
        &mut self,
        seq: u32,
        args: &MotionArgs<'_>,
    ) -> Result<(), TransportError> {
        if let Some(verifier) = self.verifier.as_mut() {
            if let Err(description) = verifier.process_movement(args) {
                panic!("bad motion stream: {description}");
            }
        }
        tracing::debug!(
            channel = %self.channel.name(),
            seq,
            action = args.action,
            pointer_count = args.pointer_properties.len(),
            event_time = args.event_time,
            "publish motion event"
        );

        if seq == 0 {
            tracing::debug!("attempted to publish a motion event with sequence number 0");
            return Err(TransportError::InvalidSeq);
        }
        let pointer_count = args.pointer_properties.len();
        if pointer_count < 1
            || pointer_count > MAX_POINTERS
            || pointer_count != args.pointer_coords.len()
        {
            tracing::debug!(
                channel = %self.channel.name(),
                pointer_count,
                "invalid number of pointers provided"
            );
            return Err(TransportError::InvalidMessage);
        }

        let mut motion = MotionPayload::zeroed();
        motion.event_id = args.event_id;
        motion.pointer_count = pointer_count as u32;
        motion.event_time = args.event_time;
        motion.device_id = args.device_id;
        motion.source = args.source.bits();
        motion.display_id = args.display_id;
        motion.hmac = args.hmac;
        motion.action = args.action;
        motion.action_button = args.action_button;
        motion.flags = args.flags;
        motion.edge_flags = args.edge_flags;
        motion.meta_state = args.meta_state;
        motion.button_state = args.button_state;
        motion.classification = args.classification;
        motion.down_time = args.down_time;
        motion.transform = args.transform.to_wire();
        motion.raw_transform = args.raw_transform.to_wire();
        motion.x_precision = args.x_precision;
        motion.y_precision = args.y_precision;
        motion.x_cursor_position = args.x_cursor_position;
        motion.y_cursor_position = args.y_cursor_position;
        for i in 0..pointer_count {
            motion.pointers[i].properties = args.pointer_properties[i];
            motion.pointers[i].coords = args.pointer_coords[i];
        }
        self.channel.send_message(&Message {
            seq,
            payload: Payload::Motion(motion),
        })
    }

    /// Publishes a focus change.
    ///
    /// # Errors
    ///
    /// [`TransportError::InvalidSeq`] when `seq` is zero; otherwise any
    /// channel send failure.
    pub fn publish_focus_event(
        &mut self,
        seq: u32,
        event_id: i32,
        has_focus: bool,
    ) -> Result<(), TransportError> {
        tracing::debug!(channel = %self.channel.name(), seq, event_id, has_focus, "publish focus event");
        if seq == 0 {
            return Err(TransportError::InvalidSeq);
        }
        self.channel.send_message(&Message {
            seq,
            payload: Payload::Focus(FocusPayload {
                event_id,
                has_focus: u32::from(has_focus),
            }),
        })
    }

    /// Publishes a pointer-capture change.
    ///
    /// # Errors
    ///
    /// [`TransportError::InvalidSeq`] when `seq` is zero; otherwise any
    /// channel send failure.
    pub fn publish_capture_event(
        &mut self,
        seq: u32,
        event_id: i32,
        pointer_capture_enabled: bool,
    ) -> Result<(), TransportError> {
        tracing::debug!(
            channel = %self.channel.name(),
            seq,
            event_id,
            pointer_capture_enabled,
            "publish capture event"
        );
        if seq == 0 {
            return Err(TransportError::InvalidSeq);
        }
        self.channel.send_message(&Message {
            seq,
            payload: Payload::Capture(CapturePayload {
                event_id,
                pointer_capture_enabled: u32::from(pointer_capture_enabled),
            }),
        })
    }

    /// Publishes a drag-location update.
    ///
    /// # Errors
    ///
    /// [`TransportError::InvalidSeq`] when `seq` is zero; otherwise any
    /// channel send failure.
    pub fn publish_drag_event(
        &mut self,
        seq: u32,
        event_id: i32,
        x: f32,
        y: f32,
        is_exiting: bool,
    ) -> Result<(), TransportError> {
        tracing::debug!(channel = %self.channel.name(), seq, event_id, x, y, is_exiting, "publish drag event");
        if seq == 0 {
            return Err(TransportError::InvalidSeq);
        }
        self.channel.send_message(&Message {
            seq,
            payload: Payload::Drag(DragPayload {
                event_id,
                x,
                y,
                is_exiting: u32::from(is_exiting),
            }),
        })
    }

    /// Publishes a touch-mode change.
    ///
    /// # Errors
    ///
    /// [`TransportError::InvalidSeq`] when `seq` is zero; otherwise any
    /// channel send failure.
    pub fn publish_touch_mode_event(
        &mut self,
        seq: u32,
        event_id: i32,
        is_in_touch_mode: bool,
    ) -> Result<(), TransportError> {
        tracing::debug!(
            channel = %self.channel.name(),
            seq,
            event_id,
            is_in_touch_mode,
            "publish touch mode event"
        );
        if seq == 0 {
            return Err(TransportError::InvalidSeq);
        }
        self.channel.send_message(&Message {
            seq,
            payload: Payload::TouchMode(TouchModePayload {
                event_id,
                is_in_touch_mode: u32::from(is_in_touch_mode),
            }),
        })
    }

    /// Receives one response from the consumer.
    ///
    /// # Errors
    ///
    /// Channel receive failures pass through;
    /// [`TransportError::UnexpectedMessage`] when the peer sent anything
    /// other than FINISHED or TIMELINE, which indicates a misbehaving
    /// consumer.
    pub fn receive_consumer_response(&mut self) -> Result<ConsumerResponse, TransportError> {
        let msg = self.channel.receive_message()?;
        match msg.payload {
            Payload::Finished(finished) => {
                tracing::debug!(
                    channel = %self.channel.name(),
                    seq = msg.seq,
                    handled = finished.handled != 0,
                    "consumer finished"
                );
                Ok(ConsumerResponse::Finished {
                    seq: msg.seq,
                    handled: finished.handled != 0,
                    consume_time: finished.consume_time,
                })
            }
            Payload::Timeline(timeline) => {
                tracing::debug!(
                    channel = %self.channel.name(),
                    event_id = timeline.event_id,
                    "consumer timeline"
                );
                Ok(ConsumerResponse::Timeline {
                    event_id: timeline.event_id,
                    timeline: GraphicsTimeline {
                        gpu_completed_time: timeline.gpu_completed_time,
                        present_time: timeline.present_time,
                    },
                })
            }
            _ => {
                tracing::debug!(
                    channel = %self.channel.name(),
                    kind = ?msg.kind(),
                    "received unexpected message kind from consumer"
                );
                Err(TransportError::UnexpectedMessage)
            }
        }
    }
}
