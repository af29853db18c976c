// Copyright 2026 the Afferent Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The consuming endpoint.
//!
//! A [`Consumer`] sits on the application's side of a channel. Its job is
//! harder than the publisher's: consecutive `MOVE`/`HOVER_MOVE` samples are
//! *batched* per (device, source) stream and only flushed when the caller
//! asks for a frame, the flushed event gets one resampled sample appended
//! (see [`afferent_core::resample`]), and every source sample absorbed into
//! a delivered event is remembered so the publisher still receives exactly
//! one FINISHED per publish (see [`afferent_core::seq`]).
//!
//! The expected driving loop, with an external poller watching the fd:
//!
//! ```text
//! on fd readable, or at frame start:
//!     loop {
//!         match consumer.consume(&mut factory, consume_batches, frame_time) {
//!             Ok((seq, event)) => { deliver(event); consumer.send_finished_signal(seq, handled)?; }
//!             Err(WouldBlock) => break,
//!             Err(other) => teardown(other),
//!         }
//!     }
//! ```
//!
//! A consumer is single-threaded; it performs no locking and never blocks.

use std::collections::HashMap;
use std::fmt::Write as _;

use afferent_core::batch::{Batch, MotionSample};
use afferent_core::error::TransportError;
use afferent_core::event::{
    EventFactory, GraphicsTimeline, InputEvent, KeyArgs, KeyEvent, MotionAction, MotionArgs,
    MotionEvent, PointerCoords, PointerProperties, Source, MAX_POINTERS,
};
use afferent_core::resample::{Resampler, RESAMPLE_LATENCY};
use afferent_core::seq::SeqChainTracker;
use afferent_core::time::Nanos;
use afferent_core::transform::Transform2d;
use afferent_core::wire::{
    FinishedPayload, KeyPayload, Message, MotionPayload, Payload, TimelinePayload,
};
use bytemuck::Zeroable;

use crate::channel::Channel;
use crate::time::monotonic_now;

/// Environment variable controlling the default resampling state.
///
/// Set to `0` or `false` to disable touch resampling for consumers built
/// with [`Consumer::new`]. Resampling is enabled by default; hardware whose
/// touch reports are already frame-synchronized should disable it.
pub const RESAMPLING_ENV: &str = "AFFERENT_RESAMPLING";

/// Reads the host's default for touch resampling from [`RESAMPLING_ENV`].
#[must_use]
pub fn touch_resampling_enabled_default() -> bool {
    match std::env::var(RESAMPLING_ENV) {
        Ok(value) => !(value == "0" || value.eq_ignore_ascii_case("false")),
        Err(_) => true,
    }
}

/// The event-consuming endpoint of a channel.
pub struct Consumer {
    channel: Channel,
    resample_touch: bool,
    batches: Vec<Batch>,
    resampler: Resampler,
    seq_chains: SeqChainTracker,
    consume_times: HashMap<u32, Nanos>,
    deferred: Option<Message>,
    clock: Box<dyn Fn() -> Nanos>,
}

impl std::fmt::Debug for Consumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Consumer")
            .field("channel", &self.channel)
            .field("resample_touch", &self.resample_touch)
            .field("batches", &self.batches.len())
            .field("seq_chains", &self.seq_chains.len())
            .field("consume_times", &self.consume_times.len())
            .field("deferred", &self.deferred.map(|msg| msg.kind()))
            .finish_non_exhaustive()
    }
}

impl Consumer {
    /// Creates a consumer with the host's default resampling setting.
    #[must_use]
    pub fn new(channel: Channel) -> Self {
        Self::with_resampling(channel, touch_resampling_enabled_default())
    }

    /// Creates a consumer with an explicit resampling setting.
    #[must_use]
    pub fn with_resampling(channel: Channel, resample_touch: bool) -> Self {
        Self::with_clock(channel, resample_touch, Box::new(monotonic_now))
    }

    /// Creates a consumer reading consume times from `clock` instead of the
    /// monotonic clock.
    #[must_use]
    pub fn with_clock(
        channel: Channel,
        resample_touch: bool,
        clock: Box<dyn Fn() -> Nanos>,
    ) -> Self {
        Self {
            channel,
            resample_touch,
            batches: Vec::new(),
            resampler: Resampler::new(),
            seq_chains: SeqChainTracker::new(),
            consume_times: HashMap::new(),
            deferred: None,
            clock,
        }
    }

    /// The underlying channel.
    #[must_use]
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Whether touch resampling is enabled for this consumer.
    #[must_use]
    pub fn resampling_enabled(&self) -> bool {
        self.resample_touch
    }

    /// Consumes the next available event.
    ///
    /// Receives and batches messages until one event can be delivered.
    /// `consume_batches` asks for queued batches to be flushed even though
    /// the channel still polls readable-empty; `frame_time` is the deadline
    /// a flush aims at (`None` flushes an entire batch at once).
    ///
    /// Returns the delivered event together with the sequence number to
    /// pass to [`send_finished_signal`](Self::send_finished_signal).
    ///
    /// # Errors
    ///
    /// [`TransportError::WouldBlock`] when no event is ready;
    /// [`TransportError::OutOfMemory`] when the factory declines an
    /// allocation; receive failures pass through once queued batches cannot
    /// produce an event either.
    ///
    /// # Panics
    ///
    /// Panics when the peer double-delivers a sequence number or sends a
    /// FINISHED/TIMELINE at this endpoint; both mean the protocol state is
    /// corrupt.
    pub fn consume(
        &mut self,
        factory: &mut dyn EventFactory,
        consume_batches: bool,
        frame_time: Option<Nanos>,
    ) -> Result<(u32, InputEvent), TransportError> {
        tracing::trace!(
            channel = %self.channel.name(),
            consume_batches,
            ?frame_time,
            "consume"
        );

        loop {
            let msg = match self.deferred.take() {
                Some(deferred) => deferred,
                None => match self.channel.receive_message() {
                    Ok(msg) => {
                        let consume_time = (self.clock)();
                        let previous = self.consume_times.insert(msg.seq, consume_time);
                        assert!(
                            previous.is_none(),
                            "already have a consume time for seq {}",
                            msg.seq
                        );
                        msg
                    }
                    Err(err) => {
                        // Flush batches unless the caller is holding them
                        // back and the channel is merely empty.
                        if consume_batches || err != TransportError::WouldBlock {
                            return self.consume_batch(factory, frame_time);
                        }
                        return Err(err);
                    }
                },
            };

            match msg.payload {
                Payload::Key(key) => {
                    let mut event = factory
                        .create_key_event()
                        .ok_or(TransportError::OutOfMemory)?;
                    initialize_key_event(&mut event, &key);
                    tracing::trace!(channel = %self.channel.name(), seq = msg.seq, "consumed key event");
                    return Ok((msg.seq, InputEvent::Key(event)));
                }

                Payload::Motion(mut motion) => {
                    if let Some(index) = self.find_batch(motion.device_id, motion.source) {
                        if self.batches[index].can_append(&motion) {
                            self.batches[index].samples.push(MotionSample {
                                seq: msg.seq,
                                motion,
                            });
                            tracing::trace!(
                                channel = %self.channel.name(),
                                seq = msg.seq,
                                "appended to batch"
                            );
                            continue;
                        }

                        let is_pointer_cancel = Source::from_bits_retain(motion.source)
                            .is_pointer()
                            && MotionAction::from_code(motion.action)
                                == Some(MotionAction::Cancel);
                        if is_pointer_cancel {
                            // Nothing queued before a cancel is worth
                            // delivering; finish it all unhandled.
                            let batch = self.batches.remove(index);
                            for sample in &batch.samples {
                                let _ = self.send_finished_signal(sample.seq, false);
                            }
                        } else {
                            // The batch in progress must be delivered now;
                            // the incompatible message waits for the next
                            // call.
                            self.deferred = Some(Message {
                                seq: msg.seq,
                                payload: Payload::Motion(motion),
                            });
                            let mut batch = self.batches.remove(index);
                            let count = batch.samples.len();
                            let out = self.consume_samples(factory, &mut batch, count)?;
                            tracing::trace!(
                                channel = %self.channel.name(),
                                seq = out.0,
                                "flushed batch ahead of incompatible message"
                            );
                            return Ok(out);
                        }
                    }

                    let action = MotionAction::from_code(motion.action);
                    if action == Some(MotionAction::Move)
                        || action == Some(MotionAction::HoverMove)
                    {
                        self.batches.push(Batch::new(MotionSample {
                            seq: msg.seq,
                            motion,
                        }));
                        tracing::trace!(channel = %self.channel.name(), seq = msg.seq, "started batch");
                        continue;
                    }

                    if self.resample_touch {
                        self.resampler.update(&mut motion);
                    }
                    let mut event = factory
                        .create_motion_event()
                        .ok_or(TransportError::OutOfMemory)?;
                    initialize_motion_event(&mut event, &motion);
                    tracing::trace!(channel = %self.channel.name(), seq = msg.seq, "consumed motion event");
                    return Ok((msg.seq, InputEvent::Motion(event)));
                }

                Payload::Finished(_) | Payload::Timeline(_) => {
                    panic!(
                        "consumed a {:?} message, which should never reach the consumer",
                        msg.kind()
                    );
                }

                Payload::Focus(focus) => {
                    let mut event = factory
                        .create_focus_event()
                        .ok_or(TransportError::OutOfMemory)?;
                    event.initialize(focus.event_id, focus.has_focus != 0);
                    return Ok((msg.seq, InputEvent::Focus(event)));
                }

                Payload::Capture(capture) => {
                    let mut event = factory
                        .create_capture_event()
                        .ok_or(TransportError::OutOfMemory)?;
                    event.initialize(capture.event_id, capture.pointer_capture_enabled != 0);
                    return Ok((msg.seq, InputEvent::Capture(event)));
                }

                Payload::Drag(drag) => {
                    let mut event = factory
                        .create_drag_event()
                        .ok_or(TransportError::OutOfMemory)?;
                    event.initialize(drag.event_id, drag.x, drag.y, drag.is_exiting != 0);
                    return Ok((msg.seq, InputEvent::Drag(event)));
                }

                Payload::TouchMode(touch_mode) => {
                    let mut event = factory
                        .create_touch_mode_event()
                        .ok_or(TransportError::OutOfMemory)?;
                    event.initialize(touch_mode.event_id, touch_mode.is_in_touch_mode != 0);
                    return Ok((msg.seq, InputEvent::TouchMode(event)));
                }
            }
        }
    }

    /// Flushes the most recently started batch that has a sample due at
    /// `frame_time`.
    fn consume_batch(
        &mut self,
        factory: &mut dyn EventFactory,
        frame_time: Option<Nanos>,
    ) -> Result<(u32, InputEvent), TransportError> {
        for i in (0..self.batches.len()).rev() {
            let Some(frame_time) = frame_time else {
                let mut batch = self.batches.remove(i);
                let count = batch.samples.len();
                return self.consume_samples(factory, &mut batch, count);
            };

            let sample_time = if self.resample_touch {
                frame_time - RESAMPLE_LATENCY
            } else {
                frame_time
            };
            let Some(split) = self.batches[i].last_index_no_later_than(sample_time) else {
                // No sample is due yet; the whole batch stays queued.
                continue;
            };

            let mut batch = self.batches.remove(i);
            match self.consume_samples(factory, &mut batch, split + 1) {
                Ok((seq, mut event)) => {
                    let next = batch.samples.first().map(|sample| sample.motion);
                    if !batch.samples.is_empty() {
                        self.batches.insert(i, batch);
                    }
                    if self.resample_touch {
                        if let InputEvent::Motion(motion_event) = &mut event {
                            self.resampler
                                .resample(sample_time, motion_event, next.as_ref());
                        }
                    }
                    return Ok((seq, event));
                }
                Err(err) => {
                    self.batches.insert(i, batch);
                    return Err(err);
                }
            }
        }
        Err(TransportError::WouldBlock)
    }

    /// Merges the first `count` samples of `batch` into one motion event,
    /// recording a sequence-chain link for every absorbed sample.
    fn consume_samples(
        &mut self,
        factory: &mut dyn EventFactory,
        batch: &mut Batch,
        count: usize,
    ) -> Result<(u32, InputEvent), TransportError> {
        let mut event = factory
            .create_motion_event()
            .ok_or(TransportError::OutOfMemory)?;

        let mut chain: u32 = 0;
        for (i, sample) in batch.samples.drain(..count).enumerate() {
            let mut motion = sample.motion;
            if self.resample_touch {
                self.resampler.update(&mut motion);
            }
            if i == 0 {
                initialize_motion_event(&mut event, &motion);
            } else {
                self.seq_chains.push(sample.seq, chain);
                append_motion_sample(&mut event, &motion);
            }
            chain = sample.seq;
        }

        Ok((chain, InputEvent::Motion(event)))
    }

    /// Acknowledges a delivered event back to the publisher.
    ///
    /// Sends one FINISHED for every source sequence number absorbed into
    /// the delivered event (oldest first), then one for `seq` itself, each
    /// carrying the time its message was read off the channel. If a send
    /// fails partway through, the unacknowledged remainder is relinked so a
    /// retry sends each exactly once.
    ///
    /// # Errors
    ///
    /// [`TransportError::InvalidSeq`] for `seq == 0`; otherwise the first
    /// channel send failure.
    ///
    /// # Panics
    ///
    /// Panics when no consume time is recorded for a sequence number being
    /// finished — the event was finished twice, or never delivered by this
    /// consumer.
    pub fn send_finished_signal(&mut self, seq: u32, handled: bool) -> Result<(), TransportError> {
        tracing::trace!(channel = %self.channel.name(), seq, handled, "send finished signal");
        if seq == 0 {
            tracing::debug!("attempted to send a finished signal with sequence number 0");
            return Err(TransportError::InvalidSeq);
        }

        let chain_seqs = self.seq_chains.take_chain(seq);
        let mut index = chain_seqs.len();
        while index > 0 {
            index -= 1;
            if let Err(err) = self.send_unchained_finished_signal(chain_seqs[index], handled) {
                // At least one signal was not sent; relink so a retry
                // acknowledges the remainder exactly once.
                self.seq_chains.restore(seq, &chain_seqs[..=index]);
                return Err(err);
            }
        }

        self.send_unchained_finished_signal(seq, handled)
    }

    /// Reports the graphics timeline of a processed event back to the
    /// publisher.
    ///
    /// # Errors
    ///
    /// Any channel send failure.
    pub fn send_timeline(
        &mut self,
        event_id: i32,
        timeline: GraphicsTimeline,
    ) -> Result<(), TransportError> {
        tracing::trace!(
            channel = %self.channel.name(),
            event_id,
            gpu_completed_time = timeline.gpu_completed_time,
            present_time = timeline.present_time,
            "send timeline"
        );
        let mut payload = TimelinePayload::zeroed();
        payload.event_id = event_id;
        payload.gpu_completed_time = timeline.gpu_completed_time;
        payload.present_time = timeline.present_time;
        self.channel.send_message(&Message {
            seq: 0,
            payload: Payload::Timeline(payload),
        })
    }

    fn send_unchained_finished_signal(
        &mut self,
        seq: u32,
        handled: bool,
    ) -> Result<(), TransportError> {
        let consume_time = *self
            .consume_times
            .get(&seq)
            .unwrap_or_else(|| panic!("could not find consume time for seq {seq}"));

        let mut finished = FinishedPayload::zeroed();
        finished.handled = u32::from(handled);
        finished.consume_time = consume_time;
        self.channel.send_message(&Message {
            seq,
            payload: Payload::Finished(finished),
        })?;

        // The ack is on the wire; only now may the consume time go, so a
        // failed send can be retried with the original timestamp.
        self.consume_times.remove(&seq);
        Ok(())
    }

    /// Whether any batches are queued.
    #[must_use]
    pub fn has_pending_batch(&self) -> bool {
        !self.batches.is_empty()
    }

    /// Source of the first queued batch, or `None` when nothing is queued.
    #[must_use]
    pub fn pending_batch_source(&self) -> Option<Source> {
        let batch = self.batches.first()?;
        Some(Source::from_bits_retain(batch.source()))
    }

    /// Whether a `consume` call could produce an event: batches are queued
    /// or the channel polls readable.
    #[must_use]
    pub fn probably_has_input(&self) -> bool {
        self.has_pending_batch() || self.channel.probably_has_input()
    }

    /// Renders a diagnostic snapshot of the consumer's state.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "resample_touch = {}", self.resample_touch);
        let _ = writeln!(out, "channel = {}", self.channel.name());
        let _ = writeln!(out, "deferred = {:?}", self.deferred.map(|msg| msg.kind()));
        let _ = writeln!(out, "batches:");
        for batch in &self.batches {
            let _ = writeln!(
                out,
                "    batch: device={} source={:#x}",
                batch.device_id(),
                batch.source()
            );
            for sample in &batch.samples {
                let _ = write!(
                    out,
                    "        seq={} action={:#x} t={}",
                    sample.seq, sample.motion.action, sample.motion.event_time
                );
                for i in 0..sample.motion.pointer_count as usize {
                    let coords = &sample.motion.pointers[i].coords;
                    let _ = write!(out, " ({:.1}, {:.1})", coords.x(), coords.y());
                }
                let _ = writeln!(out);
            }
        }
        if self.batches.is_empty() {
            let _ = writeln!(out, "    <empty>");
        }
        let _ = writeln!(out, "seq_chains: {} open", self.seq_chains.len());
        let _ = writeln!(out, "consume_times: {} outstanding", self.consume_times.len());
        out
    }

    fn find_batch(&self, device_id: i32, source: u32) -> Option<usize> {
        self.batches
            .iter()
            .position(|batch| batch.device_id() == device_id && batch.source() == source)
    }
}

fn initialize_key_event(event: &mut KeyEvent, key: &KeyPayload) {
    event.initialize(&KeyArgs {
        event_id: key.event_id,
        device_id: key.device_id,
        source: Source::from_bits_retain(key.source),
        display_id: key.display_id,
        hmac: key.hmac,
        action: key.action,
        flags: key.flags,
        key_code: key.key_code,
        scan_code: key.scan_code,
        meta_state: key.meta_state,
        repeat_count: key.repeat_count,
        down_time: key.down_time,
        event_time: key.event_time,
    });
}

fn initialize_motion_event(event: &mut MotionEvent, motion: &MotionPayload) {
    let count = motion.pointer_count as usize;
    let mut properties = [PointerProperties::default(); MAX_POINTERS];
    let mut coords = [PointerCoords::default(); MAX_POINTERS];
    for i in 0..count {
        properties[i] = motion.pointers[i].properties;
        coords[i] = motion.pointers[i].coords;
    }
    event.initialize(&MotionArgs {
        event_id: motion.event_id,
        device_id: motion.device_id,
        source: Source::from_bits_retain(motion.source),
        display_id: motion.display_id,
        hmac: motion.hmac,
        action: motion.action,
        action_button: motion.action_button,
        flags: motion.flags,
        edge_flags: motion.edge_flags,
        meta_state: motion.meta_state,
        button_state: motion.button_state,
        classification: motion.classification,
        transform: Transform2d::from_wire(motion.transform),
        x_precision: motion.x_precision,
        y_precision: motion.y_precision,
        x_cursor_position: motion.x_cursor_position,
        y_cursor_position: motion.y_cursor_position,
        raw_transform: Transform2d::from_wire(motion.raw_transform),
        down_time: motion.down_time,
        event_time: motion.event_time,
        pointer_properties: &properties[..count],
        pointer_coords: &coords[..count],
    });
}

fn append_motion_sample(event: &mut MotionEvent, motion: &MotionPayload) {
    let count = motion.pointer_count as usize;
    let mut coords = [PointerCoords::default(); MAX_POINTERS];
    for i in 0..count {
        coords[i] = motion.pointers[i].coords;
    }
    event.meta_state |= motion.meta_state;
    event.add_sample(motion.event_time, &coords[..count]);
}
