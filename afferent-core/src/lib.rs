// Copyright 2026 the Afferent Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types and pure logic for the afferent input-event transport.
//!
//! `afferent_core` provides the platform-neutral half of the transport: the
//! fixed-layout wire messages and their codec, the input-event data model,
//! motion batching, touch resampling, and the sequence-chain accounting that
//! keeps acknowledgments exact. It is `no_std` compatible (with `alloc`) and
//! performs no I/O; the socket endpoints live in `afferent_unix`.
//!
//! # Architecture
//!
//! The crate is organized around the path an input event takes from the
//! window-system server to the application:
//!
//! ```text
//!   Publisher (afferent_unix)
//!       │ publish_*()
//!       ▼
//!   Message ──► sanitize ──► encode ──► SOCK_SEQPACKET ──► decode
//!                                                             │
//!                ┌────────────────────────────────────────────┘
//!                ▼
//!   Batch (merge consecutive moves) ──► Resampler ──► MotionEvent
//!                │                                        │
//!                ▼                                        ▼
//!   SeqChainTracker ──► FINISHED per absorbed seq ──► Publisher
//! ```
//!
//! **[`wire`]** — Tagged, fixed-layout messages with byte-exact encoding,
//! structural validation of received datagrams, and a sanitizer that zeroes
//! padding and undeclared fields before anything crosses the socket.
//!
//! **[`event`]** — Sources, actions, pointer data, the concrete event types
//! handed to the application, and the [`EventFactory`](event::EventFactory)
//! allocation seam.
//!
//! **[`batch`]** — Queues of consecutive compatible motion samples for one
//! (device, source) stream, with the compatibility predicate and the
//! frame-deadline split search.
//!
//! **[`resample`]** — Per-stream history and the interpolation/extrapolation
//! rules that synthesize one extra motion sample per frame deadline.
//!
//! **[`seq`]** — The `(seq, chain)` bookkeeping that maps one delivered
//! event back to every source sequence number it absorbed.
//!
//! **[`transform`]** — The 2-D affine transform carried alongside motion
//! events.
//!
//! **[`time`]** — Nanosecond time vocabulary shared by both endpoints.
//!
//! **[`error`]** — The [`TransportError`](error::TransportError) taxonomy
//! surfaced by every fallible transport operation.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod batch;
pub mod error;
pub mod event;
pub mod resample;
pub mod seq;
pub mod time;
pub mod transform;
pub mod wire;
