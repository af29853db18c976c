// Copyright 2026 the Afferent Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! POSIX endpoints of the afferent input transport.
//!
//! This crate wires the platform-neutral model of `afferent_core` to an
//! `AF_UNIX`/`SOCK_SEQPACKET` socketpair: a reliable, ordered,
//! message-boundary-preserving, bidirectional link between exactly two
//! peers on one host.
//!
//! - **[`channel`]** — The [`Channel`](channel::Channel) endpoint: owned
//!   non-blocking fd, atomic datagram send/receive, readiness polling,
//!   duplication, and the [`ChannelHandle`](channel::ChannelHandle) used to
//!   hand an endpoint to another process.
//! - **[`publisher`]** — The server side: typed publish calls, optional
//!   outbound stream verification, and reception of FINISHED/TIMELINE
//!   responses.
//! - **[`consumer`]** — The client side: batching, touch resampling,
//!   event materialization, and the finish-signal protocol.
//! - **[`time`]** — The monotonic clock both sides stamp with.
//!
//! Both endpoints are single-threaded by design; nothing here locks. All
//! socket calls are non-blocking — the expected integration is an external
//! poller that calls [`Consumer::consume`](consumer::Consumer::consume)
//! when the fd turns readable.
//!
//! Diagnostics are emitted as `tracing` debug/trace events and never affect
//! behavior; install any subscriber (or none) as the embedder sees fit.

pub mod channel;
pub mod consumer;
pub mod publisher;
pub mod time;

pub use channel::{Channel, ChannelHandle, ConnectionToken};
pub use consumer::Consumer;
pub use publisher::{ConsumerResponse, MotionVerifier, Publisher};
