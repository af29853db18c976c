// Copyright 2026 the Afferent Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error taxonomy for transport operations.
//!
//! Every fallible operation on the transport surfaces one of these values;
//! none of them carries a panic. Faults attributable to *this* endpoint
//! (publishing with sequence number zero, double delivery, exhausting the
//! fd table while duplicating a channel) abort instead, because continuing
//! would corrupt the acknowledgment protocol.
//!
//! The split mirrors how callers must react:
//!
//! - [`WouldBlock`](TransportError::WouldBlock) is transient — poll and
//!   retry.
//! - [`PeerGone`](TransportError::PeerGone) is terminal — tear the
//!   connection down.
//! - [`InvalidMessage`](TransportError::InvalidMessage) and
//!   [`UnexpectedMessage`](TransportError::UnexpectedMessage) indicate a
//!   misbehaving peer; report and drop the datagram.
//! - [`Os`](TransportError::Os) carries any other raw `errno` from the
//!   socket layer.

use thiserror::Error;

/// Failure modes of channel, publisher, and consumer operations.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum TransportError {
    /// The kernel buffer is full (send) or empty (receive); retry after the
    /// fd polls ready.
    #[error("operation would block; poll and retry")]
    WouldBlock,

    /// The peer endpoint closed or reset the connection. Not retryable.
    #[error("peer endpoint is gone")]
    PeerGone,

    /// A received datagram failed structural validation (size mismatch,
    /// unknown kind, invalid pointer count, non-increasing timeline).
    #[error("received a malformed message")]
    InvalidMessage,

    /// A sequence number of zero was supplied where a published event's
    /// nonzero sequence is required.
    #[error("sequence number zero is reserved")]
    InvalidSeq,

    /// The event factory declined to allocate an event object.
    #[error("event allocation failed")]
    OutOfMemory,

    /// The peer sent a message kind that is not legal in this direction,
    /// e.g. a publisher receiving anything other than FINISHED or TIMELINE.
    #[error("peer sent an unexpected message kind")]
    UnexpectedMessage,

    /// Any other socket-layer failure, carrying the raw OS `errno`.
    #[error("os error {0}")]
    Os(i32),
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::string::ToString;

    use super::TransportError;

    #[test]
    fn display_is_stable_for_logs() {
        assert_eq!(
            TransportError::WouldBlock.to_string(),
            "operation would block; poll and retry"
        );
        assert_eq!(TransportError::Os(32).to_string(), "os error 32");
    }

    #[test]
    fn errors_are_comparable() {
        assert_eq!(TransportError::PeerGone, TransportError::PeerGone);
        assert_ne!(TransportError::Os(32), TransportError::Os(104));
    }
}
