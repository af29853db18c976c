// Copyright 2026 the Afferent Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The socketpair channel.
//!
//! A [`Channel`] is one endpoint of a connected `AF_UNIX`/`SOCK_SEQPACKET`
//! pair: reliable, ordered, message-boundary-preserving, and strictly
//! point-to-point. Each endpoint exclusively owns one non-blocking fd;
//! dropping the channel closes it on every exit path.
//!
//! The kernel's default socket buffers are far larger than an input stream
//! needs, so both directions are clamped to [`SOCKET_BUFFER_SIZE`] — just
//! enough to hold a few dozen large multi-finger motion events when an
//! application falls behind.
//!
//! The wire format is not endian- or ABI-portable; a channel must never be
//! pointed at another machine. See [`afferent_core::wire`].

use std::os::fd::{AsFd, BorrowedFd, OwnedFd};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use afferent_core::error::TransportError;
use afferent_core::wire::{Message, MAX_MESSAGE_SIZE};
use rustix::event::{poll, PollFd, PollFlags};
use rustix::io::Errno;
use rustix::net::{
    recv, send, socketpair, sockopt, AddressFamily, RecvFlags, SendFlags, SocketFlags, SocketType,
};

use crate::time::monotonic_now;

/// Send and receive buffer size applied to both ends of a pair.
pub const SOCKET_BUFFER_SIZE: usize = 32 * 1024;

static TOKEN_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Opaque shared identity of a channel pair.
///
/// Both endpoints of a pair (and every duplicate of them) carry the same
/// token, letting the embedder correlate an endpoint received over IPC with
/// the connection it belongs to. The value itself has no meaning beyond
/// equality and hashing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionToken(u128);

impl ConnectionToken {
    fn mint() -> Self {
        let count = TOKEN_COUNTER.fetch_add(1, Ordering::Relaxed);
        let now = monotonic_now() as u128;
        let pid = u128::from(std::process::id());
        Self((now << 64) | (pid << 40) | u128::from(count))
    }
}

/// A channel endpoint detached from its non-blocking wrapper, suitable for
/// handing to another process over whatever IPC the embedder uses.
///
/// Reconstruct an endpoint with [`Channel::from_handle`].
#[derive(Debug)]
pub struct ChannelHandle {
    /// Human-readable endpoint name.
    pub name: String,
    /// The endpoint's socket fd.
    pub fd: OwnedFd,
    /// Shared identity of the pair.
    pub token: ConnectionToken,
}

/// One endpoint of a connected channel pair.
#[derive(Debug)]
pub struct Channel {
    name: String,
    fd: OwnedFd,
    token: ConnectionToken,
}

impl Channel {
    /// Wraps an endpoint fd, switching it to non-blocking mode.
    ///
    /// # Panics
    ///
    /// Panics if the fd cannot be made non-blocking; a blocking transport
    /// fd would deadlock the event loop, so this is an endpoint bug.
    #[must_use]
    pub fn new(name: impl Into<String>, fd: OwnedFd, token: ConnectionToken) -> Self {
        let name = name.into();
        if let Err(errno) = rustix::io::ioctl_fionbio(&fd, true) {
            panic!("channel '{name}': could not make socket non-blocking: {errno}");
        }
        tracing::debug!(channel = %name, "channel constructed");
        Self { name, fd, token }
    }

    /// Creates a connected pair named `"<name> (server)"` and
    /// `"<name> (client)"` sharing a freshly minted token.
    ///
    /// Both directions' kernel buffers are clamped to
    /// [`SOCKET_BUFFER_SIZE`].
    pub fn pair(name: &str) -> Result<(Self, Self), TransportError> {
        let (server_fd, client_fd) = socketpair(
            AddressFamily::UNIX,
            SocketType::SEQPACKET,
            SocketFlags::CLOEXEC,
            None,
        )
        .map_err(|errno| {
            tracing::debug!(channel = name, %errno, "could not create socket pair");
            TransportError::Os(errno.raw_os_error())
        })?;

        for fd in [&server_fd, &client_fd] {
            // Best effort, as the defaults still work; they just waste
            // kernel memory.
            let _ = sockopt::set_socket_send_buffer_size(fd, SOCKET_BUFFER_SIZE);
            let _ = sockopt::set_socket_recv_buffer_size(fd, SOCKET_BUFFER_SIZE);
        }

        let token = ConnectionToken::mint();
        let server = Self::new(format!("{name} (server)"), server_fd, token);
        let client = Self::new(format!("{name} (client)"), client_fd, token);
        Ok((server, client))
    }

    /// Human-readable endpoint name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared identity of the pair this endpoint belongs to.
    #[must_use]
    pub fn token(&self) -> ConnectionToken {
        self.token
    }

    /// Sends one message as a single atomic datagram.
    ///
    /// The message is sanitized first, so only the declared bytes of its
    /// payload cross the trust boundary. Never blocks.
    ///
    /// # Errors
    ///
    /// [`TransportError::WouldBlock`] when the kernel buffer is full,
    /// [`TransportError::PeerGone`] when the peer has gone away (also on a
    /// short write), any other failure as [`TransportError::Os`].
    pub fn send_message(&self, msg: &Message) -> Result<(), TransportError> {
        let mut buf = [0u8; MAX_MESSAGE_SIZE];
        let len = msg.sanitized().encode_into(&mut buf);

        let written = loop {
            match send(
                &self.fd,
                &buf[..len],
                SendFlags::DONTWAIT | SendFlags::NOSIGNAL,
            ) {
                Ok(n) => break n,
                Err(errno) if errno == Errno::INTR => {}
                Err(errno) => {
                    tracing::debug!(
                        channel = %self.name,
                        kind = ?msg.kind(),
                        %errno,
                        "error sending message"
                    );
                    return Err(map_send_errno(errno));
                }
            }
        };

        if written != len {
            tracing::debug!(channel = %self.name, kind = ?msg.kind(), "send was incomplete");
            return Err(TransportError::PeerGone);
        }

        tracing::trace!(channel = %self.name, kind = ?msg.kind(), seq = msg.seq, "sent message");
        Ok(())
    }

    /// Receives one datagram and decodes it. Never blocks.
    ///
    /// # Errors
    ///
    /// [`TransportError::WouldBlock`] when nothing is queued,
    /// [`TransportError::PeerGone`] on EOF or a vanished peer,
    /// [`TransportError::InvalidMessage`] when the datagram fails
    /// structural validation, any other failure as [`TransportError::Os`].
    pub fn receive_message(&self) -> Result<Message, TransportError> {
        let mut buf = [0u8; MAX_MESSAGE_SIZE];
        let read = loop {
            match recv(&self.fd, &mut buf, RecvFlags::DONTWAIT) {
                Ok(n) => break n,
                Err(errno) if errno == Errno::INTR => {}
                Err(errno) => {
                    tracing::debug!(channel = %self.name, %errno, "error receiving message");
                    return Err(map_recv_errno(errno));
                }
            }
        };

        if read == 0 {
            tracing::debug!(channel = %self.name, "receive failed because peer was closed");
            return Err(TransportError::PeerGone);
        }

        let Some(msg) = Message::decode(&buf[..read]) else {
            tracing::debug!(channel = %self.name, bytes = read, "received invalid message");
            return Err(TransportError::InvalidMessage);
        };
        tracing::trace!(channel = %self.name, kind = ?msg.kind(), seq = msg.seq, "received message");
        Ok(msg)
    }

    /// Zero-timeout readiness check.
    ///
    /// Returns `false` on any poll error; `EINTR` and `ENOMEM` are not
    /// retried, so a rare false negative is possible — callers treat this
    /// as a hint, never as ground truth.
    #[must_use]
    pub fn probably_has_input(&self) -> bool {
        let mut fds = [PollFd::new(&self.fd, PollFlags::IN)];
        match poll(&mut fds, 0) {
            Ok(n) if n > 0 => fds[0].revents().contains(PollFlags::IN),
            _ => false,
        }
    }

    /// Blocks until the fd polls readable or `timeout` elapses, re-entering
    /// the poll after signal interruptions against the original deadline.
    pub fn wait_for_message(&self, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        let mut remaining = timeout;
        loop {
            let millis = i32::try_from(remaining.as_millis()).unwrap_or(i32::MAX);
            let mut fds = [PollFd::new(&self.fd, PollFlags::IN)];
            match poll(&mut fds, millis) {
                Err(errno) if errno == Errno::INTR => {}
                _ => return,
            }
            remaining = match deadline.checked_duration_since(Instant::now()) {
                Some(left) if !left.is_zero() => left,
                _ => return,
            };
        }
    }

    /// Duplicates this endpoint: a new owned fd over the same connection,
    /// same name, same token.
    ///
    /// # Errors
    ///
    /// Any duplication failure other than fd-table exhaustion is returned
    /// as [`TransportError::Os`].
    ///
    /// # Panics
    ///
    /// Panics when the process is out of file descriptors (`EMFILE`/
    /// `ENFILE`). Propagating that condition tends to explode far from the
    /// leak; crashing here keeps the fault attributable.
    pub fn try_clone(&self) -> Result<Self, TransportError> {
        let fd = rustix::io::dup(&self.fd).map_err(|errno| {
            assert!(
                errno != Errno::MFILE && errno != Errno::NFILE,
                "too many open files, could not duplicate channel '{}'",
                self.name
            );
            tracing::debug!(channel = %self.name, %errno, "could not duplicate fd");
            TransportError::Os(errno.raw_os_error())
        })?;
        Ok(Self::new(self.name.clone(), fd, self.token))
    }

    /// Duplicates this endpoint into a [`ChannelHandle`] for hand-off,
    /// leaving this channel usable.
    ///
    /// # Errors
    ///
    /// See [`try_clone`](Self::try_clone).
    pub fn handle(&self) -> Result<ChannelHandle, TransportError> {
        let dup = self.try_clone()?;
        Ok(dup.into_handle())
    }

    /// Moves this endpoint into a [`ChannelHandle`], transferring fd
    /// ownership.
    #[must_use]
    pub fn into_handle(self) -> ChannelHandle {
        ChannelHandle {
            name: self.name,
            fd: self.fd,
            token: self.token,
        }
    }

    /// Reconstructs an endpoint from a handle received over IPC,
    /// re-applying non-blocking mode.
    #[must_use]
    pub fn from_handle(handle: ChannelHandle) -> Self {
        Self::new(handle.name, handle.fd, handle.token)
    }
}

impl AsFd for Channel {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

fn map_send_errno(errno: Errno) -> TransportError {
    if errno == Errno::AGAIN || errno == Errno::WOULDBLOCK {
        TransportError::WouldBlock
    } else if errno == Errno::PIPE
        || errno == Errno::NOTCONN
        || errno == Errno::CONNREFUSED
        || errno == Errno::CONNRESET
    {
        TransportError::PeerGone
    } else {
        TransportError::Os(errno.raw_os_error())
    }
}

fn map_recv_errno(errno: Errno) -> TransportError {
    if errno == Errno::AGAIN || errno == Errno::WOULDBLOCK {
        TransportError::WouldBlock
    } else if errno == Errno::PIPE || errno == Errno::NOTCONN || errno == Errno::CONNREFUSED {
        TransportError::PeerGone
    } else {
        TransportError::Os(errno.raw_os_error())
    }
}
