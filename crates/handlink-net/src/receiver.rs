//! UDP landmark receiver
//!
//! Owns the listening socket and runs the receive loop on its own tokio
//! task. Every datagram is decoded independently; bad payloads and
//! transient socket errors are logged and skipped so the stream recovers on
//! the next good frame.

use handlink_core::decode_frame;
use serde::{Deserialize, Serialize};
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::channel::FrameChannel;

/// Port the hand tracker sends to by default
pub const DEFAULT_PORT: u16 = 5065;

/// Largest payload a UDP datagram can carry
const MAX_DATAGRAM_SIZE: usize = 65535;

#[derive(Error, Debug)]
pub enum ReceiverError {
    #[error("Failed to bind UDP socket on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("Receive loop stopped on socket error: {0}")]
    Io(#[from] io::Error),
    #[error("Receive task panicked or was aborted: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Receiver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiverConfig {
    /// Local address to listen on
    pub bind: IpAddr,
    /// UDP port to listen on (0 picks a free port)
    pub port: u16,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
        }
    }
}

impl ReceiverConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

#[derive(Debug, Default)]
struct Counters {
    datagrams: AtomicU64,
    frames: AtomicU64,
    rejected: AtomicU64,
    io_errors: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> ReceiverStats {
        ReceiverStats {
            datagrams: self.datagrams.load(Ordering::Acquire),
            frames: self.frames.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            io_errors: self.io_errors.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of receive loop counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    /// Datagrams read from the socket
    pub datagrams: u64,
    /// Decoded frames handed to the channel
    pub frames: u64,
    /// Datagrams dropped because they failed to decode
    pub rejected: u64,
    /// Socket errors survived by the loop
    pub io_errors: u64,
}

/// Handle to a running receive loop
///
/// Dropping the handle without calling [`shutdown`](Self::shutdown) still
/// stops the loop, but does not wait for the socket to close.
pub struct LandmarkReceiver {
    local_addr: SocketAddr,
    channel: FrameChannel,
    counters: Arc<Counters>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<Result<(), ReceiverError>>,
}

impl LandmarkReceiver {
    /// Bind the socket and start the receive loop
    ///
    /// Frames are published into `channel`. Failing to bind is the one
    /// unrecoverable receiver error and is returned here.
    pub async fn bind(config: &ReceiverConfig, channel: FrameChannel) -> Result<Self, ReceiverError> {
        let addr = config.socket_addr();
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| ReceiverError::Bind { addr, source })?;
        let local_addr = socket.local_addr()?;

        info!(address = %local_addr, "Listening for hand landmarks");

        let counters = Arc::new(Counters::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(receive_loop(
            socket,
            channel.clone(),
            counters.clone(),
            shutdown_rx,
        ));

        Ok(Self {
            local_addr,
            channel,
            counters,
            shutdown_tx,
            task,
        })
    }

    /// Address the socket is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The channel frames are published into
    pub fn channel(&self) -> FrameChannel {
        self.channel.clone()
    }

    pub fn stats(&self) -> ReceiverStats {
        self.counters.snapshot()
    }

    /// Whether the receive loop has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the receive loop and release the socket
    ///
    /// Closes the channel so nothing queued reaches the consumer, signals
    /// the loop, and waits for the task to drop the socket. Returns the
    /// error that ended the loop early, if one did.
    pub async fn shutdown(self) -> Result<ReceiverStats, ReceiverError> {
        let Self {
            local_addr,
            channel,
            counters,
            shutdown_tx,
            task,
        } = self;
        debug!(address = %local_addr, "Shutting down landmark receiver");

        channel.close();
        // Err only means the loop already exited and dropped its receiver
        let _ = shutdown_tx.send(true);
        task.await??;

        let stats = counters.snapshot();
        info!(
            address = %local_addr,
            datagrams = stats.datagrams,
            frames = stats.frames,
            rejected = stats.rejected,
            "Landmark receiver stopped"
        );
        Ok(stats)
    }
}

/// Receive errors that the loop survives
///
/// ICMP port-unreachable from a previous send surfaces as a reset on some
/// platforms, and interrupted or spurious wakeups carry no information.
fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
    )
}

async fn receive_loop(
    socket: UdpSocket,
    channel: FrameChannel,
    counters: Arc<Counters>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), ReceiverError> {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    let result = loop {
        tokio::select! {
            biased;

            changed = shutdown.changed() => {
                // Sender gone counts as a shutdown request
                if changed.is_err() || *shutdown.borrow() {
                    break Ok(());
                }
            }

            received = socket.recv_from(&mut buf) => {
                match received {
                    Ok((len, src)) => {
                        match decode_frame(&buf[..len]) {
                            Ok(frame) => {
                                trace!(src = %src, bytes = len, "Received landmark frame");
                                if channel.publish(frame) {
                                    counters.frames.fetch_add(1, Ordering::Relaxed);
                                }
                            }
                            Err(e) => {
                                counters.rejected.fetch_add(1, Ordering::Relaxed);
                                warn!(src = %src, bytes = len, error = %e, "Dropping invalid landmark datagram");
                            }
                        }
                        // Counted last so a reader that sees the count also sees the frame
                        counters.datagrams.fetch_add(1, Ordering::Release);
                    }
                    Err(e) if is_transient(&e) => {
                        counters.io_errors.fetch_add(1, Ordering::Relaxed);
                        warn!(error = %e, "Error receiving data");
                    }
                    Err(e) => {
                        counters.io_errors.fetch_add(1, Ordering::Relaxed);
                        error!(error = %e, "Fatal socket error, stopping receiver");
                        break Err(ReceiverError::Io(e));
                    }
                }
            }
        }
    };

    drop(socket);
    debug!("Landmark socket closed");
    result
}
