//! Frame accumulation: growing one reply across many bounded reads.
//!
//! Modules emit a reply in several UART bursts with gaps between them, and
//! a gap can be longer than a single read window. The accumulator
//! therefore keeps two timeouts apart: a read that sees nothing within its
//! window is normal and the loop just reads again, while the transaction
//! deadline is what ends accumulation. Any other read failure aborts at
//! once.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use atlink_core::error::{Error, Result};
use atlink_core::transport::Transport;

use crate::protocol;

/// Default frame capacity. Compliant modules stay under 256 bytes per
/// reply, echo included.
pub const DEFAULT_FRAME_CAPACITY: usize = 256;

/// Size of the scratch buffer handed to each `receive()` call.
const READ_CHUNK: usize = 256;

/// Pause after a zero-length read so the loop never spins.
const EMPTY_READ_BACKOFF: Duration = Duration::from_millis(10);

/// A growable byte buffer with a hard capacity.
///
/// Bytes are appended in read order. Appending past capacity fails with
/// [`Error::Overflow`] and leaves the buffer unchanged.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    buf: BytesMut,
    capacity: usize,
}

impl FrameBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        FrameBuffer {
            buf: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `data`, or fail with [`Error::Overflow`] if it does not fit.
    pub fn extend(&mut self, data: &[u8]) -> Result<()> {
        if data.len() > self.remaining() {
            return Err(Error::Overflow {
                capacity: self.capacity,
            });
        }
        self.buf.extend_from_slice(data);
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes that can still be appended.
    pub fn remaining(&self) -> usize {
        self.capacity - self.buf.len()
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

/// When accumulation may end before the deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopCondition {
    /// Read until the deadline, whatever arrives.
    #[default]
    Deadline,
    /// Also stop once the frame ends with a complete final-status line.
    FinalStatus,
}

/// Read-loop settings for one transaction.
#[derive(Debug, Clone, Copy)]
pub struct AccumulatorConfig {
    /// Upper bound on a single `receive()` wait.
    pub read_window: Duration,
    pub stop: StopCondition,
}

/// Why accumulation ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    DeadlineReached,
    StopConditionMet,
}

/// Everything the reader hands back when it finishes.
///
/// The reader owns the transport and the frame for the whole read phase;
/// this struct is how both get back to the caller.
pub struct Accumulation {
    pub transport: Box<dyn Transport>,
    pub frame: FrameBuffer,
    pub outcome: Result<Completion>,
}

/// Read from `transport` into `frame` until `deadline`.
///
/// Each read waits at most `read_window`, clipped to the time left. A read
/// that times out or returns zero bytes is not an error. Overflow and
/// non-timeout read errors end the loop immediately.
pub async fn accumulate(
    mut transport: Box<dyn Transport>,
    mut frame: FrameBuffer,
    deadline: Instant,
    config: AccumulatorConfig,
) -> Accumulation {
    let mut recv_buf = [0u8; READ_CHUNK];

    let outcome = loop {
        let now = Instant::now();
        if now >= deadline {
            break Ok(Completion::DeadlineReached);
        }
        let window = config.read_window.min(deadline - now);

        match transport.receive(&mut recv_buf, window).await {
            Ok(0) => {
                let left = deadline.saturating_duration_since(Instant::now());
                tokio::time::sleep(EMPTY_READ_BACKOFF.min(left)).await;
            }
            Ok(n) => {
                if let Err(e) = frame.extend(&recv_buf[..n]) {
                    warn!(
                        len = frame.len(),
                        incoming = n,
                        capacity = frame.capacity(),
                        "frame buffer overflow"
                    );
                    break Err(e);
                }
                trace!(bytes = n, total = frame.len(), "accumulated");

                if config.stop == StopCondition::FinalStatus
                    && protocol::ends_with_final_status(frame.as_bytes())
                {
                    break Ok(Completion::StopConditionMet);
                }
            }
            Err(Error::Timeout) => {
                trace!(window_ms = window.as_millis(), "read window elapsed without data");
            }
            Err(e) => {
                debug!(error = %e, collected = frame.len(), "read failed, aborting accumulation");
                break Err(e);
            }
        }
    };

    Accumulation {
        transport,
        frame,
        outcome,
    }
}

/// Discard whatever the module has queued.
///
/// Reads with `read_timeout` until a read comes back empty or times out,
/// but never for longer than `budget` in total. Returns the number of
/// bytes thrown away.
pub async fn drain(
    transport: &mut dyn Transport,
    read_timeout: Duration,
    budget: Duration,
) -> Result<usize> {
    let deadline = Instant::now() + budget;
    let mut recv_buf = [0u8; READ_CHUNK];
    let mut discarded = 0;

    loop {
        let now = Instant::now();
        if now >= deadline {
            warn!(discarded, "line still busy when flush budget ran out");
            return Ok(discarded);
        }

        match transport
            .receive(&mut recv_buf, read_timeout.min(deadline - now))
            .await
        {
            Ok(0) | Err(Error::Timeout) => return Ok(discarded),
            Ok(n) => {
                trace!(
                    bytes = n,
                    data = ?String::from_utf8_lossy(&recv_buf[..n]),
                    "flushed"
                );
                discarded += n;
            }
            Err(e) => return Err(e),
        }
    }
}
