//! The AT transaction engine.
//!
//! [`TransactionEngine::transact`] runs one half-duplex exchange:
//!
//! ```text
//! Idle -> Sending -> Accumulating -> EchoChecking -> Parsing -> Complete
//!            \             \               \             \
//!             +-------------+---------------+-------------+-> Failed
//! ```
//!
//! The read phase runs on a spawned Tokio task. The frame buffer and the
//! lock guard over the device's transport are moved into that task. The
//! frame comes back only through the task's `JoinHandle`, so the engine
//! cannot look at it while the reader is still appending. The transport
//! goes back into its slot inside the task, so it is returned even when
//! the caller stops waiting.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;
use tracing::{debug, error, warn};

use atlink_core::error::{Error, Result};
use atlink_core::transport::Transport;
use atlink_core::{AtResponse, Command};

use crate::echo::{EchoMatch, EchoStrategy};
use crate::frame::{self, AccumulatorConfig, Accumulation, DEFAULT_FRAME_CAPACITY, FrameBuffer, StopCondition};
use crate::protocol;

/// Per-device engine settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How the module echoes commands.
    pub echo: EchoStrategy,
    /// Hard ceiling on one reply, echo included.
    pub frame_capacity: usize,
    /// Upper bound on a single read inside the accumulation loop.
    pub read_window: Duration,
    /// Whether accumulation may end before the deadline.
    pub stop: StopCondition,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            echo: EchoStrategy::ExactPrefix,
            frame_capacity: DEFAULT_FRAME_CAPACITY,
            read_window: Duration::from_millis(50),
            stop: StopCondition::Deadline,
        }
    }
}

/// Where a transaction is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionPhase {
    Idle,
    Sending,
    Accumulating,
    EchoChecking,
    Parsing,
    Complete,
    Failed,
}

impl TransactionPhase {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_advance_to(self, next: TransactionPhase) -> bool {
        use TransactionPhase::*;
        matches!(
            (self, next),
            (Idle, Sending)
                | (Sending, Accumulating)
                | (Accumulating, EchoChecking)
                | (EchoChecking, Parsing)
                | (Parsing, Complete)
                | (Sending | Accumulating | EchoChecking | Parsing, Failed)
                | (Complete | Failed, Idle)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TransactionPhase::Complete | TransactionPhase::Failed)
    }
}

/// Phase bookkeeping for one `transact` call.
struct PhaseTrace<'a> {
    command: &'a str,
    phase: TransactionPhase,
}

impl<'a> PhaseTrace<'a> {
    fn new(command: &'a Command) -> Self {
        PhaseTrace {
            command: command.text(),
            phase: TransactionPhase::Idle,
        }
    }

    fn advance(&mut self, next: TransactionPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal transaction phase transition {:?} -> {:?}",
            self.phase,
            next
        );
        debug!(command = self.command, from = ?self.phase, to = ?next, "transaction phase");
        self.phase = next;
    }

    fn fail(&mut self, err: Error) -> Error {
        self.advance(TransactionPhase::Failed);
        debug!(command = self.command, error = %err, "transaction failed");
        err
    }
}

/// A device's transport, shared with the reader task of the transaction
/// in flight. `None` once the device is closed.
pub type TransportSlot = Arc<Mutex<Option<Box<dyn Transport>>>>;

/// Create a slot holding `transport`.
pub fn transport_slot(transport: Box<dyn Transport>) -> TransportSlot {
    Arc::new(Mutex::new(Some(transport)))
}

/// Runs AT transactions for one device family.
///
/// The engine holds configuration only. The transport lives in a
/// [`TransportSlot`] owned by the device, and a transaction holds the
/// slot's lock from the write until the reader task is done.
#[derive(Debug, Clone, Default)]
pub struct TransactionEngine {
    config: EngineConfig,
}

impl TransactionEngine {
    pub fn new(config: EngineConfig) -> Self {
        TransactionEngine { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Write `command`, collect the reply until `timeout` elapses, strip
    /// the echo, and split the rest into lines.
    ///
    /// `slot` is the device's locked transport. The guard moves into the
    /// reader task together with the frame, and the task puts the transport
    /// back and releases the lock when it finishes. Dropping this future
    /// mid-read therefore leaves the device usable: the next transaction
    /// waits for the reader to reach its deadline. If the reader task
    /// panics the slot is left empty and later calls fail with
    /// [`Error::NotConnected`].
    ///
    /// Errors:
    /// - [`Error::Write`] if the command could not be written.
    /// - The transport's error if a read failed for a reason other than
    ///   a per-read timeout.
    /// - [`Error::Overflow`] if the reply outgrew the frame capacity.
    /// - [`Error::DeadlineExceeded`] if the echo, or anything after it,
    ///   had not arrived by the deadline.
    /// - [`Error::EchoMismatch`] if the reply did not start with the echo.
    pub async fn transact(
        &self,
        mut slot: OwnedMutexGuard<Option<Box<dyn Transport>>>,
        command: &Command,
        timeout: Duration,
    ) -> Result<AtResponse> {
        let mut phase = PhaseTrace::new(command);
        let transport = slot.as_mut().ok_or(Error::NotConnected)?;

        phase.advance(TransactionPhase::Sending);
        if let Err(e) = transport.send(command.as_bytes()).await {
            error!(command = %command, error = %e, "failed to write command");
            return Err(phase.fail(Error::Write(Box::new(e))));
        }

        phase.advance(TransactionPhase::Accumulating);
        let deadline = Instant::now() + timeout;
        let frame = FrameBuffer::with_capacity(self.config.frame_capacity);
        let config = AccumulatorConfig {
            read_window: self.config.read_window,
            stop: self.config.stop,
        };
        let reader = tokio::spawn(async move {
            let Some(transport) = slot.take() else {
                return (frame, Err(Error::NotConnected));
            };
            let Accumulation {
                transport,
                frame,
                outcome,
            } = frame::accumulate(transport, frame, deadline, config).await;
            *slot = Some(transport);
            (frame, outcome)
        });

        let (frame, outcome) = match reader.await {
            Ok(finished) => finished,
            Err(e) => {
                error!(command = %command, error = %e, "reader task failed, transport lost");
                return Err(phase.fail(Error::Transport(format!("reader task failed: {e}"))));
            }
        };

        if let Err(e) = outcome {
            return Err(phase.fail(e));
        }

        phase.advance(TransactionPhase::EchoChecking);
        let frame = frame.as_bytes();
        let body_start = match self.config.echo.match_echo(command, frame) {
            EchoMatch::Matched { body_start, .. } => body_start,
            EchoMatch::Incomplete => {
                return Err(phase.fail(Error::DeadlineExceeded {
                    collected: frame.len(),
                }));
            }
            EchoMatch::Mismatch => {
                let expected = self.config.echo.expected_echo(command);
                let shown = frame.len().min(expected.len().max(16));
                warn!(
                    command = %command,
                    received = ?String::from_utf8_lossy(&frame[..shown]),
                    "echo mismatch, line out of sync"
                );
                return Err(phase.fail(Error::EchoMismatch {
                    expected: String::from_utf8_lossy(&expected).into_owned(),
                    received: String::from_utf8_lossy(&frame[..shown]).into_owned(),
                }));
            }
        };

        phase.advance(TransactionPhase::Parsing);
        let lines = protocol::split_lines(&frame[body_start..]);
        if lines.is_empty() {
            return Err(phase.fail(Error::DeadlineExceeded {
                collected: frame.len(),
            }));
        }

        phase.advance(TransactionPhase::Complete);
        Ok(AtResponse::new(command.clone(), lines))
    }
}
