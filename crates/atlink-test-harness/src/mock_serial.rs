//! Mock transport for deterministic testing of the AT transaction engine.
//!
//! [`MockTransport`] implements the [`Transport`] trait with pre-loaded
//! request/reply pairs. Each reply is a [`Reply`] script: byte chunks that
//! become readable after a delay, zero-length reads, and disconnects. That
//! is enough to reproduce what real modules do on a UART: replies split
//! across bursts, gaps longer than one read window, boot banners arriving
//! before the first command.
//!
//! Delays are implemented with `tokio::time::sleep`, so tests that run on a
//! paused clock (`#[tokio::test(start_paused = true)]`) execute instantly
//! and deterministically.
//!
//! # Example
//!
//! ```
//! use atlink_test_harness::{MockTransport, Reply};
//! use std::time::Duration;
//!
//! let mut mock = MockTransport::new();
//! // When the engine sends `AT+GMR`, answer in two bursts 20ms apart.
//! mock.expect(
//!     b"AT+GMR\r\n",
//!     Reply::new()
//!         .chunk(b"AT+GMR\r\nAT version:2.4.0.0\r\n")
//!         .chunk_after(Duration::from_millis(20), b"OK\r\n"),
//! );
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;

use atlink_core::error::{Error, Result};
use atlink_core::transport::Transport;

/// One scripted event on the receive side.
#[derive(Debug, Clone)]
enum Step {
    /// `data` becomes readable once `delay` has passed.
    Bytes { delay: Duration, data: Vec<u8> },
    /// A read that returns `Ok(0)` once `delay` has passed.
    Empty { delay: Duration },
    /// The link drops once `delay` has passed.
    Disconnect { delay: Duration },
}

impl Step {
    fn delay_mut(&mut self) -> &mut Duration {
        match self {
            Step::Bytes { delay, .. } | Step::Empty { delay } | Step::Disconnect { delay } => delay,
        }
    }
}

/// A scripted reply: what the "module" sends back after a command.
///
/// Delays are relative to the previous step, mirroring gaps between UART
/// bursts.
#[derive(Debug, Clone, Default)]
pub struct Reply {
    steps: Vec<Step>,
}

impl Reply {
    /// An empty reply: the module stays silent.
    pub fn new() -> Self {
        Reply::default()
    }

    /// A reply delivered as a single immediate chunk.
    pub fn bytes(data: &[u8]) -> Self {
        Reply::new().chunk(data)
    }

    /// Append a chunk that is readable immediately.
    pub fn chunk(self, data: &[u8]) -> Self {
        self.chunk_after(Duration::ZERO, data)
    }

    /// Append a chunk that becomes readable `delay` after the previous step.
    pub fn chunk_after(mut self, delay: Duration, data: &[u8]) -> Self {
        self.steps.push(Step::Bytes {
            delay,
            data: data.to_vec(),
        });
        self
    }

    /// Append a read that returns zero bytes.
    pub fn empty_read_after(mut self, delay: Duration) -> Self {
        self.steps.push(Step::Empty { delay });
        self
    }

    /// Append a disconnect: the next read after `delay` fails with
    /// [`Error::ConnectionLost`] and the transport stays disconnected.
    pub fn disconnect_after(mut self, delay: Duration) -> Self {
        self.steps.push(Step::Disconnect { delay });
        self
    }

    /// Split `frame` into chunks at the given byte offsets, with `gap`
    /// between consecutive chunks.
    ///
    /// Offsets outside `1..frame.len()` and duplicates are ignored.
    pub fn split(frame: &[u8], cuts: &[usize], gap: Duration) -> Self {
        let mut cuts: Vec<usize> = cuts
            .iter()
            .copied()
            .filter(|&c| c > 0 && c < frame.len())
            .collect();
        cuts.sort_unstable();
        cuts.dedup();

        let mut reply = Reply::new();
        let mut start = 0;
        for end in cuts.into_iter().chain(std::iter::once(frame.len())) {
            let delay = if start == 0 { Duration::ZERO } else { gap };
            reply = reply.chunk_after(delay, &frame[start..end]);
            start = end;
        }
        reply
    }

    /// Total number of bytes this reply delivers.
    pub fn total_bytes(&self) -> usize {
        self.steps
            .iter()
            .map(|s| match s {
                Step::Bytes { data, .. } => data.len(),
                _ => 0,
            })
            .sum()
    }
}

/// A pre-loaded request/reply pair.
#[derive(Debug, Clone)]
struct Expectation {
    /// The exact bytes we expect to be sent.
    request: Vec<u8>,
    /// What the module answers.
    reply: Reply,
}

/// A mock [`Transport`] for testing without hardware.
///
/// Expectations are consumed in order. When `send()` is called, the sent
/// data is recorded and matched against the next expectation; its reply
/// steps are appended to the receive queue. Anything still queued from an
/// earlier reply stays there, just like unread bytes in a UART FIFO.
///
/// With nothing queued, `receive()` waits for its full timeout and returns
/// [`Error::Timeout`], as a real serial port does.
#[derive(Debug)]
pub struct MockTransport {
    expectations: VecDeque<Expectation>,
    /// Receive-side script, front is next.
    pending: VecDeque<Step>,
    connected: bool,
    /// Log of all bytes sent through this transport.
    sent_log: Vec<Vec<u8>>,
    fail_next_send: bool,
    receive_calls: usize,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            expectations: VecDeque::new(),
            pending: VecDeque::new(),
            connected: true,
            sent_log: Vec::new(),
            fail_next_send: false,
            receive_calls: 0,
        }
    }

    /// Add an expected request and the reply to play back after it.
    pub fn expect(&mut self, request: &[u8], reply: Reply) {
        self.expectations.push_back(Expectation {
            request: request.to_vec(),
            reply,
        });
    }

    /// Queue bytes that are readable without any command, such as a boot
    /// banner or a late reply.
    pub fn push_unsolicited(&mut self, reply: Reply) {
        self.pending.extend(reply.steps);
    }

    /// Make the next `send()` fail with [`Error::Transport`].
    pub fn fail_next_send(&mut self) {
        self.fail_next_send = true;
    }

    /// Return a reference to all data that has been sent through this transport.
    ///
    /// Each element is the byte slice from one `send()` call.
    pub fn sent_data(&self) -> &[Vec<u8>] {
        &self.sent_log
    }

    /// Return the number of expectations that have not yet been consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.expectations.len()
    }

    /// Bytes still queued on the receive side.
    pub fn pending_bytes(&self) -> usize {
        self.pending
            .iter()
            .map(|s| match s {
                Step::Bytes { data, .. } => data.len(),
                _ => 0,
            })
            .sum()
    }

    /// Number of `receive()` calls made so far.
    pub fn receive_calls(&self) -> usize {
        self.receive_calls
    }

    /// Set the connected state of the mock transport.
    ///
    /// When set to `false`, subsequent `send()` and `receive()` calls will
    /// return [`Error::NotConnected`].
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        self.sent_log.push(data.to_vec());

        if self.fail_next_send {
            self.fail_next_send = false;
            return Err(Error::Transport("injected write failure".into()));
        }

        match self.expectations.pop_front() {
            Some(expectation) if data == expectation.request.as_slice() => {
                self.pending.extend(expectation.reply.steps);
                Ok(())
            }
            Some(expectation) => Err(Error::Protocol(format!(
                "unexpected send data: expected {:?}, got {:?}",
                String::from_utf8_lossy(&expectation.request),
                String::from_utf8_lossy(data)
            ))),
            None => Err(Error::Protocol(
                "no more expectations in mock transport".into(),
            )),
        }
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        self.receive_calls += 1;

        let wait = match self.pending.front_mut() {
            None => {
                tokio::time::sleep(timeout).await;
                return Err(Error::Timeout);
            }
            Some(step) => {
                let delay = step.delay_mut();
                if *delay > timeout {
                    // Not ready within this read's window.
                    *delay -= timeout;
                    None
                } else {
                    Some(std::mem::take(delay))
                }
            }
        };

        let Some(wait) = wait else {
            tokio::time::sleep(timeout).await;
            return Err(Error::Timeout);
        };
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }

        match self.pending.pop_front() {
            Some(Step::Bytes { mut data, .. }) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    data.drain(..n);
                    self.pending.push_front(Step::Bytes {
                        delay: Duration::ZERO,
                        data,
                    });
                }
                Ok(n)
            }
            Some(Step::Empty { .. }) => Ok(0),
            Some(Step::Disconnect { .. }) => {
                self.pending.clear();
                self.connected = false;
                Err(Error::ConnectionLost)
            }
            None => Err(Error::Timeout),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = false;
        self.pending.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
