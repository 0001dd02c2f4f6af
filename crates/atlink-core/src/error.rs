//! Error types for atlink.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Every variant maps onto one
//! [`ErrorKind`], so operator tooling can decide whether to flush and
//! retry, reopen the port, or give up without matching on every variant.

/// The error type for all atlink operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The transport rejected or failed the outbound command write.
    ///
    /// Wraps the transport's own error. The transaction is abandoned;
    /// nothing is retried.
    #[error("write failed: {0}")]
    Write(#[source] Box<Error>),

    /// A transport-level error (serial port, USB adapter).
    #[error("transport error: {0}")]
    Transport(String),

    /// A single bounded read saw no data within its wait window.
    ///
    /// Transports return this from `receive()`. It is not a failure on its
    /// own: the accumulator keeps reading until the overall deadline.
    #[error("timeout waiting for data")]
    Timeout,

    /// The overall transaction deadline elapsed before a usable reply
    /// arrived. `collected` is how many bytes had been accumulated; they
    /// are discarded.
    #[error("deadline exceeded after collecting {collected} bytes")]
    DeadlineExceeded { collected: usize },

    /// The reply did not start with a recognizable echo of the command.
    ///
    /// Usually means stray output (a boot banner, a late reply to an
    /// earlier command) was still in the line. Flush and retry.
    #[error("echo mismatch: expected {expected:?}, received {received:?}")]
    EchoMismatch { expected: String, received: String },

    /// The module sent more bytes than the frame buffer can hold.
    #[error("response exceeded frame capacity of {capacity} bytes")]
    Overflow { capacity: usize },

    /// A protocol-level error: the reply was well formed but not what the
    /// command expects (an `ERROR` status, a missing field).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// An invalid parameter was passed to a command builder or builder.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// No connection to the module has been established, or it was closed.
    #[error("not connected")]
    NotConnected,

    /// The connection to the module was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The command could not be written.
    Write,
    /// The link itself failed: disconnected, closed, or an OS error.
    Transport,
    /// The module was too slow, or silent.
    DeadlineExceeded,
    /// The line is out of sync with the command stream.
    EchoMismatch,
    /// The reply was larger than the frame buffer.
    Overflow,
    /// The reply was understood but rejected or unexpected.
    Protocol,
    /// The caller supplied a bad argument.
    InvalidParameter,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Write(_) => ErrorKind::Write,
            Error::Transport(_)
            | Error::NotConnected
            | Error::ConnectionLost
            | Error::Io(_) => ErrorKind::Transport,
            Error::Timeout | Error::DeadlineExceeded { .. } => ErrorKind::DeadlineExceeded,
            Error::EchoMismatch { .. } => ErrorKind::EchoMismatch,
            Error::Overflow { .. } => ErrorKind::Overflow,
            Error::Protocol(_) => ErrorKind::Protocol,
            Error::InvalidParameter(_) => ErrorKind::InvalidParameter,
        }
    }

    /// Whether flushing the line and retrying the same command has a
    /// reasonable chance of succeeding.
    pub fn is_retryable_after_flush(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::EchoMismatch | ErrorKind::DeadlineExceeded | ErrorKind::Overflow
        )
    }
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_write_wraps_cause() {
        let e = Error::Write(Box::new(Error::ConnectionLost));
        assert_eq!(e.to_string(), "write failed: connection lost");
        assert!(std::error::Error::source(&e).is_some());
    }

    #[test]
    fn error_display_transport() {
        let e = Error::Transport("port busy".into());
        assert_eq!(e.to_string(), "transport error: port busy");
    }

    #[test]
    fn error_display_deadline_exceeded() {
        let e = Error::DeadlineExceeded { collected: 3 };
        assert_eq!(e.to_string(), "deadline exceeded after collecting 3 bytes");
    }

    #[test]
    fn error_display_echo_mismatch() {
        let e = Error::EchoMismatch {
            expected: "AT\r\n".into(),
            received: "ready".into(),
        };
        assert_eq!(
            e.to_string(),
            "echo mismatch: expected \"AT\\r\\n\", received \"ready\""
        );
    }

    #[test]
    fn error_display_overflow() {
        let e = Error::Overflow { capacity: 256 };
        assert_eq!(e.to_string(), "response exceeded frame capacity of 256 bytes");
    }

    #[test]
    fn error_display_invalid_parameter() {
        let e = Error::InvalidParameter("uart index 7 out of range 0..=5".into());
        assert_eq!(
            e.to_string(),
            "invalid parameter: uart index 7 out of range 0..=5"
        );
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broken");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
        assert!(e.to_string().contains("pipe broken"));
    }

    #[test]
    fn kinds_are_distinct_per_failure_class() {
        assert_eq!(Error::Write(Box::new(Error::Timeout)).kind(), ErrorKind::Write);
        assert_eq!(Error::ConnectionLost.kind(), ErrorKind::Transport);
        assert_eq!(Error::NotConnected.kind(), ErrorKind::Transport);
        assert_eq!(
            Error::DeadlineExceeded { collected: 0 }.kind(),
            ErrorKind::DeadlineExceeded
        );
        assert_eq!(
            Error::EchoMismatch {
                expected: String::new(),
                received: String::new()
            }
            .kind(),
            ErrorKind::EchoMismatch
        );
        assert_eq!(Error::Overflow { capacity: 1 }.kind(), ErrorKind::Overflow);
        assert_eq!(Error::Protocol("x".into()).kind(), ErrorKind::Protocol);
    }

    #[test]
    fn retryable_after_flush() {
        assert!(
            Error::EchoMismatch {
                expected: String::new(),
                received: String::new()
            }
            .is_retryable_after_flush()
        );
        assert!(Error::DeadlineExceeded { collected: 0 }.is_retryable_after_flush());
        assert!(!Error::ConnectionLost.is_retryable_after_flush());
        assert!(!Error::Write(Box::new(Error::ConnectionLost)).is_retryable_after_flush());
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
