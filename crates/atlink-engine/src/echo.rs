//! Echo strategies: recognizing the module's repetition of the command.
//!
//! AT firmware prepends an echo to every reply, but vendors disagree on
//! what that echo looks like:
//!
//! - Espressif firmware (ESP32, ESP8266) with `ATE1` repeats the command
//!   byte for byte, terminator included: `AT+GMR\r\n` comes back as
//!   `AT+GMR\r\n<lines>OK\r\n`.
//! - MX01 BLE modules answer a query with the field name instead of the
//!   command: `AT+NAME?\r\n` comes back as `+NAME:MX01\r\nOK\r\n`. The
//!   field name is the command minus its `AT` prefix, `?` suffix, and
//!   terminator, and it stays part of the first response line.
//!
//! Field names are compared without regard to ASCII case, so `at+name?`
//! accepts `+NAME:`. Otherwise matching is strict: a frame either starts
//! with the expected echo, is still too short to tell, or is out of sync.

use atlink_core::Command;

/// Separator between the echoed field name and its value (`+NAME:MX01`).
pub const DEFAULT_FIELD_SEPARATOR: u8 = b':';

/// How a device family echoes commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EchoStrategy {
    /// The echo is the exact command bytes, terminator included.
    #[default]
    ExactPrefix,
    /// Queries are echoed as `<field><separator>`; other commands are not
    /// echoed at all.
    FieldEcho {
        /// Byte that follows the echoed field name.
        separator: u8,
    },
}

/// Outcome of matching a frame against the expected echo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoMatch {
    /// The frame starts with the echo.
    Matched {
        /// Length of the echo in bytes.
        echo_len: usize,
        /// Offset where the response body starts.
        body_start: usize,
    },
    /// The frame is a strict prefix of the echo (or empty): the module has
    /// not finished echoing yet.
    Incomplete,
    /// The frame does not start with the echo.
    Mismatch,
}

/// The field name a field-echo module repeats for a query command.
///
/// Returns `None` for commands that are not queries, and for the bare
/// `AT?` which names no field.
///
/// ```
/// use atlink_core::Command;
/// use atlink_engine::echo::echo_field;
///
/// assert_eq!(echo_field(&Command::new("AT+NAME?")), Some("+NAME"));
/// assert_eq!(echo_field(&Command::new("AT+NAME=beacon")), None);
/// ```
pub fn echo_field(command: &Command) -> Option<&str> {
    let query = command.text().strip_suffix('?')?;
    let field = match query.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("AT") => &query[2..],
        _ => query,
    };
    (!field.is_empty()).then_some(field)
}

impl EchoStrategy {
    /// Field echo with the usual `:` separator.
    pub const fn field_echo() -> Self {
        EchoStrategy::FieldEcho {
            separator: DEFAULT_FIELD_SEPARATOR,
        }
    }

    /// The bytes this strategy expects at the front of the frame.
    ///
    /// Empty when the strategy expects no echo for `command`.
    pub fn expected_echo(&self, command: &Command) -> Vec<u8> {
        match *self {
            EchoStrategy::ExactPrefix => command.as_bytes().to_vec(),
            EchoStrategy::FieldEcho { separator } => match echo_field(command) {
                Some(field) => {
                    let mut echo = Vec::with_capacity(field.len() + 1);
                    echo.extend_from_slice(field.as_bytes());
                    echo.push(separator);
                    echo
                }
                None => Vec::new(),
            },
        }
    }

    /// Match `frame` against the echo expected for `command`.
    pub fn match_echo(&self, command: &Command, frame: &[u8]) -> EchoMatch {
        let expected = self.expected_echo(command);
        let same = |a: &[u8], b: &[u8]| match self {
            EchoStrategy::ExactPrefix => a == b,
            // Firmware reports field names in upper case whatever the query used.
            EchoStrategy::FieldEcho { .. } => a.eq_ignore_ascii_case(b),
        };

        if frame.len() < expected.len() {
            return if same(&expected[..frame.len()], frame) {
                EchoMatch::Incomplete
            } else {
                EchoMatch::Mismatch
            };
        }
        if !same(&frame[..expected.len()], &expected) {
            return EchoMatch::Mismatch;
        }

        let body_start = match self {
            EchoStrategy::ExactPrefix => expected.len(),
            // The field name belongs to the value line.
            EchoStrategy::FieldEcho { .. } => 0,
        };
        EchoMatch::Matched {
            echo_len: expected.len(),
            body_start,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_prefix_matches_full_echo() {
        let cmd = Command::new("AT+UART=2");
        let m = EchoStrategy::ExactPrefix.match_echo(&cmd, b"AT+UART=2\r\nOK\r\n");
        assert_eq!(
            m,
            EchoMatch::Matched {
                echo_len: 11,
                body_start: 11
            }
        );
    }

    #[test]
    fn exact_prefix_requires_terminator() {
        let cmd = Command::new("AT");
        assert_eq!(
            EchoStrategy::ExactPrefix.match_echo(&cmd, b"AT\rXOK\r\n"),
            EchoMatch::Mismatch
        );
    }

    #[test]
    fn exact_prefix_partial_echo_is_incomplete() {
        let cmd = Command::new("AT+GMR");
        assert_eq!(
            EchoStrategy::ExactPrefix.match_echo(&cmd, b"AT+G"),
            EchoMatch::Incomplete
        );
        assert_eq!(
            EchoStrategy::ExactPrefix.match_echo(&cmd, b""),
            EchoMatch::Incomplete
        );
    }

    #[test]
    fn exact_prefix_stray_output_is_mismatch() {
        let cmd = Command::new("AT");
        assert_eq!(
            EchoStrategy::ExactPrefix.match_echo(&cmd, b"ready\r\nAT\r\nOK\r\n"),
            EchoMatch::Mismatch
        );
        // Short and already wrong.
        assert_eq!(
            EchoStrategy::ExactPrefix.match_echo(&cmd, b"r"),
            EchoMatch::Mismatch
        );
    }

    #[test]
    fn echo_field_normalization() {
        assert_eq!(echo_field(&Command::new("AT+MAC?")), Some("+MAC"));
        assert_eq!(echo_field(&Command::new("at+ver?")), Some("+ver"));
        assert_eq!(echo_field(&Command::new("AT?")), None);
        assert_eq!(echo_field(&Command::new("AT+REBOOT=1")), None);
        assert_eq!(echo_field(&Command::new("AT")), None);
    }

    #[test]
    fn field_echo_accepts_reshaped_echo() {
        let cmd = Command::new("AT+NAME?");
        let m = EchoStrategy::field_echo().match_echo(&cmd, b"+NAME:MX01\r\nOK\r\n");
        assert_eq!(
            m,
            EchoMatch::Matched {
                echo_len: 6,
                body_start: 0
            }
        );
    }

    #[test]
    fn field_echo_rejects_literal_echo() {
        let cmd = Command::new("AT+NAME?");
        assert_eq!(
            EchoStrategy::field_echo().match_echo(&cmd, b"AT+NAME?\r\n+NAME:MX01\r\n"),
            EchoMatch::Mismatch
        );
    }

    #[test]
    fn field_echo_requires_separator() {
        let cmd = Command::new("AT+NAME?");
        assert_eq!(
            EchoStrategy::field_echo().match_echo(&cmd, b"+NAMES:x\r\n"),
            EchoMatch::Mismatch
        );
        assert_eq!(
            EchoStrategy::field_echo().match_echo(&cmd, b"+NAM"),
            EchoMatch::Incomplete
        );
    }

    #[test]
    fn field_echo_custom_separator() {
        let strategy = EchoStrategy::FieldEcho { separator: b'=' };
        let cmd = Command::new("AT+UART?");
        assert!(matches!(
            strategy.match_echo(&cmd, b"+UART=0\r\nOK\r\n"),
            EchoMatch::Matched { .. }
        ));
    }

    #[test]
    fn field_echo_set_command_has_no_echo() {
        let cmd = Command::new("AT+ADV=1");
        assert_eq!(
            EchoStrategy::field_echo().match_echo(&cmd, b"OK\r\n"),
            EchoMatch::Matched {
                echo_len: 0,
                body_start: 0
            }
        );
        assert!(EchoStrategy::field_echo().expected_echo(&cmd).is_empty());
    }

    #[test]
    fn field_echo_ignores_query_case() {
        let cmd = Command::new("at+name?");
        assert_eq!(
            EchoStrategy::field_echo().match_echo(&cmd, b"+NAME:MX01\r\nOK\r\n"),
            EchoMatch::Matched {
                echo_len: 6,
                body_start: 0
            }
        );
        assert_eq!(
            EchoStrategy::field_echo().match_echo(&cmd, b"+NA"),
            EchoMatch::Incomplete
        );
        // Exact echo stays case-sensitive.
        assert_eq!(
            EchoStrategy::ExactPrefix.match_echo(&Command::new("at"), b"AT\r\nOK\r\n"),
            EchoMatch::Mismatch
        );
    }
}
