//! Command and response types shared by the engine and device drivers.

use std::fmt;

/// Line terminator used by AT modules in both directions.
pub const LINE_TERMINATOR: &str = "\r\n";

/// Lines that conventionally end an AT reply.
pub const FINAL_STATUS_LINES: &[&str] = &["OK", "ERROR", "FAIL", "SEND OK"];

/// Returns `true` if `line` is one of the [`FINAL_STATUS_LINES`].
pub fn is_final_status(line: &str) -> bool {
    FINAL_STATUS_LINES.contains(&line)
}

/// An AT command in its exact wire form, terminator included.
///
/// Immutable once built. The engine writes [`as_bytes()`](Self::as_bytes)
/// verbatim and uses the same bytes to recognize the module's echo.
///
/// ```
/// use atlink_core::Command;
///
/// let cmd = Command::new("AT+UART=2");
/// assert_eq!(cmd.as_bytes(), b"AT+UART=2\r\n");
/// assert_eq!(cmd.text(), "AT+UART=2");
/// assert!(!cmd.is_query());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command {
    wire: String,
}

impl Command {
    /// Build a command, appending `"\r\n"` unless `text` already ends with it.
    pub fn new(text: impl Into<String>) -> Self {
        let mut wire = text.into();
        if !wire.ends_with(LINE_TERMINATOR) {
            wire.push_str(LINE_TERMINATOR);
        }
        Command { wire }
    }

    /// The bytes written to the transport.
    pub fn as_bytes(&self) -> &[u8] {
        self.wire.as_bytes()
    }

    /// The wire form as a string, terminator included.
    pub fn as_str(&self) -> &str {
        &self.wire
    }

    /// The command text without its terminator.
    pub fn text(&self) -> &str {
        self.wire
            .strip_suffix(LINE_TERMINATOR)
            .unwrap_or(&self.wire)
    }

    /// Length of the wire form in bytes.
    pub fn len(&self) -> usize {
        self.wire.len()
    }

    /// `true` only for a command that is nothing but a terminator.
    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }

    /// Whether this is a query (`AT+NAME?`).
    pub fn is_query(&self) -> bool {
        self.text().ends_with('?')
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl From<&str> for Command {
    fn from(text: &str) -> Self {
        Command::new(text)
    }
}

impl From<String> for Command {
    fn from(text: String) -> Self {
        Command::new(text)
    }
}

/// The structured reply to one command.
///
/// `lines` holds every non-empty line that followed the echo, in the order
/// the module sent them. The last line is usually the status (`OK`,
/// `ERROR`); what it means for a particular command is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtResponse {
    /// The command this is a reply to.
    pub command: Command,
    /// Non-empty response lines in arrival order.
    pub lines: Vec<String>,
}

impl AtResponse {
    pub fn new(command: Command, lines: Vec<String>) -> Self {
        AtResponse { command, lines }
    }

    /// The final status line, if the reply ended with one.
    pub fn status(&self) -> Option<&str> {
        self.lines
            .last()
            .map(String::as_str)
            .filter(|line| is_final_status(line))
    }

    /// `true` if the reply ended with `OK`.
    pub fn is_ok(&self) -> bool {
        self.status() == Some("OK")
    }

    /// The lines before the final status line (all lines if there is none).
    pub fn data_lines(&self) -> &[String] {
        match self.status() {
            Some(_) => &self.lines[..self.lines.len() - 1],
            None => &self.lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_appends_terminator() {
        let cmd = Command::new("AT");
        assert_eq!(cmd.as_str(), "AT\r\n");
        assert_eq!(cmd.len(), 4);
    }

    #[test]
    fn command_keeps_existing_terminator() {
        let cmd = Command::new("AT+NAME?\r\n");
        assert_eq!(cmd.as_bytes(), b"AT+NAME?\r\n");
        assert_eq!(cmd.text(), "AT+NAME?");
        assert!(cmd.is_query());
    }

    #[test]
    fn command_display_omits_terminator() {
        assert_eq!(Command::new("AT+GMR").to_string(), "AT+GMR");
    }

    #[test]
    fn empty_command() {
        assert!(Command::new("").is_empty());
        assert!(!Command::new("AT").is_empty());
    }

    #[test]
    fn response_status_and_data() {
        let resp = AtResponse::new(
            Command::new("AT+GMR"),
            vec!["AT version:2.4.0.0".into(), "OK".into()],
        );
        assert_eq!(resp.status(), Some("OK"));
        assert!(resp.is_ok());
        assert_eq!(resp.data_lines(), &["AT version:2.4.0.0".to_string()]);
    }

    #[test]
    fn response_without_status() {
        let resp = AtResponse::new(Command::new("AT+NAME?"), vec!["+NAME:MX01".into()]);
        assert_eq!(resp.status(), None);
        assert!(!resp.is_ok());
        assert_eq!(resp.data_lines().len(), 1);
    }

    #[test]
    fn response_error_status() {
        let resp = AtResponse::new(Command::new("AT+X"), vec!["ERROR".into()]);
        assert_eq!(resp.status(), Some("ERROR"));
        assert!(!resp.is_ok());
        assert!(resp.data_lines().is_empty());
    }
}
