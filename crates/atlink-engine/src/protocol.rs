//! Response line parsing for `\r\n`-terminated AT replies.
//!
//! A reply body (everything after the echo) is a run of lines, each ending
//! in `\r\n`. Modules pad replies with blank lines freely (`\r\n\r\nOK\r\n`),
//! so empty lines carry no meaning and are dropped.

use atlink_core::is_final_status;

/// The two-byte line terminator.
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(LINE_TERMINATOR.len())
        .position(|w| w == LINE_TERMINATOR)
}

/// Split a reply body into its non-empty lines, in order.
///
/// A trailing fragment without a terminator is kept as the last line.
/// Bytes that are not valid UTF-8 are replaced rather than rejected.
///
/// ```
/// use atlink_engine::protocol::split_lines;
///
/// assert_eq!(split_lines(b"\r\n+NAME:MX01\r\n\r\nOK\r\n"), vec!["+NAME:MX01", "OK"]);
/// ```
pub fn split_lines(body: &[u8]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut rest = body;

    while !rest.is_empty() {
        let (line, next) = match find_terminator(rest) {
            Some(pos) => (&rest[..pos], &rest[pos + LINE_TERMINATOR.len()..]),
            None => (rest, &rest[rest.len()..]),
        };
        if !line.is_empty() {
            lines.push(String::from_utf8_lossy(line).into_owned());
        }
        rest = next;
    }

    lines
}

/// Returns `true` if `buf` ends with a complete final-status line
/// (`OK\r\n`, `ERROR\r\n`, ...).
pub fn ends_with_final_status(buf: &[u8]) -> bool {
    let Some(body) = buf.strip_suffix(LINE_TERMINATOR) else {
        return false;
    };
    let start = body
        .windows(LINE_TERMINATOR.len())
        .rposition(|w| w == LINE_TERMINATOR)
        .map_or(0, |pos| pos + LINE_TERMINATOR.len());

    std::str::from_utf8(&body[start..]).is_ok_and(is_final_status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_empty_body() {
        assert!(split_lines(b"").is_empty());
        assert!(split_lines(b"\r\n\r\n").is_empty());
    }

    #[test]
    fn split_single_status() {
        assert_eq!(split_lines(b"OK\r\n"), vec!["OK"]);
    }

    #[test]
    fn split_drops_embedded_empty_lines_and_keeps_order() {
        let body = b"STATE: IP STA\r\n\r\nIPADDR: 192.168.1.100\r\n\r\n\r\nRSSI: -69\r\n\r\nOK\r\n";
        assert_eq!(
            split_lines(body),
            vec!["STATE: IP STA", "IPADDR: 192.168.1.100", "RSSI: -69", "OK"]
        );
    }

    #[test]
    fn split_keeps_unterminated_tail() {
        assert_eq!(split_lines(b"OK\r\n+IPD,4:ab"), vec!["OK", "+IPD,4:ab"]);
    }

    #[test]
    fn split_lone_cr_or_lf_is_data() {
        // Only the CRLF pair terminates a line.
        assert_eq!(split_lines(b"a\rb\nc\r\n"), vec!["a\rb\nc"]);
    }

    #[test]
    fn split_non_utf8_is_replaced() {
        let lines = split_lines(&[0xFF, b'O', b'K', b'\r', b'\n']);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("OK"));
    }

    #[test]
    fn final_status_detection() {
        assert!(ends_with_final_status(b"OK\r\n"));
        assert!(ends_with_final_status(b"AT+RST\r\nERROR\r\n"));
        assert!(ends_with_final_status(b"AT+CIPSEND\r\n\r\nSEND OK\r\n"));
        assert!(!ends_with_final_status(b"AT\r\n"));
        assert!(!ends_with_final_status(b"AT\r\nOK"));
        assert!(!ends_with_final_status(b"+NAME:OK\r\n"));
        assert!(!ends_with_final_status(b""));
    }
}
