//! AT command catalog.
//!
//! Each vendor module has pure command builders (returning a
//! [`Command`](atlink_core::Command), or [`Error::InvalidParameter`] when
//! an argument is out of range), pure response interpreters working on an
//! [`AtResponse`], and thin async helpers that run one transaction on an
//! [`AtDevice`](crate::AtDevice) and interpret the result.

pub mod espressif;
pub mod mx01;

use atlink_core::error::{Error, Result};
use atlink_core::AtResponse;

/// Succeeds when the reply ends in `OK`.
///
/// Any other ending is a [`Error::Protocol`] naming the command and the
/// lines received.
pub fn expect_ok(resp: &AtResponse) -> Result<()> {
    if resp.is_ok() {
        Ok(())
    } else {
        Err(Error::Protocol(format!(
            "{} failed: {:?}",
            resp.command, resp.lines
        )))
    }
}

/// `true` if `s` is non-empty and every byte is an ASCII hex digit.
pub(crate) fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlink_core::Command;

    fn response(lines: &[&str]) -> AtResponse {
        AtResponse::new(
            Command::new("AT"),
            lines.iter().map(|l| l.to_string()).collect(),
        )
    }

    #[test]
    fn expect_ok_accepts_trailing_ok() {
        assert!(expect_ok(&response(&["OK"])).is_ok());
        assert!(expect_ok(&response(&["+NAME:MX01", "OK"])).is_ok());
    }

    #[test]
    fn expect_ok_rejects_error_and_missing_status() {
        assert!(matches!(expect_ok(&response(&["ERROR"])), Err(Error::Protocol(_))));
        assert!(matches!(expect_ok(&response(&["busy p..."])), Err(Error::Protocol(_))));
        assert!(matches!(expect_ok(&response(&["OK", "ERROR"])), Err(Error::Protocol(_))));
    }

    #[test]
    fn hex_check() {
        assert!(is_hex("00a0FF"));
        assert!(!is_hex(""));
        assert!(!is_hex("0x12"));
    }
}
