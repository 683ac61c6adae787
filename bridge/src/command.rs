//! # Command Parsing & Dispatch
//!
//! One BLE write carries one text command. Commands are parsed once into a
//! tagged [`Command`] variant, then dispatch is a total function over the
//! variant set: valid commands are forwarded verbatim (newline-terminated) to
//! the wired transport, invalid ones are rejected with a descriptive string
//! notified back to every connected central.
//!
//! ## Command Set
//!
//! | Input                          | Result                                   |
//! |--------------------------------|------------------------------------------|
//! | `FORWARD…` / `STOP…` / `REVERSE…` | forwarded as-is                       |
//! | `SPEED n` with n in 1..=9      | forwarded as-is                          |
//! | `STATE` (exact)                | `STATE\n` forwarded                      |
//! | malformed `SPEED`              | `"Invalid SPEED command. Use: SPEED x (1–9)"` |
//! | anything else                  | `"Unknown command."`                     |
//!
//! Matching is case-sensitive prefix matching, first match wins.

use core::str;

use embedded_io::Write;

use crate::session::SessionManager;
use crate::traits::{BridgeError, Radio};

/// A validated inbound command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command<'a> {
    /// `FORWARD`/`STOP`/`REVERSE` motion command, forwarded verbatim
    Motion(&'a str),
    /// `SPEED n` with the parsed speed value
    Speed { line: &'a str, value: u8 },
    /// Exact `STATE` query
    Query,
}

/// Rejection reasons for inbound commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// `SPEED` without exactly one integer argument in 1..=9
    InvalidSpeed,
    /// Unrecognized command prefix (or a non-text write)
    Unknown,
}

impl CommandError {
    /// The exact text notified back to the controller on rejection
    pub const fn rejection_text(&self) -> &'static str {
        match self {
            Self::InvalidSpeed => "Invalid SPEED command. Use: SPEED x (1–9)",
            Self::Unknown => "Unknown command.",
        }
    }
}

impl<'a> Command<'a> {
    /// Parse one trimmed command line. First match wins.
    pub fn parse(line: &'a str) -> Result<Self, CommandError> {
        if line.starts_with("FORWARD") || line.starts_with("STOP") || line.starts_with("REVERSE") {
            return Ok(Self::Motion(line));
        }
        if line.starts_with("SPEED") {
            let mut parts = line.split_whitespace();
            let (Some(_), Some(arg), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err(CommandError::InvalidSpeed);
            };
            // digits only; `parse` alone would also take a leading sign
            if !arg.bytes().all(|b| b.is_ascii_digit()) {
                return Err(CommandError::InvalidSpeed);
            }
            let value = arg
                .parse::<u8>()
                .ok()
                .filter(|v| (1..=9).contains(v))
                .ok_or(CommandError::InvalidSpeed)?;
            return Ok(Self::Speed { line, value });
        }
        if line == "STATE" {
            return Ok(Self::Query);
        }
        Err(CommandError::Unknown)
    }

    /// The line written to the wired transport (newline appended by dispatch)
    pub fn wire_line(&self) -> &str {
        match self {
            Self::Motion(line) => line,
            Self::Speed { line, .. } => line,
            Self::Query => "STATE",
        }
    }
}

/// Outcome of dispatching one inbound write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dispatch {
    /// The command was forwarded to the wired transport
    Forwarded,
    /// The command was rejected and the rejection text broadcast
    Rejected,
}

/// Classify one raw BLE write and either forward it to the UART or broadcast
/// a rejection. Performs no session tracking of its own; the session set and
/// radio are only used as the rejection side channel.
pub fn dispatch<R, U, const MAX: usize>(
    raw: &[u8],
    uart: &mut U,
    sessions: &SessionManager<MAX>,
    radio: &mut R,
) -> Result<Dispatch, BridgeError>
where
    R: Radio,
    U: Write,
{
    let Ok(text) = str::from_utf8(raw) else {
        sessions.broadcast(radio, CommandError::Unknown.rejection_text().as_bytes());
        return Ok(Dispatch::Rejected);
    };
    let line = text.trim();
    #[cfg(feature = "defmt")]
    defmt::info!("ble command: {=str}", line);

    match Command::parse(line) {
        Ok(cmd) => {
            uart.write_all(cmd.wire_line().as_bytes())
                .map_err(|_| BridgeError::SerialWrite)?;
            uart.write_all(b"\n").map_err(|_| BridgeError::SerialWrite)?;
            Ok(Dispatch::Forwarded)
        }
        Err(err) => {
            // fire-and-forget, per-session failures already isolated
            sessions.broadcast(radio, err.rejection_text().as_bytes());
            Ok(Dispatch::Rejected)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{MockRadio, MockUart};
    use crate::traits::Session;

    fn fixture() -> (MockRadio, MockUart, SessionManager<4>) {
        let mut radio = MockRadio::new();
        let mut uart = MockUart::new();
        let mut sessions = SessionManager::new(heapless::Vec::new(), 500);
        sessions.on_connect(Session(1), &mut uart);
        uart.tx.clear();
        radio.sent.clear();
        (radio, uart, sessions)
    }

    #[test]
    fn test_motion_forwarded() {
        let (mut radio, mut uart, sessions) = fixture();
        let out = dispatch(b"FORWARD", &mut uart, &sessions, &mut radio).unwrap();
        assert_eq!(out, Dispatch::Forwarded);
        assert_eq!(uart.tx, b"FORWARD\n");
        assert!(radio.sent.is_empty());
    }

    #[test]
    fn test_valid_speed_forwarded() {
        let (mut radio, mut uart, sessions) = fixture();
        let out = dispatch(b"SPEED 5\n", &mut uart, &sessions, &mut radio).unwrap();
        assert_eq!(out, Dispatch::Forwarded);
        assert_eq!(uart.tx, b"SPEED 5\n");
        assert!(radio.sent.is_empty());
    }

    #[test]
    fn test_speed_out_of_range_rejected() {
        let (mut radio, mut uart, sessions) = fixture();
        let out = dispatch(b"SPEED 15", &mut uart, &sessions, &mut radio).unwrap();
        assert_eq!(out, Dispatch::Rejected);
        assert!(uart.tx.is_empty());
        assert_eq!(radio.sent.len(), 1);
        assert_eq!(
            radio.sent[0].1,
            b"Invalid SPEED command. Use: SPEED x (1\xE2\x80\x939)"
        );
    }

    #[test]
    fn test_speed_non_numeric_rejected() {
        let (mut radio, mut uart, sessions) = fixture();
        dispatch(b"SPEED x", &mut uart, &sessions, &mut radio).unwrap();
        assert!(uart.tx.is_empty());
        assert_eq!(
            radio.sent[0].1,
            CommandError::InvalidSpeed.rejection_text().as_bytes()
        );
    }

    #[test]
    fn test_speed_signed_rejected() {
        assert_eq!(Command::parse("SPEED +5"), Err(CommandError::InvalidSpeed));
        assert_eq!(Command::parse("SPEED -5"), Err(CommandError::InvalidSpeed));

        let (mut radio, mut uart, sessions) = fixture();
        let out = dispatch(b"SPEED +5", &mut uart, &sessions, &mut radio).unwrap();
        assert_eq!(out, Dispatch::Rejected);
        assert!(uart.tx.is_empty());
        assert_eq!(
            radio.sent[0].1,
            CommandError::InvalidSpeed.rejection_text().as_bytes()
        );
    }

    #[test]
    fn test_speed_wrong_arity_rejected() {
        assert_eq!(Command::parse("SPEED"), Err(CommandError::InvalidSpeed));
        assert_eq!(Command::parse("SPEED 1 2"), Err(CommandError::InvalidSpeed));
    }

    #[test]
    fn test_unknown_command() {
        let (mut radio, mut uart, sessions) = fixture();
        let out = dispatch(b"DANCE\n", &mut uart, &sessions, &mut radio).unwrap();
        assert_eq!(out, Dispatch::Rejected);
        assert!(uart.tx.is_empty());
        assert_eq!(radio.sent.len(), 1);
        assert_eq!(radio.sent[0].1, b"Unknown command.");
    }

    #[test]
    fn test_state_query() {
        let (mut radio, mut uart, sessions) = fixture();
        dispatch(b"STATE\n", &mut uart, &sessions, &mut radio).unwrap();
        assert_eq!(uart.tx, b"STATE\n");
        // prefix is not enough for the query
        assert_eq!(Command::parse("STATEFUL"), Err(CommandError::Unknown));
    }

    #[test]
    fn test_non_utf8_write_rejected_as_unknown() {
        let (mut radio, mut uart, sessions) = fixture();
        let out = dispatch(&[0xFF, 0x00], &mut uart, &sessions, &mut radio).unwrap();
        assert_eq!(out, Dispatch::Rejected);
        assert_eq!(radio.sent[0].1, b"Unknown command.");
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!(Command::parse("REVERSE"), Ok(Command::Motion("REVERSE")));
        assert_eq!(Command::parse("STOP NOW"), Ok(Command::Motion("STOP NOW")));
        assert_eq!(
            Command::parse("SPEED 9"),
            Ok(Command::Speed { line: "SPEED 9", value: 9 })
        );
        assert_eq!(Command::parse("STATE"), Ok(Command::Query));
        assert_eq!(Command::parse("speed 5"), Err(CommandError::Unknown));
        assert_eq!(Command::parse("SPEED 0"), Err(CommandError::InvalidSpeed));
    }
}
