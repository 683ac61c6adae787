//! # BLE-UART Bridge Core
//!
//! This crate provides the core logic for a BLE-to-UART serial bridge:
//!
//! - **Radio Trait**: Abstraction over the BLE peripheral (advertising,
//!   connection events, characteristic writes, notify-send)
//! - **Line Reassembly**: Converts the raw UART byte stream into complete
//!   newline-terminated lines
//! - **Command Dispatch**: Validates inbound text commands before forwarding
//!   them to the wired actuator subsystem
//! - **Session Tracking**: Maintains the set of connected centrals and
//!   restarts advertising after every disconnect
//!
//! ## Architecture
//!
//! ```text
//! BLE write ──► Command Dispatcher ──► UART tx
//!                      │
//!                (invalid command)
//!                      ▼
//! BLE notify ◄── Session Manager ◄── Line Reassembler ◄── UART rx
//! ```
//!
//! ## Protocol
//!
//! One BLE write carries one text command; one notify carries one line of
//! telemetry. There is no framing beyond the newline delimiter on the UART
//! side. The UART peripheral is any [`embedded_io`] `Read + Write + ReadReady`
//! implementor; the radio is anything implementing [`Radio`].

#![cfg_attr(not(feature = "std"), no_std)]

pub mod advertising;
pub mod bridge;
pub mod command;
pub mod line;
pub mod session;
pub mod traits;

// Re-export main types for convenience
pub use advertising::advertising_payload;
pub use bridge::{Bridge, BridgeConfig, BridgeStats};
pub use command::{dispatch, Command, CommandError, Dispatch};
pub use line::{LineError, LineReassembler, Lines};
pub use session::SessionManager;
pub use traits::{BridgeError, Radio, RadioError, RadioEvent, Session};

#[cfg(test)]
pub(crate) mod testutil;

/// Library version for diagnostics
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Nordic-UART-style service UUID advertised by the bridge
pub const UART_SERVICE_UUID: u128 = 0x6E400001_B5A3_F393_E0A9_E50E24DCCA9E;

/// The single TX/RX characteristic (read | write | write-no-response | notify)
pub const UART_CHAR_UUID: u128 = 0x6E400002_B5A3_F393_E0A9_E50E24DCCA9E;

/// Wired transport baud rate
pub const UART_BAUD: u32 = 115_200;

/// Default advertising interval in milliseconds
pub const DEFAULT_ADV_INTERVAL_MS: u32 = 500;

/// Default bridge poll interval in milliseconds; the only throttle in the
/// system, callers sleep this long between [`Bridge::step`] calls
pub const POLL_INTERVAL_MS: u32 = 50;

/// Maximum length of a single inbound BLE write (one command)
pub const MAX_COMMAND_LEN: usize = 64;

/// Capacity of the UART line reassembly buffer. A line longer than this is
/// dropped with an explicit overflow error, never silently truncated.
pub const LINE_BUF_CAP: usize = 512;

/// Maximum number of concurrently connected centrals (power of two)
pub const MAX_SESSIONS: usize = 4;
