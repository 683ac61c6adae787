//! # Radio Trait & Session Handle
//!
//! This module defines the seam between the bridge core and the BLE
//! peripheral stack. The radio stack itself (GATT registration, connection
//! establishment, notification delivery) lives behind [`Radio`]; the bridge
//! only consumes its events and issues advertise/notify requests.
//!
//! ## Event Model
//!
//! The underlying stack typically delivers connect/disconnect/write events
//! from an interrupt or callback context. Implementations enqueue those into
//! a single-producer queue and hand them to the bridge through
//! [`Radio::poll_event`], which keeps the bridge loop single-threaded: the
//! former callback path and the poll loop can no longer interleave mid-update.

use heapless::Vec;

use crate::MAX_COMMAND_LEN;

/// Opaque handle for one established BLE connection.
///
/// Issued by the radio stack on connect, dead after the matching disconnect.
/// The bridge never fabricates these; membership in the session set changes
/// only in response to radio events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Session(pub u16);

/// Connection lifecycle and inbound-write events surfaced by the radio
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioEvent {
    /// A central connected
    Connected(Session),
    /// A central disconnected (or the link dropped)
    Disconnected(Session),
    /// A central wrote raw command bytes to the shared characteristic
    Write(Vec<u8, MAX_COMMAND_LEN>),
}

impl RadioEvent {
    /// Build a write event from raw bytes. `None` if the write exceeds
    /// [`MAX_COMMAND_LEN`].
    pub fn write_from(bytes: &[u8]) -> Option<Self> {
        let mut data = Vec::new();
        data.extend_from_slice(bytes).ok()?;
        Some(Self::Write(data))
    }
}

/// Abstraction over the BLE peripheral radio
pub trait Radio {
    /// Start (or restart) advertising `payload` at the given interval.
    ///
    /// Fails with [`RadioError::Inactive`] if the radio has not been
    /// activated; the bridge treats that as a fatal precondition violation.
    fn advertise(&mut self, interval_ms: u32, payload: &[u8]) -> Result<(), RadioError>;

    /// Fire-and-forget notify of `data` to a single session.
    ///
    /// A failure here means this session only; the caller isolates it and
    /// keeps delivering to the rest.
    fn notify(&mut self, session: Session, data: &[u8]) -> Result<(), RadioError>;

    /// Dequeue the next pending radio event, if any. Never blocks.
    fn poll_event(&mut self) -> Option<RadioEvent>;
}

/// Errors reported by the radio seam
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioError {
    /// The radio capability has not been activated
    Inactive,
    /// Notify-send to one session failed (stale handle, link dropped)
    NotifyFailed,
    /// Advertising payload exceeds the legacy 31-byte limit
    PayloadTooLong,
}

/// Errors surfaced by the bridge loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeError {
    /// UART read failed
    SerialRead,
    /// UART write failed
    SerialWrite,
    /// Radio-level fault
    Radio(RadioError),
}

impl From<RadioError> for BridgeError {
    fn from(e: RadioError) -> Self {
        Self::Radio(e)
    }
}
