//! # Bridge Loop
//!
//! [`Bridge`] is the explicit context object tying everything together: it
//! owns the radio and UART handles, the session set, the line reassembler and
//! the running statistics. The platform entry point constructs one and then
//! drives [`Bridge::step`] forever, sleeping `poll_interval_ms` between
//! iterations; that sleep is the system's only throttle.
//!
//! Each step drains the radio event queue first (connects, disconnects,
//! inbound command writes). Then, only while someone is connected, it reads
//! whatever the UART has ready, reassembles it into lines and fans each line
//! out to every session. Command forwarding is independent of the
//! connected-gate: it happens in the event path, not the poll path.

use embedded_io::{Read, ReadReady, Write};

use crate::advertising::advertising_payload;
use crate::command::{self, Dispatch};
use crate::line::LineReassembler;
use crate::session::SessionManager;
use crate::traits::{BridgeError, Radio, RadioError, RadioEvent};
use crate::{
    DEFAULT_ADV_INTERVAL_MS, LINE_BUF_CAP, MAX_SESSIONS, POLL_INTERVAL_MS, UART_SERVICE_UUID,
};

/// Text notified when a reassembled telemetry line is not valid UTF-8
pub const DECODE_ERROR_TEXT: &str = "Error decoding UART.";

/// Text notified when a telemetry line outgrows the reassembly buffer
pub const LINE_OVERFLOW_TEXT: &str = "UART line too long.";

/// UART read chunk size per read call
const READ_CHUNK: usize = 64;

/// Static configuration for the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BridgeConfig<'a> {
    /// Device name placed in the advertising payload. Next to the 128-bit
    /// UUID list it can be at most 8 bytes, see [`advertising_payload`].
    pub device_name: &'a str,
    /// Advertised 128-bit service UUID
    pub service_uuid: u128,
    /// Advertising interval in milliseconds
    pub adv_interval_ms: u32,
    /// Poll loop interval in milliseconds (consumed by the caller's sleep)
    pub poll_interval_ms: u32,
}

impl Default for BridgeConfig<'static> {
    fn default() -> Self {
        Self {
            device_name: "mpy-uart",
            service_uuid: UART_SERVICE_UUID,
            adv_interval_ms: DEFAULT_ADV_INTERVAL_MS,
            poll_interval_ms: POLL_INTERVAL_MS,
        }
    }
}

/// Running counters for the bridge
#[derive(Debug, Default, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BridgeStats {
    /// Telemetry lines relayed to the wireless side
    pub lines_relayed: u32,
    /// Commands forwarded to the wired transport
    pub commands_forwarded: u32,
    /// Commands rejected back to the controller
    pub commands_rejected: u32,
    /// Telemetry lines that failed UTF-8 decoding
    pub decode_errors: u32,
    /// Reassembly buffer overflows
    pub line_overflows: u32,
    /// Total bytes read from the UART
    pub uart_bytes_read: u64,
}

/// The bridge context: session set, reassembler, stats and both transports
pub struct Bridge<R, U> {
    radio: R,
    uart: U,
    sessions: SessionManager<MAX_SESSIONS>,
    reassembler: LineReassembler<LINE_BUF_CAP>,
    stats: BridgeStats,
}

impl<R, U> Bridge<R, U>
where
    R: Radio,
    U: Read + Write + ReadReady,
{
    /// Build the advertising payload and start advertising.
    ///
    /// The radio must already be activated; an inactive radio is a fatal
    /// precondition violation and surfaces as [`RadioError::Inactive`].
    pub fn new(radio: R, uart: U, config: &BridgeConfig<'_>) -> Result<Self, RadioError> {
        let payload = advertising_payload(config.device_name, config.service_uuid)?;
        let mut bridge = Self {
            radio,
            uart,
            sessions: SessionManager::new(payload, config.adv_interval_ms),
            reassembler: LineReassembler::new(),
            stats: BridgeStats::default(),
        };
        bridge.sessions.start_advertising(&mut bridge.radio)?;
        Ok(bridge)
    }

    /// One poll-loop iteration. Never blocks; the caller sleeps
    /// `poll_interval_ms` between calls.
    pub fn step(&mut self) -> Result<(), BridgeError> {
        self.drain_radio_events()?;

        // No point relaying telemetry with nobody listening. Command
        // forwarding already happened above, independent of this gate.
        if !self.sessions.is_connected() {
            return Ok(());
        }

        let mut chunk = [0u8; READ_CHUNK];
        while self
            .uart
            .read_ready()
            .map_err(|_| BridgeError::SerialRead)?
        {
            let n = self
                .uart
                .read(&mut chunk)
                .map_err(|_| BridgeError::SerialRead)?;
            if n == 0 {
                break;
            }
            self.stats.uart_bytes_read += n as u64;
            if self.reassembler.feed(&chunk[..n]).is_err() {
                self.stats.line_overflows += 1;
                self.sessions
                    .broadcast(&mut self.radio, LINE_OVERFLOW_TEXT.as_bytes());
            }
            self.relay_lines();
        }
        Ok(())
    }

    /// Drain connect/disconnect/write events from the radio queue
    fn drain_radio_events(&mut self) -> Result<(), BridgeError> {
        while let Some(event) = self.radio.poll_event() {
            match event {
                RadioEvent::Connected(session) => {
                    self.sessions.on_connect(session, &mut self.uart);
                }
                RadioEvent::Disconnected(session) => {
                    self.sessions
                        .on_disconnect(session, &mut self.radio, &mut self.uart)?;
                }
                RadioEvent::Write(data) => {
                    let outcome =
                        command::dispatch(&data, &mut self.uart, &self.sessions, &mut self.radio)?;
                    match outcome {
                        Dispatch::Forwarded => self.stats.commands_forwarded += 1,
                        Dispatch::Rejected => self.stats.commands_rejected += 1,
                    }
                }
            }
        }
        Ok(())
    }

    /// Broadcast every complete line buffered so far, trimmed. A line that
    /// fails UTF-8 decoding broadcasts a fixed sentinel instead and relaying
    /// continues with the next line.
    fn relay_lines(&mut self) {
        for line in self.reassembler.lines() {
            match core::str::from_utf8(&line) {
                Ok(text) => {
                    self.sessions
                        .broadcast(&mut self.radio, text.trim().as_bytes());
                    self.stats.lines_relayed += 1;
                }
                Err(_) => {
                    self.sessions
                        .broadcast(&mut self.radio, DECODE_ERROR_TEXT.as_bytes());
                    self.stats.decode_errors += 1;
                }
            }
        }
    }

    /// True iff at least one central is connected
    pub fn is_connected(&self) -> bool {
        self.sessions.is_connected()
    }

    /// Running counters
    pub fn stats(&self) -> &BridgeStats {
        &self.stats
    }

    /// Mutable access to the radio seam (host-side drivers feed events here)
    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    /// Mutable access to the wired transport
    pub fn uart_mut(&mut self) -> &mut U {
        &mut self.uart
    }
}
