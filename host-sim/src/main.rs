//! # Host Simulator
//!
//! Drives the bridge on a desktop host. Stdin plays the BLE central:
//!
//! - `/connect` and `/disconnect` simulate link events
//! - `/quit` ends the session and dumps stats as JSON
//! - any other line is delivered as a characteristic write
//!
//! The wired side is an in-memory UART with a tiny scripted actuator that
//! tracks motion/speed state and answers `STATE` queries, so the full
//! command → UART → telemetry → notify round trip can be watched from one
//! terminal. Run with `RUST_LOG=debug` to also see ignored status lines.

use std::collections::VecDeque;
use std::time::Duration;

use log::{debug, info, warn};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use bridge::{Bridge, BridgeConfig, BridgeError, Radio, RadioError, RadioEvent, Session};

/// Errors that can occur in the simulator
#[derive(Debug, Error)]
enum SimError {
    #[error("bridge fault: {0:?}")]
    Bridge(BridgeError),
    #[error("radio fault: {0:?}")]
    Radio(RadioError),
    #[error("stats encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Stdin-scripted radio double
struct SimRadio {
    events: VecDeque<RadioEvent>,
    live: Vec<Session>,
    next_id: u16,
}

impl SimRadio {
    fn new() -> Self {
        Self {
            events: VecDeque::new(),
            live: Vec::new(),
            next_id: 1,
        }
    }

    fn script_connect(&mut self) {
        let session = Session(self.next_id);
        self.next_id += 1;
        self.live.push(session);
        self.events.push_back(RadioEvent::Connected(session));
    }

    fn script_disconnect(&mut self) {
        match self.live.pop() {
            Some(session) => self.events.push_back(RadioEvent::Disconnected(session)),
            None => warn!("no session to disconnect"),
        }
    }
}

impl Radio for SimRadio {
    fn advertise(&mut self, interval_ms: u32, payload: &[u8]) -> Result<(), RadioError> {
        info!("advertising every {interval_ms} ms ({} payload bytes)", payload.len());
        Ok(())
    }

    fn notify(&mut self, session: Session, data: &[u8]) -> Result<(), RadioError> {
        info!("notify #{}: {}", session.0, String::from_utf8_lossy(data));
        Ok(())
    }

    fn poll_event(&mut self) -> Option<RadioEvent> {
        self.events.pop_front()
    }
}

/// In-memory UART with a scripted actuator on the far end
struct SimUart {
    /// Telemetry bytes waiting for the bridge to read
    rx: VecDeque<u8>,
    /// Partial command line received from the bridge
    pending: Vec<u8>,
    motion: &'static str,
    speed: u8,
}

impl SimUart {
    fn new() -> Self {
        Self {
            rx: VecDeque::new(),
            pending: Vec::new(),
            motion: "STOP",
            speed: 1,
        }
    }

    fn handle_line(&mut self, line: &[u8]) {
        let Ok(text) = std::str::from_utf8(line) else {
            return;
        };
        let cmd = text.trim();
        if cmd == "STATE" {
            let motion = self.motion;
            let speed = self.speed;
            self.reply(&format!("STATE motion={motion} speed={speed}"));
        } else if cmd.starts_with("FORWARD") {
            self.motion = "FORWARD";
            self.reply(&format!("OK {cmd}"));
        } else if cmd.starts_with("REVERSE") {
            self.motion = "REVERSE";
            self.reply(&format!("OK {cmd}"));
        } else if cmd.starts_with("STOP") {
            self.motion = "STOP";
            self.reply(&format!("OK {cmd}"));
        } else if let Some(arg) = cmd.strip_prefix("SPEED ") {
            if let Ok(value) = arg.trim().parse() {
                self.speed = value;
                self.reply(&format!("OK {cmd}"));
            }
        } else {
            // bridge status lines ("Connected"/"Disconnected") land here
            debug!("actuator ignoring: {cmd}");
        }
    }

    fn reply(&mut self, line: &str) {
        self.rx.extend(line.as_bytes());
        self.rx.push_back(b'\n');
    }
}

impl embedded_io::ErrorType for SimUart {
    type Error = core::convert::Infallible;
}

impl embedded_io::Read for SimUart {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut n = 0;
        while n < buf.len() {
            match self.rx.pop_front() {
                Some(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

impl embedded_io::ReadReady for SimUart {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.rx.is_empty())
    }
}

impl embedded_io::Write for SimUart {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.pending.extend_from_slice(buf);
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.handle_line(&line[..line.len() - 1]);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// React to one stdin line; returns false when the session should end
fn handle_input(bridge: &mut Bridge<SimRadio, SimUart>, line: &str) -> bool {
    match line {
        "/quit" => return false,
        "/connect" => bridge.radio_mut().script_connect(),
        "/disconnect" => bridge.radio_mut().script_disconnect(),
        "" => {}
        command => match RadioEvent::write_from(command.as_bytes()) {
            Some(event) => bridge.radio_mut().events.push_back(event),
            None => warn!("command longer than {} bytes, dropped", bridge::MAX_COMMAND_LEN),
        },
    }
    true
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), SimError> {
    env_logger::init();

    let config = BridgeConfig {
        device_name: "sim",
        ..BridgeConfig::default()
    };
    let mut bridge =
        Bridge::new(SimRadio::new(), SimUart::new(), &config).map_err(SimError::Radio)?;
    info!(
        "bridge v{} up, poll interval {} ms; /connect to attach a central",
        bridge::VERSION,
        config.poll_interval_ms
    );

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut ticker = tokio::time::interval(Duration::from_millis(config.poll_interval_ms as u64));
    loop {
        tokio::select! {
            _ = ticker.tick() => bridge.step().map_err(SimError::Bridge)?,
            line = rx.recv() => match line {
                Some(line) => {
                    if !handle_input(&mut bridge, line.trim()) {
                        break;
                    }
                }
                None => break,
            },
        }
    }

    info!("session stats: {}", serde_json::to_string(bridge.stats())?);
    Ok(())
}
