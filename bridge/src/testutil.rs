//! Mock radio and UART doubles shared by the unit tests.

use std::collections::VecDeque;
use std::vec::Vec;

use crate::traits::{Radio, RadioError, RadioEvent, Session};

/// Scriptable in-memory radio
pub(crate) struct MockRadio {
    pub active: bool,
    pub events: VecDeque<RadioEvent>,
    /// Sessions whose notify calls fail
    pub fail_for: Vec<Session>,
    /// Successfully delivered notifications
    pub sent: Vec<(Session, Vec<u8>)>,
    pub advertise_calls: u32,
}

impl MockRadio {
    pub fn new() -> Self {
        Self {
            active: true,
            events: VecDeque::new(),
            fail_for: Vec::new(),
            sent: Vec::new(),
            advertise_calls: 0,
        }
    }
}

impl Radio for MockRadio {
    fn advertise(&mut self, _interval_ms: u32, _payload: &[u8]) -> Result<(), RadioError> {
        if !self.active {
            return Err(RadioError::Inactive);
        }
        self.advertise_calls += 1;
        Ok(())
    }

    fn notify(&mut self, session: Session, data: &[u8]) -> Result<(), RadioError> {
        if self.fail_for.contains(&session) {
            return Err(RadioError::NotifyFailed);
        }
        self.sent.push((session, data.to_vec()));
        Ok(())
    }

    fn poll_event(&mut self) -> Option<RadioEvent> {
        self.events.pop_front()
    }
}

/// In-memory UART: `rx` feeds the bridge, `tx` captures what it writes
pub(crate) struct MockUart {
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
}

impl MockUart {
    pub fn new() -> Self {
        Self {
            rx: VecDeque::new(),
            tx: Vec::new(),
        }
    }
}

impl embedded_io::ErrorType for MockUart {
    type Error = core::convert::Infallible;
}

impl embedded_io::Read for MockUart {
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

impl embedded_io::ReadReady for MockUart {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.rx.is_empty())
    }
}

impl embedded_io::Write for MockUart {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.tx.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
