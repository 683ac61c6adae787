//! # Session Tracking
//!
//! Maintains the set of currently connected centrals in response to radio
//! lifecycle events, answers "is anyone connected", fans notifications out to
//! every session, and restarts advertising after each disconnect so the
//! device stays discoverable.
//!
//! Duplicate or stale events are absorbed: a connect for a known session and
//! a disconnect for an unknown one are both no-ops. Every connect and
//! disconnect also emits a short status line on the UART for diagnostic
//! visibility; those writes are best-effort and never propagate failures.

use embedded_io::Write;
use heapless::{FnvIndexSet, Vec};

use crate::advertising::ADV_MAX_LEN;
use crate::traits::{Radio, RadioError, Session};

/// Session set plus the precomputed advertising payload.
///
/// `MAX` is the session capacity and must be a power of two.
pub struct SessionManager<const MAX: usize> {
    sessions: FnvIndexSet<Session, MAX>,
    adv_payload: Vec<u8, ADV_MAX_LEN>,
    adv_interval_ms: u32,
}

impl<const MAX: usize> SessionManager<MAX> {
    /// Create an empty manager. Advertising is not started here; the bridge
    /// calls [`start_advertising`](Self::start_advertising) once the radio is
    /// known to be active.
    pub fn new(adv_payload: Vec<u8, ADV_MAX_LEN>, adv_interval_ms: u32) -> Self {
        Self {
            sessions: FnvIndexSet::new(),
            adv_payload,
            adv_interval_ms,
        }
    }

    /// Record a new connection. Idempotent for duplicate connect events; a
    /// full session set drops the event (the link stays up, we just won't
    /// notify it).
    pub fn on_connect<U: Write>(&mut self, session: Session, uart: &mut U) {
        let _ = uart.write_all(b"Connected\n");
        #[cfg(feature = "defmt")]
        defmt::info!("new connection {}", session.0);
        if self.sessions.insert(session).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("session set full, dropping {}", session.0);
        }
    }

    /// Drop a connection and restart advertising. A disconnect for an
    /// unknown session is a stale event and is absorbed silently.
    pub fn on_disconnect<R: Radio, U: Write>(
        &mut self,
        session: Session,
        radio: &mut R,
        uart: &mut U,
    ) -> Result<(), RadioError> {
        if !self.sessions.remove(&session) {
            return Ok(());
        }
        let _ = uart.write_all(b"Disconnected\n");
        #[cfg(feature = "defmt")]
        defmt::info!("disconnected {}", session.0);
        self.start_advertising(radio)
    }

    /// True iff at least one central is connected
    pub fn is_connected(&self) -> bool {
        !self.sessions.is_empty()
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True iff no central is connected
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Notify `payload` to every connected session. A failure against one
    /// stale session never aborts delivery to the rest. Returns the number
    /// of successful notifies.
    pub fn broadcast<R: Radio>(&self, radio: &mut R, payload: &[u8]) -> usize {
        let mut delivered = 0;
        for session in self.sessions.iter() {
            match radio.notify(*session, payload) {
                Ok(()) => delivered += 1,
                Err(_) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("notify failed for {}", session.0);
                }
            }
        }
        delivered
    }

    /// Advertise the precomputed payload. Called at bridge construction and
    /// after every disconnect; fails only if the radio is inactive.
    pub fn start_advertising<R: Radio>(&self, radio: &mut R) -> Result<(), RadioError> {
        #[cfg(feature = "defmt")]
        defmt::info!("starting advertising");
        radio.advertise(self.adv_interval_ms, &self.adv_payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{MockRadio, MockUart};

    fn manager() -> SessionManager<4> {
        SessionManager::new(Vec::new(), 500)
    }

    #[test]
    fn test_connect_then_disconnect() {
        let mut m = manager();
        let mut radio = MockRadio::new();
        let mut uart = MockUart::new();

        m.on_connect(Session(7), &mut uart);
        assert!(m.is_connected());
        assert_eq!(uart.tx, b"Connected\n");

        m.on_disconnect(Session(7), &mut radio, &mut uart).unwrap();
        assert!(!m.is_connected());
        assert_eq!(uart.tx, b"Connected\nDisconnected\n");
        // exactly one re-advertisement
        assert_eq!(radio.advertise_calls, 1);
    }

    #[test]
    fn test_duplicate_connect_is_idempotent() {
        let mut m = manager();
        let mut uart = MockUart::new();
        m.on_connect(Session(1), &mut uart);
        m.on_connect(Session(1), &mut uart);
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn test_stale_disconnect_is_silent() {
        let mut m = manager();
        let mut radio = MockRadio::new();
        let mut uart = MockUart::new();
        m.on_disconnect(Session(9), &mut radio, &mut uart).unwrap();
        assert!(uart.tx.is_empty());
        assert_eq!(radio.advertise_calls, 0);
    }

    #[test]
    fn test_broadcast_isolates_failures() {
        let mut m = manager();
        let mut radio = MockRadio::new();
        let mut uart = MockUart::new();
        for id in 0..3 {
            m.on_connect(Session(id), &mut uart);
        }
        radio.fail_for.push(Session(1));

        let delivered = m.broadcast(&mut radio, b"telemetry");
        assert_eq!(delivered, 2);
        assert_eq!(radio.sent.len(), 2);
        assert!(radio.sent.iter().all(|(s, _)| *s != Session(1)));
    }

    #[test]
    fn test_advertising_requires_active_radio() {
        let m = manager();
        let mut radio = MockRadio::new();
        radio.active = false;
        assert_eq!(
            m.start_advertising(&mut radio),
            Err(RadioError::Inactive)
        );
    }
}
