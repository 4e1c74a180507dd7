//! In-memory transport that hands every send straight to a local receiver.
//!
//! Used by integration tests and by the single-process demo wiring: the
//! sender pump writes into one end, the receiver session reads
//! [`TransportEvent`]s from the other.  Both delivery classes are delivered
//! in order and never dropped, which is a valid (if generous) implementation
//! of the unreliable contract.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::debug;

use crate::protocol::DeliveryClass;
use crate::transport::{ConnectionState, TransportChannel, TransportError, TransportEvent};

/// Sending end of an in-memory link.
pub struct LoopbackTransport {
    state: Mutex<ConnectionState>,
    tx: mpsc::UnboundedSender<TransportEvent>,
}

impl LoopbackTransport {
    /// Creates a connected link and returns the sending end plus the event
    /// stream a receiver session consumes.
    pub fn pair() -> (Arc<Self>, mpsc::UnboundedReceiver<TransportEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(TransportEvent::StateChanged(ConnectionState::Connected));
        let transport = Arc::new(Self {
            state: Mutex::new(ConnectionState::Connected),
            tx,
        });
        (transport, rx)
    }

    /// Simulates the peer going away.
    pub fn disconnect(&self) {
        self.set_state(ConnectionState::Disconnected);
    }

    /// Simulates the link coming back.
    pub fn connect(&self) {
        self.set_state(ConnectionState::Connected);
    }

    fn set_state(&self, next: ConnectionState) {
        let changed = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            let changed = *state != next;
            *state = next;
            changed
        };
        if changed {
            debug!(state = ?next, "loopback state changed");
            let _ = self.tx.send(TransportEvent::StateChanged(next));
        }
    }

    fn deliver(&self, class: DeliveryClass, bytes: Vec<u8>) -> Result<(), TransportError> {
        if self.state() != ConnectionState::Connected {
            return Err(TransportError::NotConnected);
        }
        self.tx
            .send(TransportEvent::BytesReceived { class, bytes })
            .map_err(|_| TransportError::Closed)
    }
}

impl TransportChannel for LoopbackTransport {
    fn send_reliable(&self, bytes: Vec<u8>) -> Result<(), TransportError> {
        self.deliver(DeliveryClass::Reliable, bytes)
    }

    fn send_unreliable(&self, bytes: Vec<u8>) -> Result<(), TransportError> {
        self.deliver(DeliveryClass::Unreliable, bytes)
    }

    fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
