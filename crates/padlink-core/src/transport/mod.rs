//! Transport channel abstraction shared by both pumps.
//!
//! The connection layer (discovery, connect, reconnect) owns the real
//! sockets.  The pumps only ever see this narrow contract:
//!
//! - two send paths, one per [`DeliveryClass`], that take ownership of the
//!   bytes (copy-then-send: a caller can never mutate a buffer that is still
//!   in flight);
//! - a stream of [`TransportEvent`]s on a single-subscriber channel, carrying
//!   connection-state changes and raw inbound chunks.
//!
//! Sends are fire-and-forget.  They never block on the network; a failure is
//! reported through the returned `Result` so the caller can log it, and
//! nobody in this workspace retries.

use thiserror::Error;

use crate::protocol::DeliveryClass;

pub mod loopback;

pub use loopback::LoopbackTransport;

/// Errors reported by a send attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No connection is established; the bytes were discarded.
    #[error("no connection established")]
    NotConnected,

    /// The connection exists but the underlying socket rejected the write.
    #[error("transport I/O error: {0}")]
    Io(String),

    /// The task that owns the socket has gone away.
    #[error("transport writer closed")]
    Closed,
}

/// Connection lifecycle as reported by the connection layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Everything the connection layer tells its single subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection moved to a new state.
    StateChanged(ConnectionState),
    /// A raw inbound chunk.  Chunks carry no boundary guarantee of their own;
    /// event boundaries are recovered from the codec's delimiter.
    BytesReceived { class: DeliveryClass, bytes: Vec<u8> },
}

/// Outbound half of a transport, as consumed by the sender pump.
#[cfg_attr(test, mockall::automock)]
pub trait TransportChannel: Send + Sync {
    /// Queues `bytes` on the ordered, eventually-delivered channel.
    fn send_reliable(&self, bytes: Vec<u8>) -> Result<(), TransportError>;

    /// Sends `bytes` best effort; may be dropped or reordered.
    fn send_unreliable(&self, bytes: Vec<u8>) -> Result<(), TransportError>;

    /// Current connection state.
    fn state(&self) -> ConnectionState;
}

/// Sends `bytes` on the channel matching `class`.
///
/// # Errors
///
/// Propagates the [`TransportError`] from the underlying send.
pub fn send_classified(
    channel: &dyn TransportChannel,
    class: DeliveryClass,
    bytes: Vec<u8>,
) -> Result<(), TransportError> {
    match class {
        DeliveryClass::Reliable => channel.send_reliable(bytes),
        DeliveryClass::Unreliable => channel.send_unreliable(bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[test]
    fn test_send_classified_reliable_uses_reliable_path_only() {
        // Arrange
        let mut channel = MockTransportChannel::new();
        channel
            .expect_send_reliable()
            .with(eq(b"a\n".to_vec()))
            .times(1)
            .returning(|_| Ok(()));
        channel.expect_send_unreliable().times(0);

        // Act
        let result = send_classified(&channel, DeliveryClass::Reliable, b"a\n".to_vec());

        // Assert
        assert!(result.is_ok());
    }

    #[test]
    fn test_send_classified_propagates_not_connected() {
        // Arrange
        let mut channel = MockTransportChannel::new();
        channel
            .expect_send_unreliable()
            .times(1)
            .returning(|_| Err(TransportError::NotConnected));

        // Act
        let result = send_classified(&channel, DeliveryClass::Unreliable, b"b\n".to_vec());

        // Assert
        assert_eq!(result, Err(TransportError::NotConnected));
    }
}
