//! Drives a [`ReceiverPump`] from a transport event stream.

use padlink_core::{ConnectionState, TransportEvent};
use tokio::sync::mpsc;
use tracing::debug;

use crate::application::replay_input::ReceiverPump;

/// Counters gathered over one call to [`run_session`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub chunks: u64,
    pub bytes: u64,
    /// Chunks that arrived while no connection was open.
    pub dropped: u64,
    pub disconnects: u64,
}

/// Forwards every transport event to `pump` until the stream ends.
///
/// Bytes are only forwarded between a `Connected` and the next
/// `Disconnected`; a late datagram can therefore never press a key after
/// the disconnect released everything.  The end of the stream counts as a
/// disconnect, so held keys are always released when the connection layer
/// goes away.
pub async fn run_session(
    mut events: mpsc::UnboundedReceiver<TransportEvent>,
    pump: &ReceiverPump,
) -> SessionStats {
    let mut stats = SessionStats::default();
    let mut link = ConnectionState::Disconnected;

    while let Some(event) = events.recv().await {
        match event {
            TransportEvent::BytesReceived { class, bytes }
                if link != ConnectionState::Connected =>
            {
                debug!(?class, len = bytes.len(), ?link, "chunk dropped: not connected");
                stats.dropped += 1;
            }
            TransportEvent::BytesReceived { class, bytes } => {
                debug!(?class, len = bytes.len(), "chunk received");
                stats.chunks += 1;
                stats.bytes += bytes.len() as u64;
                pump.on_bytes_received(&bytes);
            }
            TransportEvent::StateChanged(state) => {
                link = state;
                if state == ConnectionState::Disconnected {
                    stats.disconnects += 1;
                }
                pump.on_connection_state_changed(state);
            }
        }
    }

    stats.disconnects += 1;
    pump.on_connection_state_changed(ConnectionState::Disconnected);
    stats
}
