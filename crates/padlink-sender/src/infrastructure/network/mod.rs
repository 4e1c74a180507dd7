//! TCP/UDP transport from the sender to a receiver.
//!
//! - **Reliable** sends are queued on an unbounded channel and written to a
//!   TCP stream by a dedicated writer task, so `send_reliable` never awaits.
//! - **Unreliable** sends go out as one UDP datagram each via `try_send`; a
//!   full socket buffer drops the datagram.
//!
//! The receiver never writes on the TCP stream; a reader task only watches
//! for EOF so a peer close is reported as `Disconnected`.  There is no
//! reconnect: once disconnected, every send returns
//! [`TransportError::NotConnected`].

use std::sync::{Arc, Mutex};

use padlink_core::{ConnectionState, TransportChannel, TransportError, TransportEvent};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::infrastructure::storage::config::NetworkConfig;

/// Error type for establishing the connection.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("connect to {addr} failed: {source}")]
    ConnectFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("UDP setup for {addr} failed: {source}")]
    UdpSetup {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// State shared between the transport handle and its background tasks.
struct Link {
    state: Mutex<ConnectionState>,
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl Link {
    fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, next: ConnectionState) {
        let changed = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            let changed = *state != next;
            *state = next;
            changed
        };
        if changed {
            let _ = self.events.send(TransportEvent::StateChanged(next));
        }
    }
}

/// Sender-side [`TransportChannel`] over one TCP stream and one UDP socket.
pub struct NetworkTransport {
    link: Arc<Link>,
    reliable_tx: mpsc::UnboundedSender<Vec<u8>>,
    udp: UdpSocket,
}

impl NetworkTransport {
    /// Connects to the receiver described by `config`.
    ///
    /// Returns the transport plus the stream of state changes.  The first
    /// event on the stream is `StateChanged(Connected)`.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::ConnectFailed`] if the TCP connection cannot be
    /// established and [`NetworkError::UdpSetup`] if the UDP socket cannot be
    /// bound or connected.
    pub async fn connect(
        config: &NetworkConfig,
    ) -> Result<(Arc<Self>, mpsc::UnboundedReceiver<TransportEvent>), NetworkError> {
        let tcp_addr = format!("{}:{}", config.receiver_host, config.tcp_port);
        let udp_addr = format!("{}:{}", config.receiver_host, config.udp_port);

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let link = Arc::new(Link {
            state: Mutex::new(ConnectionState::Disconnected),
            events: events_tx,
        });
        link.set_state(ConnectionState::Connecting);

        let stream = TcpStream::connect(&tcp_addr)
            .await
            .map_err(|source| NetworkError::ConnectFailed {
                addr: tcp_addr.clone(),
                source,
            })?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!("set_nodelay failed: {e}");
        }

        let udp = UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(|source| NetworkError::UdpSetup {
                addr: udp_addr.clone(),
                source,
            })?;
        udp.connect(&udp_addr)
            .await
            .map_err(|source| NetworkError::UdpSetup {
                addr: udp_addr.clone(),
                source,
            })?;

        let (mut reader, mut writer) = stream.into_split();
        let (reliable_tx, mut reliable_rx) = mpsc::unbounded_channel::<Vec<u8>>();

        let writer_link = Arc::clone(&link);
        tokio::spawn(async move {
            while let Some(bytes) = reliable_rx.recv().await {
                if let Err(e) = writer.write_all(&bytes).await {
                    warn!("reliable write failed: {e}");
                    writer_link.set_state(ConnectionState::Disconnected);
                    break;
                }
            }
        });

        let reader_link = Arc::clone(&link);
        tokio::spawn(async move {
            let mut scratch = [0u8; 256];
            loop {
                match reader.read(&mut scratch).await {
                    Ok(0) => {
                        info!("receiver closed the connection");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("connection read failed: {e}");
                        break;
                    }
                }
            }
            reader_link.set_state(ConnectionState::Disconnected);
        });

        link.set_state(ConnectionState::Connected);
        info!(%tcp_addr, %udp_addr, "connected to receiver");

        Ok((
            Arc::new(Self {
                link,
                reliable_tx,
                udp,
            }),
            events_rx,
        ))
    }

    fn ensure_connected(&self) -> Result<(), TransportError> {
        match self.link.state() {
            ConnectionState::Connected => Ok(()),
            _ => Err(TransportError::NotConnected),
        }
    }
}

impl TransportChannel for NetworkTransport {
    fn send_reliable(&self, bytes: Vec<u8>) -> Result<(), TransportError> {
        self.ensure_connected()?;
        self.reliable_tx
            .send(bytes)
            .map_err(|_| TransportError::Closed)
    }

    fn send_unreliable(&self, bytes: Vec<u8>) -> Result<(), TransportError> {
        self.ensure_connected()?;
        self.udp
            .try_send(&bytes)
            .map(|_| ())
            .map_err(|e| TransportError::Io(e.to_string()))
    }

    fn state(&self) -> ConnectionState {
        self.link.state()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
