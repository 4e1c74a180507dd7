//! Network infrastructure for the receiver.
//!
//! [`NetworkListener`] binds one TCP listener (reliable channel) and one UDP
//! socket (unreliable channel) and turns both into a single stream of
//! [`TransportEvent`]s:
//!
//! - One sender is served at a time.  Each accepted TCP connection is a
//!   session with its own id and tracing span; further connections wait in
//!   the accept backlog until the current one closes.
//! - TCP bytes are split on the codec delimiter before being forwarded, so
//!   every `BytesReceived` chunk holds whole frames (the last one may be
//!   unterminated if the peer closed mid-frame).
//! - A UDP datagram is forwarded as one chunk, and only while a session is
//!   open and only when it comes from that session's IP address.

use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};

use padlink_core::protocol::DELIMITER;
use padlink_core::{ConnectionState, DeliveryClass, TransportEvent};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::infrastructure::storage::config::ListenConfig;

/// Largest datagram the receiver accepts.
const MAX_DATAGRAM: usize = 64 * 1024;

/// Errors that can occur while binding the listener.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("failed to bind TCP listener on {addr}: {source}")]
    TcpBind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to bind UDP socket on {addr}: {source}")]
    UdpBind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bound but not yet serving sockets.
pub struct NetworkListener {
    tcp: TcpListener,
    udp: UdpSocket,
}

/// Keeps the listener tasks alive; dropping it stops them.
pub struct ListenerGuard {
    tasks: Vec<JoinHandle<()>>,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

type PeerSlot = Arc<Mutex<Option<IpAddr>>>;

impl NetworkListener {
    /// Binds both sockets.  Port 0 picks an ephemeral port.
    ///
    /// # Errors
    ///
    /// [`NetworkError::TcpBind`] or [`NetworkError::UdpBind`] if either
    /// address is unavailable.
    pub async fn bind(config: &ListenConfig) -> Result<Self, NetworkError> {
        let tcp_addr = format!("{}:{}", config.bind_address, config.tcp_port);
        let udp_addr = format!("{}:{}", config.bind_address, config.udp_port);

        let tcp = TcpListener::bind(&tcp_addr)
            .await
            .map_err(|source| NetworkError::TcpBind {
                addr: tcp_addr.clone(),
                source,
            })?;
        let udp = UdpSocket::bind(&udp_addr)
            .await
            .map_err(|source| NetworkError::UdpBind {
                addr: udp_addr.clone(),
                source,
            })?;

        info!(%tcp_addr, %udp_addr, "receiver listening");
        Ok(Self { tcp, udp })
    }

    /// Address of the reliable channel.
    pub fn tcp_addr(&self) -> Result<SocketAddr, NetworkError> {
        Ok(self.tcp.local_addr()?)
    }

    /// Address of the unreliable channel.
    pub fn udp_addr(&self) -> Result<SocketAddr, NetworkError> {
        Ok(self.udp.local_addr()?)
    }

    /// Starts serving on the current runtime.
    ///
    /// Returns the event stream and a guard; the stream ends once the guard
    /// is dropped.
    pub fn spawn(self) -> (mpsc::UnboundedReceiver<TransportEvent>, ListenerGuard) {
        let (tx, rx) = mpsc::unbounded_channel();
        let peer: PeerSlot = Arc::new(Mutex::new(None));

        let tcp_task = tokio::spawn(accept_loop(self.tcp, tx.clone(), Arc::clone(&peer)));
        let udp_task = tokio::spawn(datagram_loop(self.udp, tx, peer));

        (
            rx,
            ListenerGuard {
                tasks: vec![tcp_task, udp_task],
            },
        )
    }
}

fn set_peer(peer: &PeerSlot, ip: Option<IpAddr>) {
    *peer.lock().unwrap_or_else(|e| e.into_inner()) = ip;
}

fn current_peer(peer: &PeerSlot) -> Option<IpAddr> {
    *peer.lock().unwrap_or_else(|e| e.into_inner())
}

async fn accept_loop(
    listener: TcpListener,
    events: mpsc::UnboundedSender<TransportEvent>,
    peer: PeerSlot,
) {
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("accept failed: {e}");
                continue;
            }
        };
        if let Err(e) = stream.set_nodelay(true) {
            debug!("set_nodelay failed: {e}");
        }

        let session_id = Uuid::new_v4();
        let span = info_span!("session", %session_id, peer = %addr);

        set_peer(&peer, Some(addr.ip()));
        let open = events
            .send(TransportEvent::StateChanged(ConnectionState::Connected))
            .is_ok();
        if open {
            serve_stream(stream, &events).instrument(span).await;
        }
        set_peer(&peer, None);

        if events
            .send(TransportEvent::StateChanged(ConnectionState::Disconnected))
            .is_err()
        {
            debug!("event subscriber gone; listener exiting");
            return;
        }
    }
}

async fn serve_stream(stream: TcpStream, events: &mpsc::UnboundedSender<TransportEvent>) {
    info!("sender connected");
    let mut reader = BufReader::new(stream);
    let mut frame = Vec::new();

    loop {
        frame.clear();
        match reader.read_until(DELIMITER, &mut frame).await {
            Ok(0) => {
                info!("sender closed the connection");
                return;
            }
            Ok(_) => {
                let chunk = TransportEvent::BytesReceived {
                    class: DeliveryClass::Reliable,
                    bytes: frame.clone(),
                };
                if events.send(chunk).is_err() {
                    return;
                }
            }
            Err(e) => {
                warn!("connection read failed: {e}");
                return;
            }
        }
    }
}

async fn datagram_loop(
    socket: UdpSocket,
    events: mpsc::UnboundedSender<TransportEvent>,
    peer: PeerSlot,
) {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    loop {
        let (n, from) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                debug!("datagram receive failed: {e}");
                continue;
            }
        };
        if current_peer(&peer) != Some(from.ip()) {
            debug!(%from, "datagram from unknown peer dropped");
            continue;
        }
        let chunk = TransportEvent::BytesReceived {
            class: DeliveryClass::Unreliable,
            bytes: buf[..n].to_vec(),
        };
        if events.send(chunk).is_err() {
            return;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
