//! Padlink sender entry point.
//!
//! Reads UI events (one JSON object per line) from stdin, coalesces them in
//! a [`CoalescingPump`] and ships them to a receiver over TCP + UDP.
//!
//! # Usage
//!
//! ```text
//! padlink-sender [OPTIONS]
//!
//! Options:
//!   --config    <PATH>   Config file [default: platform config dir]
//!   --host      <HOST>   Receiver hostname or IP
//!   --tcp-port  <PORT>   Receiver reliable-channel port
//!   --udp-port  <PORT>   Receiver unreliable-channel port
//!   --tick-ms   <MS>     Pump flush period
//! ```
//!
//! Every option falls back to a `PADLINK_*` environment variable, then to the
//! config file, then to the built-in default.
//!
//! ```text
//! main()
//!  └─ load_config()            -- sender.toml or defaults
//!  └─ NetworkTransport::connect
//!  └─ CoalescingPump::start    -- 3 ms tick task
//!  └─ loop: stdin → pump.enqueue, state events → pump, Ctrl-C → exit
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use padlink_core::TransportEvent;
use padlink_sender::application::CoalescingPump;
use padlink_sender::infrastructure::event_source::StdinEventSource;
use padlink_sender::infrastructure::network::NetworkTransport;
use padlink_sender::infrastructure::storage::config::{load_config, SenderConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Padlink sender.
///
/// Streams pointer and gamepad events read from stdin to a Padlink receiver.
#[derive(Debug, Parser)]
#[command(
    name = "padlink-sender",
    about = "Streams pointer and gamepad events to a Padlink receiver",
    version
)]
struct Cli {
    /// Path to `sender.toml`.  Defaults to the platform config directory.
    #[arg(long, env = "PADLINK_SENDER_CONFIG")]
    config: Option<PathBuf>,

    /// Receiver hostname or IP address.
    #[arg(long, env = "PADLINK_RECEIVER_HOST")]
    host: Option<String>,

    /// Receiver TCP port (reliable channel).
    #[arg(long, env = "PADLINK_TCP_PORT")]
    tcp_port: Option<u16>,

    /// Receiver UDP port (unreliable channel).
    #[arg(long, env = "PADLINK_UDP_PORT")]
    udp_port: Option<u16>,

    /// Pump flush period in milliseconds.
    #[arg(long, env = "PADLINK_TICK_MS")]
    tick_ms: Option<u64>,
}

impl Cli {
    /// Overlays command-line values on top of the file configuration.
    fn apply_to(self, mut config: SenderConfig) -> SenderConfig {
        if let Some(host) = self.host {
            config.network.receiver_host = host;
        }
        if let Some(port) = self.tcp_port {
            config.network.tcp_port = port;
        }
        if let Some(port) = self.udp_port {
            config.network.udp_port = port;
        }
        if let Some(ms) = self.tick_ms {
            config.pump.tick_ms = ms;
        }
        config
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).context("failed to load sender config")?;
    let config = cli.apply_to(config);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.sender.log_level)),
        )
        .init();

    info!(
        "Padlink sender starting, receiver={}:{} (udp {})",
        config.network.receiver_host, config.network.tcp_port, config.network.udp_port
    );

    let (transport, mut transport_events) = NetworkTransport::connect(&config.network)
        .await
        .context("failed to connect to receiver")?;

    let pump = Arc::new(CoalescingPump::with_tick_interval(
        transport,
        Duration::from_millis(config.pump.tick_ms.max(1)),
    ));
    pump.start().context("failed to start sender pump")?;

    let mut source = StdinEventSource::stdin();
    loop {
        tokio::select! {
            next = source.next_event() => match next {
                Ok(Some(event)) => pump.enqueue(event),
                Ok(None) => {
                    info!("end of input");
                    break;
                }
                Err(e) => {
                    error!("failed to read input: {e}");
                    break;
                }
            },
            Some(event) = transport_events.recv() => {
                if let TransportEvent::StateChanged(state) = event {
                    pump.on_connection_state_changed(state);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    // Whatever is still pending goes out before the pump is torn down.
    pump.tick();
    pump.stop();
    info!("Padlink sender stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
