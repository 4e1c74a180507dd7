//! Padlink receiver entry point.
//!
//! ```text
//! main()
//!  └─ load_config()             -- receiver.toml or defaults
//!  └─ NetworkListener::bind     -- TCP + UDP
//!  └─ ReceiverPump::start       -- lane task + motion timer
//!  └─ run_session(events)       -- until Ctrl-C
//!  └─ pump.stop()               -- releases every held key
//! ```
//!
//! Input is injected through [`LoggingInjector`], which reports every key
//! edge, click and motion step through `tracing`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::runtime::Handle;
use tracing::info;
use tracing_subscriber::EnvFilter;

use padlink_core::ButtonMap;
use padlink_receiver::application::keyboard_emitter::KeyboardEmitter;
use padlink_receiver::application::session::run_session;
use padlink_receiver::application::{InputReplayer, ReceiverPump};
use padlink_receiver::infrastructure::input_injection::LoggingInjector;
use padlink_receiver::infrastructure::network::NetworkListener;
use padlink_receiver::infrastructure::storage::config::{load_config, ReceiverConfig};

/// Padlink receiver.
#[derive(Debug, Parser)]
#[command(
    name = "padlink-receiver",
    about = "Replays Padlink pointer and gamepad input on this machine",
    version
)]
struct Cli {
    /// Path to `receiver.toml`.  Defaults to the platform config directory.
    #[arg(long, env = "PADLINK_RECEIVER_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(long, env = "PADLINK_BIND_ADDRESS")]
    bind: Option<String>,

    #[arg(long, env = "PADLINK_TCP_PORT")]
    tcp_port: Option<u16>,

    #[arg(long, env = "PADLINK_UDP_PORT")]
    udp_port: Option<u16>,

    /// Stick deadzone on the [-1000, 1000] scale.
    #[arg(long, env = "PADLINK_STICK_DEADZONE")]
    stick_deadzone: Option<i32>,
}

impl Cli {
    fn apply_to(self, mut config: ReceiverConfig) -> ReceiverConfig {
        if let Some(bind) = self.bind {
            config.network.bind_address = bind;
        }
        if let Some(port) = self.tcp_port {
            config.network.tcp_port = port;
        }
        if let Some(port) = self.udp_port {
            config.network.udp_port = port;
        }
        if let Some(deadzone) = self.stick_deadzone {
            config.replay.stick_deadzone = deadzone;
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).context("failed to load receiver config")?;
    let config = cli.apply_to(config);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.receiver.log_level)),
        )
        .init();

    info!("Padlink receiver starting");

    let listener = NetworkListener::bind(&config.network)
        .await
        .context("failed to bind receiver sockets")?;
    let (events, _guard) = listener.spawn();

    let injector = Arc::new(LoggingInjector::new());
    let emitter = KeyboardEmitter::with_settings(
        injector.clone(),
        ButtonMap::default(),
        config.keyboard.timing(),
        Handle::current(),
    );
    let replayer = InputReplayer::new(injector, emitter, config.replay.settings());
    let pump = ReceiverPump::start(replayer, config.replay.motion_tick(), &Handle::current());

    tokio::select! {
        stats = run_session(events, &pump) => {
            info!(?stats, "listener stopped");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    pump.stop();
    info!("Padlink receiver stopped");
    Ok(())
}
