use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bridge_server::api;
use infrastructure::BridgeConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to config directory
    #[arg(long, default_value = "config")]
    config_dir: String,

    /// Override serial device (e.g. COM10 or /dev/ttyACM0)
    #[arg(long)]
    serial_port: Option<String>,

    /// Override HTTP bind host
    #[arg(long)]
    host: Option<String>,

    /// Override HTTP port
    #[arg(long)]
    port: Option<u16>,

    /// Use the built-in simulated reader instead of the serial port
    #[arg(long)]
    simulate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,bridge_server=debug,application=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    info!("🏷️ Alma RFID Bridge Starting...");

    // 1. Load Configuration
    let mut config = BridgeConfig::load(&args.config_dir)?;
    if let Some(port) = args.serial_port {
        config.serial.port = port;
    }
    if let Some(host) = args.host {
        config.http.host = host;
    }
    if let Some(port) = args.port {
        config.http.port = port;
    }
    if args.simulate {
        config.simulate = true;
    }
    info!(
        serial_port = %config.serial.port,
        baud_rate = config.serial.baud_rate,
        simulate = config.simulate,
        "✅ Configuration loaded"
    );

    // 2. Reader + Bridge
    let state = bridge_server::setup_app_state(&config).await?;

    // 3. Shutdown on Ctrl-C
    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
                return;
            }
            info!("Shutdown signal received");
            shutdown.cancel();
        }
    });

    // 4. Start HTTP Server
    let app = api::create_router(state.clone());
    let addr = format!("{}:{}", config.http.host, config.http.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Bridge listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    // 5. Leave the reader idle
    state.service.stop_scanning().await;
    if let Err(e) = state.service.channel().close().await {
        warn!("Error closing reader link: {}", e);
    }
    info!("👋 Bridge stopped");

    Ok(())
}
