//! mitherm - monitor an ATC-flashed Xiaomi thermometer over BLE.
//!
//! Run with: `cargo run -p mitherm-service`

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use mitherm_core::{BtleRadio, DeviceFilter, ReadingStore, SensorSession, SessionOptions};
use mitherm_service::{AppState, api};
use mitherm_types::SessionMode;

/// Monitor an ATC-flashed Xiaomi LYWSD03MMC thermometer over BLE.
#[derive(Parser, Debug)]
#[command(name = "mitherm")]
#[command(version, about, long_about = None)]
struct Args {
    /// Device local name to match.
    #[arg(long, default_value = "ATC")]
    name: String,

    /// Device address (MAC on Linux/Windows, UUID on macOS).
    /// Takes priority over --name when set.
    #[arg(long, default_value = "")]
    addr: String,

    /// How to talk to the sensor.
    #[arg(long, value_enum, default_value_t = Mode::Connect)]
    mode: Mode,

    /// Scan duration in seconds. 0 scans until interrupted.
    #[arg(long, default_value_t = 15)]
    scan_duration: u64,

    /// How long to keep streaming or monitoring, in seconds.
    /// 0 runs until interrupted. Ignored with --web.
    #[arg(long, default_value_t = 0)]
    run_duration: u64,

    /// Only log warnings and errors.
    #[arg(long)]
    quiet: bool,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,

    /// Serve the latest reading as JSON over HTTP.
    #[arg(long)]
    web: bool,

    /// HTTP bind address.
    #[arg(long, default_value = "127.0.0.1:8989")]
    bind: String,
}

/// Session mode as exposed on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Connect and subscribe to GATT notifications.
    Connect,
    /// Passively decode service-data advertisements.
    Monitor,
    /// Scan and log nearby devices, then exit.
    Scan,
}

impl From<Mode> for SessionMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Connect => SessionMode::ConnectedNotify,
            Mode::Monitor => SessionMode::AdvertisementMonitor,
            Mode::Scan => SessionMode::DiscoveryOnly,
        }
    }
}

/// A zero duration from the CLI means "no limit".
fn duration_or_none(seconds: u64) -> Option<Duration> {
    (seconds > 0).then(|| Duration::from_secs(seconds))
}

fn init_logging(quiet: bool, debug: bool) -> anyhow::Result<()> {
    let level = if debug {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("mitherm={level}").parse()?)
                .add_directive(format!("mitherm_core={level}").parse()?)
                .add_directive(format!("mitherm_service={level}").parse()?),
        )
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.quiet, args.debug)?;

    let mode = SessionMode::from(args.mode);
    let store = Arc::new(ReadingStore::new());
    let radio = Arc::new(BtleRadio::new().await?);

    let session = SensorSession::new(
        radio,
        Arc::clone(&store),
        SessionOptions {
            mode,
            filter: DeviceFilter::new(&args.name, &args.addr),
            scan_timeout: duration_or_none(args.scan_duration),
            // Web mode serves until interrupted; the session follows suit.
            run_duration: if args.web {
                None
            } else {
                duration_or_none(args.run_duration)
            },
        },
    );

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, shutting down");
                cancel.cancel();
            }
        });
    }

    if args.web {
        let state = AppState::new(Arc::clone(&store), mode);
        let app = Router::new()
            .merge(api::router())
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
            .with_state(state);

        let addr: SocketAddr = args.bind.parse()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("serving readings on http://{addr}/");

        let shutdown = cancel.clone();
        tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await;
            if let Err(err) = result {
                error!(%err, "http server error");
            }
        });
    }

    session.run(cancel.clone()).await?;
    cancel.cancel();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["mitherm"]);
        assert_eq!(args.name, "ATC");
        assert!(args.addr.is_empty());
        assert!(matches!(args.mode, Mode::Connect));
        assert_eq!(args.scan_duration, 15);
        assert_eq!(args.run_duration, 0);
        assert!(!args.web);
        assert_eq!(args.bind, "127.0.0.1:8989");
    }

    #[test]
    fn test_zero_duration_means_no_limit() {
        assert_eq!(duration_or_none(0), None);
        assert_eq!(duration_or_none(15), Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_mode_mapping() {
        assert_eq!(SessionMode::from(Mode::Connect), SessionMode::ConnectedNotify);
        assert_eq!(SessionMode::from(Mode::Monitor), SessionMode::AdvertisementMonitor);
        assert_eq!(SessionMode::from(Mode::Scan), SessionMode::DiscoveryOnly);
    }
}
