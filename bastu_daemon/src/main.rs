mod executor;
mod routes;

use bastu_core::{EngineConfig, EngineState, HttpPublisher, Scheduler, UpstreamClient};
use clap::Parser;
use executor::TickExecutor;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Sauna temperature telemetry daemon
#[derive(Parser, Debug)]
#[command(name = "bastu_daemon", version, about)]
struct Args {
    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: IpAddr,

    /// Start with simulated sensors (overrides DEBUG_MODE)
    #[arg(long)]
    debug: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<EngineState>,
    pub upstream: UpstreamClient,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bastu_daemon=debug,bastu_core=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = EngineConfig::from_env()?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if args.debug {
        config.debug_mode = true;
    }

    tracing::info!(
        "Schedule: {}, tick every {}s",
        config.schedule,
        config.tick_interval.as_secs()
    );
    if config.debug_mode {
        tracing::info!("Debug mode: simulating {:?}", config.debug_sensors);
    } else {
        tracing::info!(
            "Hardware mode: 1-Wire sensors at {}",
            config.sensors.base_dir.display()
        );
    }
    if !config.publish_enabled {
        tracing::warn!("Publishing disabled; readings stay local");
    }

    let client = reqwest::Client::builder()
        .user_agent(concat!("bastu_daemon/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let addr = SocketAddr::new(args.bind, config.port);
    let tick_interval = config.tick_interval;

    let engine = Arc::new(EngineState::new(config));
    let upstream = UpstreamClient::new(client.clone(), engine.config().upstream.clone());
    let publisher = HttpPublisher::new(
        client,
        &engine.config().upstream.publish_url,
        &engine.config().upstream.api_key,
        engine.publish_log().clone(),
    );

    let scheduler =
        Scheduler::new(engine.clone(), Arc::new(publisher)).with_bookings(Arc::new(upstream.clone()));

    // Start the publish schedule
    TickExecutor::new(Arc::new(scheduler), tick_interval).start();

    let app = routes::router(AppState { engine, upstream });

    tracing::info!("Bastu daemon listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
