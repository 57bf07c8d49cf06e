use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reasoning_router::config::{Config, RouteOverrides};
use reasoning_router::router::{self, AppState};

#[derive(Parser)]
#[command(name = "reasoning-router")]
#[command(about = "Routes LLM requests to backend models by reasoning strength", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(
        short,
        long,
        env = "REASONING_ROUTER_CONFIG",
        default_value = "~/.reasoning-router/config.json"
    )]
    config: String,

    /// Server host (overrides HOST in the config file)
    #[arg(long)]
    host: Option<String>,

    /// Server port (overrides PORT in the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Model identifier whose requests are classified and rewritten
    #[arg(long, env = "REASONING_ROUTE_MODEL")]
    routed_model: Option<String>,

    /// Target for requests without reasoning hints
    #[arg(long, env = "NONE_REASONING_MODEL")]
    none_model: Option<String>,

    /// Target for low reasoning strength
    #[arg(long, env = "LOW_REASONING_MODEL")]
    low_model: Option<String>,

    /// Target for medium reasoning strength
    #[arg(long, env = "MEDIUM_REASONING_MODEL")]
    medium_model: Option<String>,

    /// Target for high reasoning strength
    #[arg(long, env = "HIGH_REASONING_MODEL")]
    high_model: Option<String>,
}

impl Cli {
    fn overrides(&self) -> RouteOverrides {
        RouteOverrides {
            routed_model: self.routed_model.clone(),
            none_model: self.none_model.clone(),
            low_model: self.low_model.clone(),
            medium_model: self.medium_model.clone(),
            high_model: self.high_model.clone(),
            host: self.host.clone(),
            port: self.port,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reasoning_router=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config_path = shellexpand::tilde(&cli.config).to_string();
    let config = Config::from_file_with_overrides(&config_path, &cli.overrides())?;
    tracing::info!("Loaded config from {}", config_path);
    tracing::info!("Routed model: {}", config.router().routed_model);
    for (strength, model) in config.router().models.entries() {
        tracing::info!("  {} -> {}", strength, model);
    }
    tracing::info!("Capability profile: {}", config.router().capability.as_str());
    tracing::info!("Upstream: {}", config.upstream().api_base_url);

    let addr = SocketAddr::from((
        config
            .host()
            .parse::<std::net::IpAddr>()
            .context("Invalid HOST")?,
        config.port(),
    ));

    let app = router::app(AppState::new(config));

    tracing::info!("reasoning-router listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received, draining connections");
}
