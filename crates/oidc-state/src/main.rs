//! OIDC Login State Server - Entry Point

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use oidc_state::{config::Config, server::AuthServer};

#[derive(Parser, Debug)]
#[command(name = "oidc-state")]
#[command(about = "Login session state server for the OIDC authorization code flow")]
#[command(version)]
struct Cli {
    /// HTTP server port
    #[arg(long, default_value_t = oidc_state::config::defaults::PORT, env = "PORT")]
    port: u16,

    /// Session lifetime in seconds (overrides SESSION_TTL_SECS)
    #[arg(long)]
    session_ttl_secs: Option<u64>,

    /// Accept redirects to any host (overrides DEV_MODE)
    #[arg(long)]
    dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    let mut config = Config::from_env()?;
    if let Some(secs) = cli.session_ttl_secs {
        config.session.ttl = std::time::Duration::from_secs(secs);
    }
    config.dev_mode |= cli.dev_mode;
    config.validate()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        external_hostname = %config.external_hostname,
        session_ttl = ?config.session.ttl,
        dev_mode = config.dev_mode,
        "Starting OIDC login state server"
    );
    if config.dev_mode {
        tracing::warn!("Dev mode enabled: redirects to any host are accepted");
    }

    AuthServer::new(config).run_http(cli.port).await
}
