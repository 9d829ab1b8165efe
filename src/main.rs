//! grafana-apprise-proxy
//!
//! Startup order: logging → working directory → configuration → metrics →
//! listener → serve until SIGINT/SIGTERM.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use grafana_apprise_proxy::config::ConfigLoader;
use grafana_apprise_proxy::lifecycle::{signals, startup, Shutdown};
use grafana_apprise_proxy::observability::{logging, metrics};
use grafana_apprise_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "grafana-apprise-proxy", version)]
#[command(about = "Translate Grafana alert webhooks into Apprise notifications", long_about = None)]
struct Cli {
    /// Configuration file, searched before conf.yml and /etc/grafana-apprise-proxy/conf.yml
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("grafana-apprise-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    // Resolve before leaving the caller's working directory.
    let explicit = cli.config.map(std::path::absolute).transpose()?;
    startup::enter_executable_dir()?;

    let mut loader = ConfigLoader::new();
    if let Some(path) = explicit {
        loader = loader.with_config_path(path);
    }
    let config = loader.load().map_err(|e| {
        format!("The proxy needs at least a target URL to proxy against to run. {}", e)
    })?;

    startup::log_setup(&config);

    if let Some(addr) = &config.metrics_address {
        metrics::init_metrics(addr.parse()?)?;
    }

    let bind_address = config.bind_address();
    let server = HttpServer::new(config)?;
    let listener = TcpListener::bind(bind_address).await?;

    let shutdown = Shutdown::new();
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        result = &mut server_task => return Ok(result??),
        _ = signals::shutdown_signal() => shutdown.trigger(),
    }

    server_task.await??;
    Ok(())
}
