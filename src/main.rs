use anyhow::{Context, Result};
use clap::Parser;
use interpreter_relay::{create_router, AppState, Collaborators, Config, Coordinator, EventRouter, Reaper};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "interpreter-relay", about = "Real-time sign/speech interpreter session relay")]
struct Args {
    /// Config file path (extension optional)
    #[arg(long, default_value = "config/interpreter-relay")]
    config: String,

    /// Override the HTTP port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("interpreter_relay=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let mut cfg = Config::load(&args.config)?;
    if let Some(port) = args.port {
        cfg.service.http.port = port;
    }

    info!("Loaded config: {}", cfg.service.name);

    let coordinator = Arc::new(Coordinator::new(cfg.sessions.outbound_queue));
    let collaborators = Collaborators::from_config(&cfg.collaborators)?;

    let reaper = Reaper::new(
        Arc::clone(&coordinator),
        collaborators.clone(),
        cfg.sessions.inactivity_threshold(),
        cfg.sessions.sweep_interval(),
    )
    .spawn();

    let router = Arc::new(EventRouter::new(coordinator, collaborators));
    let app = create_router(AppState::new(router));

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);
    info!("Interpreter WebSocket at ws://{}/interpreter", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down");
        })
        .await
        .context("HTTP server failed")?;

    reaper.abort();
    Ok(())
}
