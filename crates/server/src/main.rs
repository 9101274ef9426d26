use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use notice_core::{Config, SystemClock};
use notice_notify::EmailNotifier;
use notice_server::{build_router, AppState};
use notice_storage::{DocumentNoticeRepository, DocumentStore};

// ── CLI ─────────────────────────────────────────────────────────────

/// Notice tracker: record notices and email a days-left summary.
#[derive(Parser, Debug)]
#[command(name = "notice-server", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server (default).
    Serve {
        /// Listen address (overrides HOST).
        #[arg(long)]
        host: Option<String>,

        /// Listen port (overrides PORT).
        #[arg(long)]
        port: Option<u16>,

        /// Keep notices in memory only (overrides STORE_IN_MEMORY).
        #[arg(long)]
        in_memory: bool,
    },
    /// Send the notice summary once and exit.
    SendNotification,
}

fn load_config() -> Config {
    notice_core::config::load_dotenv();
    Config::from_env()
}

/// Wire the document store, email notifier and system clock together.
fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let store = if config.store.in_memory {
        DocumentStore::in_memory()
    } else {
        DocumentStore::open(&config.store.data_dir).with_context(|| {
            format!("failed to open document store at {}", config.store.data_dir.display())
        })?
    };

    let mail = &config.mail;
    if !mail.is_configured() {
        anyhow::bail!("SMTP_HOST and MAIL_TO must be set; an SMTP relay is required to send notices");
    }
    let smtp_host = mail.smtp_host.as_deref().unwrap_or_default();
    let notifier = EmailNotifier::from_config(
        smtp_host,
        Some(mail.smtp_port),
        Some(mail.tls),
        mail.credentials(),
        &mail.from,
        &mail.to,
    )?;

    Ok(Arc::new(AppState::new(
        Arc::new(DocumentNoticeRepository::new(store)),
        Arc::new(notifier),
        Arc::new(SystemClock),
    )))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

async fn serve(config: &Config) -> anyhow::Result<()> {
    let state = build_state(config)?;
    let app = build_router(
        state,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = load_config();

    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
        in_memory: false,
    }) {
        Command::Serve {
            host,
            port,
            in_memory,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.store.in_memory |= in_memory;
            config.log_summary();
            serve(&config).await?;
        }
        Command::SendNotification => {
            config.log_summary();
            let state = build_state(&config)?;
            let count = state.service.send_notice_notification().await?;
            info!(notices = count, "notification sent");
        }
    }

    Ok(())
}
