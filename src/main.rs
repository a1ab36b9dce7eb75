//! Gemini Chat Widget server.
//!
//! Entry point: loads configuration, installs tracing and serves the widget.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use dotenvy::dotenv;
use gemini_chat_widget::{config::AppConfig, server, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before config reads the environment
    let _ = dotenv();

    let config = match AppConfig::load() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    telemetry::init(config.log.format);

    tracing::info!(
        name: "config.loaded",
        host = %config.server.host,
        port = config.server.port,
        log_format = ?config.log.format,
        "Configuration loaded"
    );

    server::start_server(config).await
}
