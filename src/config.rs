use std::path::Path;
use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use url::Url;

use crate::widget::LoadingPolicy;

/// Endpoint the widget relays to unless configured otherwise.
pub const DEFAULT_ENDPOINT: &str = "https://gemini-ai-assistant.onrender.com/chat";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Address to bind
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Remote chat endpoint (receives `{"message": ...}`)
    #[arg(long, env = "CHAT_ENDPOINT")]
    pub endpoint: Option<String>,

    /// When the typing indicator clears: `first_settlement` or `all_settled`
    #[arg(long, env = "LOADING_POLICY")]
    pub loading_policy: Option<String>,

    /// Log output: `compact` or `json`
    #[arg(long, env = "LOG_FORMAT")]
    pub log_format: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub widget: WidgetConfig,
    pub session: SessionConfig,
    pub ui: UiConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WidgetConfig {
    pub endpoint: Url,
    /// Unset means the HTTP client's default.
    pub request_timeout_secs: Option<u64>,
    pub loading_policy: LoadingPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub idle_timeout_secs: u64,
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UiConfig {
    pub title: String,
    pub htmx_src: String,
    pub htmx_sse_src: String,
    /// Served under `/static` when the directory exists.
    pub static_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        // 1. Defaults
        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("widget.endpoint", DEFAULT_ENDPOINT)?
            .set_default("widget.loading_policy", "first_settlement")?
            .set_default("session.idle_timeout_secs", 30 * 60)?
            .set_default("session.sweep_interval_secs", 60)?
            .set_default("ui.title", "🤖 Gemini AI Assistant")?
            .set_default("ui.htmx_src", "https://unpkg.com/htmx.org@2.0.8/dist/htmx.min.js")?
            .set_default("ui.htmx_sse_src", "https://unpkg.com/htmx-ext-sse@2.2.2/sse.js")?
            .set_default("ui.static_dir", "static")?
            .set_default("log.format", "compact")?;

        // 2. Config file: explicit path, else ./config.{yaml,toml,json} if present
        builder = match &cli.config {
            Some(path) => builder.add_source(File::from(Path::new(path)).required(true)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        // 3. Environment variables, e.g. GCW_SERVER__PORT=8000
        builder = builder.add_source(
            Environment::with_prefix("GCW")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // 4. CLI flags (and their plain env vars via clap) win over everything
        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(endpoint) = cli.endpoint {
            builder = builder.set_override("widget.endpoint", endpoint)?;
        }
        if let Some(policy) = cli.loading_policy {
            let policy: LoadingPolicy = policy.parse().map_err(config::ConfigError::Message)?;
            builder = builder.set_override("widget.loading_policy", policy.as_str())?;
        }
        if let Some(format) = cli.log_format {
            builder = builder.set_override("log.format", format)?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }

    /// `host:port` for the listener.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl WidgetConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl SessionConfig {
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags_override_defaults() {
        let config = AppConfig::load_from_args([
            "gemini-chat-widget",
            "--port",
            "4010",
            "--endpoint",
            "http://127.0.0.1:9/chat",
            "--loading-policy",
            "All-Settled",
        ])
        .unwrap();

        assert_eq!(config.server.port, 4010);
        assert_eq!(config.widget.endpoint.as_str(), "http://127.0.0.1:9/chat");
        assert_eq!(config.widget.loading_policy, LoadingPolicy::AllSettled);
        assert_eq!(config.widget.request_timeout(), None);
    }

    #[test]
    fn test_invalid_endpoint_is_rejected() {
        let result =
            AppConfig::load_from_args(["gemini-chat-widget", "--endpoint", "not a url"]);
        assert!(result.is_err());
    }
}
