use anyhow::Context;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    /// Directory scanned for endpoint groups, one subdirectory each.
    pub api_dir: PathBuf,
    /// Dotted prefix used to name router modules in logs, e.g. `app.api`.
    pub api_package: String,
    pub log_dir: PathBuf,
    pub bootstrap_timeout: Duration,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://firewatch.db?mode=rwc".into());
        let api_dir = match std::env::var("API_DIR") {
            Ok(v) => PathBuf::from(v),
            Err(_) => exe_dir()?.join("api"),
        };
        let api_package = std::env::var("API_PACKAGE").unwrap_or_else(|_| "app.api".into());
        let log_dir = match std::env::var("LOG_DIR") {
            Ok(v) => PathBuf::from(v),
            Err(_) => exe_dir()?.join("log"),
        };
        let bootstrap_timeout = Duration::from_secs(
            std::env::var("BOOTSTRAP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30),
        );
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = std::env::var("APP_PORT").unwrap_or_else(|_| "8000".into());
        let bind_addr = parse_bind_addr(&host, &port)?;
        Ok(Self {
            database_url,
            api_dir,
            api_package,
            log_dir,
            bootstrap_timeout,
            bind_addr,
        })
    }
}

/// Directory holding the running executable. `api` and `log` live next to it
/// unless `API_DIR` / `LOG_DIR` say otherwise.
fn exe_dir() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    Ok(exe
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".")))
}

fn parse_bind_addr(host: &str, port: &str) -> anyhow::Result<SocketAddr> {
    format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid APP_HOST/APP_PORT: {host}:{port}"))
}
