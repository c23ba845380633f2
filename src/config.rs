use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Directory holding the frontend's `index.html` and assets.
    pub frontend_dir: PathBuf,
    pub max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        Ok(Self {
            database_url,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("APP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(5000),
            frontend_dir: std::env::var("FRONTEND_DIR")
                .unwrap_or_else(|_| "frontend".into())
                .into(),
            max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
        })
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))?;
        Ok(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/users".into(),
            host: "127.0.0.1".into(),
            port: 5000,
            frontend_dir: "frontend".into(),
            max_connections: 10,
        }
    }

    #[test]
    fn bind_addr_joins_host_and_port() {
        let addr = sample().bind_addr().expect("valid address");
        assert_eq!(addr.to_string(), "127.0.0.1:5000");
    }

    #[test]
    fn bind_addr_rejects_garbage_host() {
        let mut cfg = sample();
        cfg.host = "not a host".into();
        assert!(cfg.bind_addr().is_err());
    }
}
