//! Service configuration.
//!
//! Values come from CLI flags, then environment variables, then `.env`.

use anyhow::{bail, Result};
use catalog_core::db::StoreLocation;
use catalog_core::default_log_level;
use clap::Parser;

/// Product catalog RPC service configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "catalog", about = "Product catalog RPC service", version)]
pub struct ServiceConfig {
    /// Address to bind the RPC listener on
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind the RPC listener on
    #[arg(short, long, env = "PORT")]
    pub port: u16,

    /// Store location: sqlite://<path>, file:<path>, a path, or :memory:
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rotated log files; stderr when unset
    #[arg(long, env = "LOG_DIR")]
    pub log_dir: Option<String>,
}

impl ServiceConfig {
    /// Loads `.env` (if present) and parses flags and environment.
    pub fn load() -> Result<Self, clap::Error> {
        _ = dotenvy::dotenv();
        Self::try_parse()
    }

    /// Checks values clap cannot check on its own.
    pub fn validate(&self) -> Result<StoreLocation> {
        if self.port == 0 {
            bail!("PORT must be between 1 and 65535");
        }
        if self.host.trim().is_empty() {
            bail!("HOST cannot be empty");
        }
        let location = StoreLocation::parse(&self.database_url)?;
        Ok(location)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
