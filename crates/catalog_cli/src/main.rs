//! Catalog service entry point.
//!
//! # Responsibility
//! - Validate configuration before touching the store.
//! - Open the store once at startup and close it on the way out.
//! - Serve catalog RPC messages over TCP.

mod config;
mod server;

use anyhow::{anyhow, Context, Result};
use catalog_core::db::close_db;
use catalog_core::{core_version, init_logging, SqliteProductRepository};
use config::ServiceConfig;
use log::{error, info, warn};
use std::net::TcpListener;
use std::sync::{Arc, Mutex, PoisonError};

fn main() -> Result<()> {
    let config = ServiceConfig::load().unwrap_or_else(|err| err.exit());
    let location = config.validate().context("Config validation error")?;

    init_logging(config.log_level(), config.log_dir.as_deref())
        .map_err(|err| anyhow!(err))
        .context("failed to initialize logging")?;
    info!(
        "event=service_start module=cli status=start version={} addr={}",
        core_version(),
        config.socket_addr()
    );

    let conn = location.open().context("failed to open product store")?;
    SqliteProductRepository::try_new(&conn).context("product store is not ready")?;

    let listener = TcpListener::bind(config.socket_addr())
        .with_context(|| format!("failed to bind {}", config.socket_addr()))?;
    info!(
        "event=service_start module=cli status=ok addr={}",
        config.socket_addr()
    );

    let store = Arc::new(Mutex::new(conn));
    let served = server::serve(listener, Arc::clone(&store));
    if let Err(err) = &served {
        error!("event=service_stop module=cli status=error error={err:#}");
    }

    match Arc::try_unwrap(store) {
        Ok(store) => {
            let conn = store.into_inner().unwrap_or_else(PoisonError::into_inner);
            close_db(conn).context("failed to close product store")?;
        }
        Err(_) => warn!("event=db_close module=cli status=skipped reason=clients_connected"),
    }

    served
}
