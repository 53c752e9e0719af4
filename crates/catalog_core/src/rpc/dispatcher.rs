//! Command routing from RPC messages to catalog operations.

use super::{dto, Command, RpcError};
use crate::repo::product_repo::ProductRepository;
use crate::service::product_catalog::ProductCatalog;
use log::{error, info, warn};
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

/// Routes `(command, payload)` pairs to one `ProductCatalog`.
pub struct RpcDispatcher<R: ProductRepository> {
    catalog: ProductCatalog<R>,
}

impl<R: ProductRepository> RpcDispatcher<R> {
    pub fn new(catalog: ProductCatalog<R>) -> Self {
        Self { catalog }
    }

    /// Resolves the command name and runs it.
    ///
    /// # Errors
    /// - `UnknownCommand` when no handler matches `command`.
    /// - Any failure from [`RpcDispatcher::handle`].
    pub fn dispatch(&self, command: &str, payload: Value) -> Result<Value, RpcError> {
        let command = match command.parse::<Command>() {
            Ok(command) => command,
            Err(err) => {
                warn!("event=rpc_dispatch module=rpc status=error cmd={command} error_code=unknown_command");
                return Err(err);
            }
        };

        let started_at = Instant::now();
        let result = self.handle(command, payload);
        let duration_ms = started_at.elapsed().as_millis();

        match &result {
            Ok(_) => info!(
                "event=rpc_dispatch module=rpc status=ok cmd={command} duration_ms={duration_ms}"
            ),
            Err(err) if err.status() >= 500 => error!(
                "event=rpc_dispatch module=rpc status=error cmd={} duration_ms={} error_code={} error={}",
                command,
                duration_ms,
                err.kind(),
                err
            ),
            Err(err) => warn!(
                "event=rpc_dispatch module=rpc status=rejected cmd={} duration_ms={} error_code={} status_code={}",
                command,
                duration_ms,
                err.kind(),
                err.status()
            ),
        }

        result
    }

    /// Runs one typed command against the catalog.
    pub fn handle(&self, command: Command, payload: Value) -> Result<Value, RpcError> {
        match command {
            Command::CreateProduct => {
                let input = dto::parse_create(payload)?;
                encode(&self.catalog.create(&input)?)
            }
            Command::FindAllProducts => {
                let page = dto::parse_pagination(payload)?;
                encode(&self.catalog.find_all(&page)?)
            }
            Command::FindProductById => {
                let id = dto::parse_id(payload)?;
                encode(&self.catalog.find_one(id)?)
            }
            Command::UpdateProduct => {
                let (id, patch) = dto::parse_update(payload)?;
                encode(&self.catalog.update(id, &patch)?)
            }
            Command::DeleteProduct => {
                let id = dto::parse_id(payload)?;
                encode(&self.catalog.remove(id)?)
            }
            Command::RestoreProduct => {
                let id = dto::parse_id(payload)?;
                encode(&self.catalog.restore(id)?)
            }
            Command::ValidateIds => {
                let ids = dto::parse_ids(payload)?;
                encode(&self.catalog.validate_ids(&ids)?)
            }
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Value, RpcError> {
    Ok(serde_json::to_value(value)?)
}
