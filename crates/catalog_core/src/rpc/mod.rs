//! Message-pattern RPC surface for the catalog.
//!
//! # Responsibility
//! - Map command names to catalog operations.
//! - Validate raw payloads at the boundary.
//! - Convert every failure into a status-coded JSON error body.
//!
//! # Invariants
//! - Invalid payloads never reach the store.
//! - Each dispatch is independent; the dispatcher holds no per-call state.

mod dispatcher;
pub mod dto;

pub use dispatcher::RpcDispatcher;

use crate::model::product::ProductValidationError;
use crate::service::product_catalog::CatalogError;
use serde_json::{json, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Commands understood by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    CreateProduct,
    FindAllProducts,
    FindProductById,
    UpdateProduct,
    DeleteProduct,
    RestoreProduct,
    ValidateIds,
}

impl Command {
    pub const ALL: [Command; 7] = [
        Command::CreateProduct,
        Command::FindAllProducts,
        Command::FindProductById,
        Command::UpdateProduct,
        Command::DeleteProduct,
        Command::RestoreProduct,
        Command::ValidateIds,
    ];

    /// Wire name matched against the request's `pattern.cmd`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateProduct => "create_Product",
            Self::FindAllProducts => "findall_Product",
            Self::FindProductById => "findById_Product",
            Self::UpdateProduct => "update_Product",
            Self::DeleteProduct => "delete_Product",
            Self::RestoreProduct => "restore_Product",
            Self::ValidateIds => "validate_id",
        }
    }
}

impl FromStr for Command {
    type Err = RpcError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|command| command.as_str() == value)
            .ok_or_else(|| RpcError::UnknownCommand(value.to_string()))
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure returned to RPC callers.
#[derive(Debug)]
pub enum RpcError {
    /// No handler registered for the command name.
    UnknownCommand(String),
    /// Payload shape does not match the command.
    InvalidPayload(String),
    /// Payload decoded but violates product invariants.
    Validation(ProductValidationError),
    /// Catalog operation failed.
    Catalog(CatalogError),
    /// Result could not be encoded.
    Encode(serde_json::Error),
}

impl RpcError {
    /// HTTP-style status carried in the error body.
    pub fn status(&self) -> u16 {
        match self {
            Self::UnknownCommand(_) => 404,
            Self::InvalidPayload(_) | Self::Validation(_) => 400,
            Self::Catalog(CatalogError::NotFound(_)) => 404,
            Self::Catalog(CatalogError::ProductsNotFound { .. })
            | Self::Catalog(CatalogError::Validation(_)) => 400,
            Self::Catalog(CatalogError::Repo(_)) | Self::Encode(_) => 500,
        }
    }

    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownCommand(_) => "unknown_command",
            Self::InvalidPayload(_) | Self::Validation(_) => "validation",
            Self::Catalog(CatalogError::NotFound(_)) => "not_found",
            Self::Catalog(CatalogError::ProductsNotFound { .. }) => "bulk_validation",
            Self::Catalog(CatalogError::Validation(_)) => "validation",
            Self::Catalog(CatalogError::Repo(_)) => "store",
            Self::Encode(_) => "encode",
        }
    }

    /// JSON body sent back in the `err` field of a response.
    pub fn to_body(&self) -> Value {
        let mut body = json!({
            "status": self.status(),
            "error": self.kind(),
            "message": self.to_string(),
        });
        if let Self::Catalog(CatalogError::ProductsNotFound { missing }) = self {
            body["missingIds"] = json!(missing);
        }
        body
    }
}

impl Display for RpcError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownCommand(command) => write!(f, "no handler for command `{command}`"),
            Self::InvalidPayload(message) => write!(f, "invalid payload: {message}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Catalog(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode response: {err}"),
        }
    }
}

impl Error for RpcError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Catalog(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::UnknownCommand(_) | Self::InvalidPayload(_) => None,
        }
    }
}

impl From<ProductValidationError> for RpcError {
    fn from(value: ProductValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<CatalogError> for RpcError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{Command, RpcError};
    use crate::service::product_catalog::CatalogError;

    #[test]
    fn command_names_round_trip() {
        for command in Command::ALL {
            assert_eq!(command.as_str().parse::<Command>().unwrap(), command);
        }
        assert!(matches!(
            "drop_Product".parse::<Command>(),
            Err(RpcError::UnknownCommand(_))
        ));
    }

    #[test]
    fn bulk_error_body_lists_missing_ids() {
        let err = RpcError::from(CatalogError::ProductsNotFound {
            missing: vec![4, 9],
        });
        let body = err.to_body();
        assert_eq!(body["status"], 400);
        assert_eq!(body["message"], "some products not found");
        assert_eq!(body["missingIds"], serde_json::json!([4, 9]));
    }

    #[test]
    fn not_found_body_embeds_id() {
        let body = RpcError::from(CatalogError::NotFound(7)).to_body();
        assert_eq!(body["status"], 404);
        assert_eq!(body["message"], "Product with 7 not found");
    }
}
