//! Core domain logic for the product catalog service.
//! This crate owns product invariants, store access and the RPC command surface.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod rpc;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::product::{
    NewProduct, PageMeta, PageRequest, Product, ProductId, ProductPage, ProductPatch,
    ProductValidationError,
};
pub use repo::product_repo::{
    ProductListQuery, ProductRepository, RepoError, RepoResult, SqliteProductRepository,
};
pub use rpc::{Command, RpcDispatcher, RpcError};
pub use service::product_catalog::{CatalogError, CatalogResult, ProductCatalog};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
