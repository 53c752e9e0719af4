//! Catalog domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - Every product is identified by a storage-assigned `ProductId`.
//! - Deletion is represented by `available = false`, not hard delete.

pub mod product;
