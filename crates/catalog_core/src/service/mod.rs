//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep RPC/transport layers decoupled from storage details.

pub mod product_catalog;
