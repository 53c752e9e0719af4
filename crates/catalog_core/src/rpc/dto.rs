//! Boundary payload shapes for catalog RPC commands.
//!
//! # Responsibility
//! - Decode raw JSON payloads into typed catalog inputs.
//! - Reject malformed input before it reaches the catalog or the store.
//!
//! # Invariants
//! - `price` must be a JSON number with at most four decimal places.
//! - Ids addressed by `findById_Product`, `delete_Product` and
//!   `restore_Product` may be numbers or numeric strings.

use super::RpcError;
use crate::model::product::{NewProduct, PageRequest, ProductId, ProductPatch};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Number, Value};
use std::str::FromStr;

/// Id as sent by callers: either a JSON number or a string-encoded integer.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(ProductId),
    Text(String),
}

impl RawId {
    fn resolve(self) -> Result<ProductId, RpcError> {
        match self {
            Self::Int(id) => Ok(id),
            Self::Text(text) => text.trim().parse::<ProductId>().map_err(|_| {
                RpcError::InvalidPayload(format!("id must be an integer, got `{text}`"))
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateProductDto {
    name: String,
    price: Number,
}

#[derive(Debug, Deserialize)]
struct UpdateProductDto {
    id: RawId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    price: Option<Number>,
    #[serde(default)]
    available: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct PaginationDto {
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct IdDto {
    id: RawId,
}

#[derive(Debug, Deserialize)]
struct ValidateIdsDto {
    #[serde(alias = "id")]
    ids: Vec<ProductId>,
}

/// Decodes a `create_Product` payload.
pub fn parse_create(payload: Value) -> Result<NewProduct, RpcError> {
    let dto: CreateProductDto = decode(payload)?;
    let price = parse_price(&dto.price)?;
    Ok(NewProduct::new(dto.name, price)?)
}

/// Decodes a `findall_Product` payload. Missing fields fall back to page 1, limit 10.
pub fn parse_pagination(payload: Value) -> Result<PageRequest, RpcError> {
    let dto: PaginationDto = if payload.is_null() {
        PaginationDto::default()
    } else {
        decode(payload)?
    };

    let defaults = PageRequest::default();
    Ok(PageRequest::new(
        dto.page.unwrap_or(defaults.page.get()),
        dto.limit.unwrap_or(defaults.limit.get()),
    )?)
}

/// Decodes a payload carrying a single `id`.
pub fn parse_id(payload: Value) -> Result<ProductId, RpcError> {
    let dto: IdDto = decode(payload)?;
    dto.id.resolve()
}

/// Decodes an `update_Product` payload, splitting off the target id.
pub fn parse_update(payload: Value) -> Result<(ProductId, ProductPatch), RpcError> {
    let dto: UpdateProductDto = decode(payload)?;
    let id = dto.id.resolve()?;
    let patch = ProductPatch {
        name: dto.name,
        price: dto.price.as_ref().map(parse_price).transpose()?,
        available: dto.available,
    };
    patch.validate()?;
    Ok((id, patch))
}

/// Decodes a `validate_id` payload.
pub fn parse_ids(payload: Value) -> Result<Vec<ProductId>, RpcError> {
    let dto: ValidateIdsDto = decode(payload)?;
    Ok(dto.ids)
}

fn decode<T: DeserializeOwned>(payload: Value) -> Result<T, RpcError> {
    serde_json::from_value(payload).map_err(|err| RpcError::InvalidPayload(err.to_string()))
}

fn parse_price(value: &Number) -> Result<Decimal, RpcError> {
    let text = value.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| RpcError::InvalidPayload(format!("price `{text}` is not a valid decimal")))
}
