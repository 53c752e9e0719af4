//! Product domain model.
//!
//! # Responsibility
//! - Define the canonical catalog record and its write-side inputs.
//! - Provide lifecycle helpers for soft-delete semantics.
//!
//! # Invariants
//! - `id` is assigned by storage and never changes.
//! - `name` is never empty after trimming.
//! - `price` is non-negative with at most `PRICE_MAX_SCALE` fractional digits.
//! - `available == false` is the only representation of removal.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::num::NonZeroU32;

/// Storage-assigned product identifier.
pub type ProductId = i64;

/// Maximum number of fractional digits accepted for `price`.
pub const PRICE_MAX_SCALE: u32 = 4;

const DEFAULT_PAGE: NonZeroU32 = NonZeroU32::MIN;
const DEFAULT_LIMIT: NonZeroU32 = match NonZeroU32::new(10) {
    Some(value) => value,
    None => unreachable!(),
};

/// Validation failures for product write inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductValidationError {
    /// Name is empty or whitespace only.
    EmptyName,
    /// Price is below zero.
    NegativePrice(Decimal),
    /// Price carries more fractional digits than allowed.
    PriceScale { scale: u32 },
    /// Page or limit is zero.
    InvalidPagination { page: u32, limit: u32 },
}

impl Display for ProductValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name must be a non-empty string"),
            Self::NegativePrice(price) => write!(f, "price must not be negative, got {price}"),
            Self::PriceScale { scale } => write!(
                f,
                "price must have at most {PRICE_MAX_SCALE} decimal places, got {scale}"
            ),
            Self::InvalidPagination { page, limit } => write!(
                f,
                "page and limit must be positive integers, got page={page} limit={limit}"
            ),
        }
    }
}

impl Error for ProductValidationError {}

/// Canonical catalog record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Serialized as a decimal string to keep the value exact.
    pub price: Decimal,
    /// Live flag. `false` means the product was removed.
    pub available: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds, bumped on every write.
    pub updated_at: i64,
}

impl Product {
    /// Returns whether this product is visible to list and fetch operations.
    pub fn is_live(&self) -> bool {
        self.available
    }
}

/// Input for inserting a new product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
}

impl NewProduct {
    /// Builds and validates a creation input.
    pub fn new(name: impl Into<String>, price: Decimal) -> Result<Self, ProductValidationError> {
        let product = Self {
            name: name.into(),
            price,
        };
        product.validate()?;
        Ok(product)
    }

    /// Checks name and price invariants.
    pub fn validate(&self) -> Result<(), ProductValidationError> {
        validate_name(&self.name)?;
        validate_price(self.price)
    }
}

/// Partial replacement of mutable product fields.
///
/// `None` leaves the stored value untouched. `id` is not part of the patch;
/// the target record is always addressed separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub available: Option<bool>,
}

impl ProductPatch {
    /// Returns `true` when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.available.is_none()
    }

    /// Checks invariants of the fields present in the patch.
    pub fn validate(&self) -> Result<(), ProductValidationError> {
        if let Some(name) = self.name.as_deref() {
            validate_name(name)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        Ok(())
    }
}

/// One-based page request for live product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: NonZeroU32,
    pub limit: NonZeroU32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Builds a page request, rejecting zero page or limit.
    pub fn new(page: u32, limit: u32) -> Result<Self, ProductValidationError> {
        match (NonZeroU32::new(page), NonZeroU32::new(limit)) {
            (Some(page), Some(limit)) => Ok(Self { page, limit }),
            _ => Err(ProductValidationError::InvalidPagination { page, limit }),
        }
    }

    /// Number of rows skipped before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.get() - 1) * u64::from(self.limit.get())
    }

    /// Number of pages needed for `total` rows (`0` when `total == 0`).
    pub fn page_count(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.limit.get()))
    }
}

/// Pagination metadata returned with a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Live products in storage.
    pub total: u64,
    /// Same value as `last_page`, kept for wire compatibility.
    pub pages: u64,
    pub last_page: u64,
}

/// One page of live products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPage {
    pub data: Vec<Product>,
    pub meta: PageMeta,
}

fn validate_name(name: &str) -> Result<(), ProductValidationError> {
    if name.trim().is_empty() {
        return Err(ProductValidationError::EmptyName);
    }
    Ok(())
}

fn validate_price(price: Decimal) -> Result<(), ProductValidationError> {
    if price < Decimal::ZERO {
        return Err(ProductValidationError::NegativePrice(price));
    }
    // Trailing zeros do not count as decimal places.
    let scale = price.normalize().scale();
    if scale > PRICE_MAX_SCALE {
        return Err(ProductValidationError::PriceScale { scale });
    }
    Ok(())
}
