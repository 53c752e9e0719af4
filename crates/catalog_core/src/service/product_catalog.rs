//! Product catalog use-case service.
//!
//! # Responsibility
//! - Own every product lifecycle operation exposed to RPC callers.
//! - Compute pagination metadata and bulk existence checks.
//! - Translate repository misses into catalog-level `NotFound` errors.
//!
//! # Invariants
//! - Listing and single fetch only see live (`available = true`) products.
//! - `update` and `validate_ids` ignore availability.
//! - Removal never deletes rows; it only clears `available`.

use crate::model::product::{
    NewProduct, PageMeta, PageRequest, Product, ProductId, ProductPage, ProductPatch,
    ProductValidationError,
};
use crate::repo::product_repo::{ProductListQuery, ProductRepository, RepoError};
use log::{debug, warn};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Service error for catalog use-cases.
#[derive(Debug)]
pub enum CatalogError {
    /// No live product (for reads) or no product at all (for writes).
    NotFound(ProductId),
    /// Bulk validation found fewer products than distinct requested ids.
    ProductsNotFound { missing: Vec<ProductId> },
    /// Input rejected by model invariants.
    Validation(ProductValidationError),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "Product with {id} not found"),
            Self::ProductsNotFound { .. } => write!(f, "some products not found"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CatalogError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ProductValidationError> for CatalogError {
    fn from(value: ProductValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Catalog facade over a product store.
pub struct ProductCatalog<R: ProductRepository> {
    repo: R,
}

impl<R: ProductRepository> ProductCatalog<R> {
    /// Creates a catalog using the provided store implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Inserts a new live product and returns it with its assigned id.
    pub fn create(&self, input: &NewProduct) -> CatalogResult<Product> {
        let product = self.repo.create_product(input)?;
        debug!(
            "event=product_create module=catalog status=ok product_id={}",
            product.id
        );
        Ok(product)
    }

    /// Returns one page of live products plus totals.
    ///
    /// Pages past the end yield empty `data` with the real totals.
    pub fn find_all(&self, page: &PageRequest) -> CatalogResult<ProductPage> {
        let total = self.repo.count_products(false)?;
        let last_page = page.page_count(total);

        let data = self.repo.list_products(&ProductListQuery {
            include_retired: false,
            limit: Some(page.limit.get()),
            offset: page.offset(),
        })?;

        Ok(ProductPage {
            data,
            meta: PageMeta {
                total,
                pages: last_page,
                last_page,
            },
        })
    }

    /// Gets one live product by id.
    pub fn find_one(&self, id: ProductId) -> CatalogResult<Product> {
        self.repo
            .get_product(id, false)?
            .ok_or(CatalogError::NotFound(id))
    }

    /// Applies a partial update keyed by id.
    ///
    /// Retired products are updated too; passing `available: Some(true)`
    /// brings one back.
    pub fn update(&self, id: ProductId, patch: &ProductPatch) -> CatalogResult<Product> {
        let product = self.repo.update_product(id, patch)?;
        debug!(
            "event=product_update module=catalog status=ok product_id={} available={}",
            product.id, product.available
        );
        Ok(product)
    }

    /// Soft-deletes a product by clearing `available`.
    pub fn remove(&self, id: ProductId) -> CatalogResult<Product> {
        let product = self.repo.set_available(id, false)?;
        debug!("event=product_remove module=catalog status=ok product_id={id}");
        Ok(product)
    }

    /// Brings a removed product back to live.
    pub fn restore(&self, id: ProductId) -> CatalogResult<Product> {
        let product = self.repo.set_available(id, true)?;
        debug!("event=product_restore module=catalog status=ok product_id={id}");
        Ok(product)
    }

    /// Checks that every requested id exists, live or retired.
    ///
    /// Duplicate ids are collapsed first. Returned products are ordered by id,
    /// not by input position.
    pub fn validate_ids(&self, ids: &[ProductId]) -> CatalogResult<Vec<Product>> {
        let requested: BTreeSet<ProductId> = ids.iter().copied().collect();
        let unique: Vec<ProductId> = requested.iter().copied().collect();

        let products = self.repo.find_products_by_ids(&unique)?;
        if products.len() != requested.len() {
            let found: BTreeSet<ProductId> = products.iter().map(|product| product.id).collect();
            let missing: Vec<ProductId> = requested.difference(&found).copied().collect();
            warn!(
                "event=product_validate module=catalog status=error requested={} missing={}",
                requested.len(),
                missing.len()
            );
            return Err(CatalogError::ProductsNotFound { missing });
        }

        Ok(products)
    }
}
