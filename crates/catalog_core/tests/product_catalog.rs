use catalog_core::db::{open_db_in_memory, DbError};
use catalog_core::{
    CatalogError, NewProduct, PageRequest, Product, ProductCatalog, ProductId, ProductListQuery,
    ProductPatch, ProductRepository, RepoError, RepoResult, SqliteProductRepository,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::str::FromStr;

fn price(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

fn catalog(conn: &Connection) -> ProductCatalog<SqliteProductRepository<'_>> {
    ProductCatalog::new(SqliteProductRepository::try_new(conn).unwrap())
}

fn create(catalog: &ProductCatalog<SqliteProductRepository<'_>>, name: &str) -> Product {
    catalog
        .create(&NewProduct::new(name, price("10")).unwrap())
        .unwrap()
}

fn ids(products: &[Product]) -> Vec<ProductId> {
    products.iter().map(|product| product.id).collect()
}

#[test]
fn create_then_find_one_returns_live_product() {
    let conn = open_db_in_memory().unwrap();
    let catalog = catalog(&conn);

    let created = catalog
        .create(&NewProduct::new("Monitor", price("199.9950")).unwrap())
        .unwrap();
    let found = catalog.find_one(created.id).unwrap();

    assert!(found.is_live());
    assert_eq!(found.name, "Monitor");
    assert_eq!(found.price, price("199.995"));
}

#[test]
fn remove_hides_product_from_find_one_but_not_from_validate_ids() {
    let conn = open_db_in_memory().unwrap();
    let catalog = catalog(&conn);
    let product = create(&catalog, "Stapler");

    let removed = catalog.remove(product.id).unwrap();
    assert!(!removed.available);
    assert_eq!(removed.name, "Stapler");

    let err = catalog.find_one(product.id).unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(id) if id == product.id));
    assert_eq!(err.to_string(), format!("Product with {} not found", product.id));

    let validated = catalog.validate_ids(&[product.id]).unwrap();
    assert_eq!(ids(&validated), vec![product.id]);
}

#[test]
fn find_all_reports_totals_and_last_page() {
    let conn = open_db_in_memory().unwrap();
    let catalog = catalog(&conn);
    for index in 0..7 {
        create(&catalog, &format!("item-{index}"));
    }

    for limit in 1..=8 {
        for page in 1..=9 {
            let result = catalog
                .find_all(&PageRequest::new(page, limit).unwrap())
                .unwrap();
            assert!(result.data.len() <= limit as usize);
            assert_eq!(result.meta.total, 7);
            assert_eq!(result.meta.last_page, 7_u64.div_ceil(u64::from(limit)));
            assert_eq!(result.meta.pages, result.meta.last_page);
        }
    }
}

#[test]
fn find_all_on_empty_store_has_zero_pages() {
    let conn = open_db_in_memory().unwrap();
    let catalog = catalog(&conn);

    let result = catalog.find_all(&PageRequest::default()).unwrap();
    assert!(result.data.is_empty());
    assert_eq!(result.meta.total, 0);
    assert_eq!(result.meta.last_page, 0);
}

#[test]
fn find_all_past_last_page_is_empty_not_an_error() {
    let conn = open_db_in_memory().unwrap();
    let catalog = catalog(&conn);
    create(&catalog, "solo");

    let result = catalog.find_all(&PageRequest::new(5, 10).unwrap()).unwrap();
    assert!(result.data.is_empty());
    assert_eq!(result.meta.total, 1);
    assert_eq!(result.meta.last_page, 1);
}

#[test]
fn validate_ids_collapses_duplicates() {
    let conn = open_db_in_memory().unwrap();
    let catalog = catalog(&conn);
    let first = create(&catalog, "first");
    let second = create(&catalog, "second");

    let with_duplicates = catalog
        .validate_ids(&[first.id, first.id, second.id])
        .unwrap();
    let without = catalog.validate_ids(&[first.id, second.id]).unwrap();
    assert_eq!(with_duplicates, without);
    assert_eq!(with_duplicates.len(), 2);
}

#[test]
fn validate_ids_fails_when_any_id_is_unknown_and_names_it() {
    let conn = open_db_in_memory().unwrap();
    let catalog = catalog(&conn);
    let first = create(&catalog, "first");
    let second = create(&catalog, "second");

    let err = catalog
        .validate_ids(&[first.id, 900, second.id, 901, 900])
        .unwrap_err();
    assert_eq!(err.to_string(), "some products not found");
    match err {
        CatalogError::ProductsNotFound { missing } => assert_eq!(missing, vec![900, 901]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn update_and_remove_on_missing_id_are_translated_to_not_found() {
    let conn = open_db_in_memory().unwrap();
    let catalog = catalog(&conn);

    let patch = ProductPatch {
        name: Some("ghost".to_string()),
        ..ProductPatch::default()
    };
    assert!(matches!(
        catalog.update(77, &patch),
        Err(CatalogError::NotFound(77))
    ));
    assert!(matches!(catalog.remove(77), Err(CatalogError::NotFound(77))));
    assert!(matches!(catalog.restore(77), Err(CatalogError::NotFound(77))));
}

#[test]
fn restore_brings_removed_product_back() {
    let conn = open_db_in_memory().unwrap();
    let catalog = catalog(&conn);
    let product = create(&catalog, "Globe");

    catalog.remove(product.id).unwrap();
    let restored = catalog.restore(product.id).unwrap();
    assert!(restored.available);
    assert_eq!(catalog.find_one(product.id).unwrap().id, product.id);
}

#[test]
fn mixed_availability_scenario() {
    let conn = open_db_in_memory().unwrap();
    let catalog = catalog(&conn);
    let one = create(&catalog, "one");
    let two = create(&catalog, "two");
    let three = create(&catalog, "three");
    catalog.remove(two.id).unwrap();

    let page = catalog.find_all(&PageRequest::new(1, 10).unwrap()).unwrap();
    assert_eq!(ids(&page.data), vec![one.id, three.id]);
    assert_eq!(page.meta.total, 2);
    assert_eq!(page.meta.last_page, 1);

    let all = catalog.validate_ids(&[one.id, two.id, three.id]).unwrap();
    assert_eq!(all.len(), 3);

    let absent = three.id + 1;
    assert!(matches!(
        catalog.validate_ids(&[one.id, two.id, absent]),
        Err(CatalogError::ProductsNotFound { .. })
    ));

    assert!(matches!(
        catalog.find_one(two.id),
        Err(CatalogError::NotFound(_))
    ));

    let revived = catalog
        .update(
            two.id,
            &ProductPatch {
                available: Some(true),
                ..ProductPatch::default()
            },
        )
        .unwrap();
    assert!(revived.available);
    assert_eq!(catalog.find_one(two.id).unwrap().name, "two");
}

#[test]
fn update_without_available_keeps_retired_product_retired() {
    let conn = open_db_in_memory().unwrap();
    let catalog = catalog(&conn);
    let product = create(&catalog, "Easel");
    catalog.remove(product.id).unwrap();

    let renamed = catalog
        .update(
            product.id,
            &ProductPatch {
                name: Some("Studio easel".to_string()),
                ..ProductPatch::default()
            },
        )
        .unwrap();
    assert_eq!(renamed.name, "Studio easel");
    assert!(!renamed.available);

    assert!(matches!(
        catalog.find_one(product.id),
        Err(CatalogError::NotFound(_))
    ));
    let stored = catalog.validate_ids(&[product.id]).unwrap();
    assert_eq!(stored[0].name, "Studio easel");
}

/// Store stub whose every call fails like a dropped connection.
struct OfflineStore;

impl OfflineStore {
    fn failure<T>() -> RepoResult<T> {
        Err(RepoError::Db(DbError::Sqlite(
            rusqlite::Error::InvalidQuery,
        )))
    }
}

impl ProductRepository for OfflineStore {
    fn create_product(&self, _input: &NewProduct) -> RepoResult<Product> {
        Self::failure()
    }

    fn get_product(&self, _id: ProductId, _include_retired: bool) -> RepoResult<Option<Product>> {
        Self::failure()
    }

    fn list_products(&self, _query: &ProductListQuery) -> RepoResult<Vec<Product>> {
        Self::failure()
    }

    fn count_products(&self, _include_retired: bool) -> RepoResult<u64> {
        Self::failure()
    }

    fn update_product(&self, _id: ProductId, _patch: &ProductPatch) -> RepoResult<Product> {
        Self::failure()
    }

    fn set_available(&self, _id: ProductId, _available: bool) -> RepoResult<Product> {
        Self::failure()
    }

    fn find_products_by_ids(&self, _ids: &[ProductId]) -> RepoResult<Vec<Product>> {
        Self::failure()
    }
}

#[test]
fn store_failures_propagate_untranslated() {
    let catalog = ProductCatalog::new(OfflineStore);

    assert!(matches!(
        catalog.find_all(&PageRequest::default()),
        Err(CatalogError::Repo(RepoError::Db(_)))
    ));
    assert!(matches!(
        catalog.find_one(1),
        Err(CatalogError::Repo(RepoError::Db(_)))
    ));
    assert!(matches!(
        catalog.validate_ids(&[1, 2]),
        Err(CatalogError::Repo(RepoError::Db(_)))
    ));
}
