//! Product repository
//!
//! Software and website products share one table keyed by `kind`.

use crate::db::DynDatabasePool;
use crate::models::{CatalogFilter, ListParams, Product, ProductKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite};
use std::sync::Arc;

use super::{parse_column, push_catalog_filters};

const PRODUCT_COLUMNS: &str = "id, kind, slug, title, title_bn, description, thumbnail, price, \
    discount_price, preview_url, status, is_featured, is_popular, category_id, created_at, updated_at";

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn create(&self, product: &Product) -> Result<Product>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Product>>;

    /// Product of the given kind; a product of another kind is `None`
    async fn get_by_kind(&self, kind: ProductKind, id: i64) -> Result<Option<Product>>;

    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    async fn list(
        &self,
        kind: ProductKind,
        filter: &CatalogFilter,
        params: &ListParams,
    ) -> Result<(Vec<Product>, i64)>;

    async fn update(&self, product: &Product) -> Result<Product>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

pub struct SqlxProductRepository {
    pool: DynDatabasePool,
}

impl SqlxProductRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ProductRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ProductRepository for SqlxProductRepository {
    async fn create(&self, product: &Product) -> Result<Product> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO products (kind, slug, title, title_bn, description, thumbnail, price, discount_price,
                                  preview_url, status, is_featured, is_popular, category_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(product.kind.as_str())
        .bind(&product.slug)
        .bind(&product.title)
        .bind(&product.title_bn)
        .bind(&product.description)
        .bind(&product.thumbnail)
        .bind(product.price)
        .bind(product.discount_price)
        .bind(&product.preview_url)
        .bind(product.status.as_str())
        .bind(product.is_featured)
        .bind(product.is_popular)
        .bind(product.category_id)
        .bind(now)
        .bind(now)
        .execute(self.pool.pool())
        .await
        .context("Failed to create product")?;

        Ok(Product {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
            ..product.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ?", PRODUCT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await
            .context("Failed to get product by ID")?;
        row.map(|r| row_to_product(&r)).transpose()
    }

    async fn get_by_kind(&self, kind: ProductKind, id: i64) -> Result<Option<Product>> {
        Ok(self.get_by_id(id).await?.filter(|p| p.kind == kind))
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE slug = ?")
            .bind(slug)
            .fetch_one(self.pool.pool())
            .await
            .context("Failed to check product slug")?;
        Ok(count > 0)
    }

    async fn list(
        &self,
        kind: ProductKind,
        filter: &CatalogFilter,
        params: &ListParams,
    ) -> Result<(Vec<Product>, i64)> {
        let mut count_query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM products");
        push_catalog_filters(&mut count_query, filter, true, None);
        count_query.push(" AND kind = ").push_bind(kind.as_str());
        let total: i64 = count_query
            .build_query_scalar::<i64>()
            .fetch_one(self.pool.pool())
            .await
            .context("Failed to count products")?;

        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM products", PRODUCT_COLUMNS));
        push_catalog_filters(&mut query, filter, true, None);
        query
            .push(" AND kind = ")
            .push_bind(kind.as_str())
            .push(" ORDER BY ")
            .push(filter.sort.order_by())
            .push(" LIMIT ")
            .push_bind(params.limit())
            .push(" OFFSET ")
            .push_bind(params.offset());

        let rows = query
            .build()
            .fetch_all(self.pool.pool())
            .await
            .context("Failed to list products")?;

        let products = rows.iter().map(row_to_product).collect::<Result<Vec<_>>>()?;
        Ok((products, total))
    }

    async fn update(&self, product: &Product) -> Result<Product> {
        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE products SET slug = ?, title = ?, title_bn = ?, description = ?, thumbnail = ?,
                price = ?, discount_price = ?, preview_url = ?, status = ?, is_featured = ?,
                is_popular = ?, category_id = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&product.slug)
        .bind(&product.title)
        .bind(&product.title_bn)
        .bind(&product.description)
        .bind(&product.thumbnail)
        .bind(product.price)
        .bind(product.discount_price)
        .bind(&product.preview_url)
        .bind(product.status.as_str())
        .bind(product.is_featured)
        .bind(product.is_popular)
        .bind(product.category_id)
        .bind(now)
        .bind(product.id)
        .execute(self.pool.pool())
        .await
        .context("Failed to update product")?;

        Ok(Product {
            updated_at: now,
            ..product.clone()
        })
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(self.pool.pool())
            .await
            .context("Failed to delete product")?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product> {
    let kind: String = row.get("kind");
    let status: String = row.get("status");
    Ok(Product {
        id: row.get("id"),
        kind: parse_column(&kind, "kind")?,
        slug: row.get("slug"),
        title: row.get("title"),
        title_bn: row.get("title_bn"),
        description: row.get("description"),
        thumbnail: row.get("thumbnail"),
        price: row.get("price"),
        discount_price: row.get("discount_price"),
        preview_url: row.get("preview_url"),
        status: parse_column(&status, "status")?,
        is_featured: row.get("is_featured"),
        is_popular: row.get("is_popular"),
        category_id: row.get("category_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;
    use crate::models::{PublishStatus, SortOrder};

    fn product(kind: ProductKind, slug: &str, price: f64) -> Product {
        let now = Utc::now();
        Product {
            id: 0,
            kind,
            slug: slug.to_string(),
            title: slug.to_string(),
            title_bn: None,
            description: String::new(),
            thumbnail: None,
            price,
            discount_price: None,
            preview_url: None,
            status: PublishStatus::Published,
            is_featured: false,
            is_popular: false,
            category_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_list_is_scoped_by_kind() {
        let repo = SqlxProductRepository::new(migrated_pool().await);
        repo.create(&product(ProductKind::Software, "editor", 20.0)).await.unwrap();
        repo.create(&product(ProductKind::Software, "linter", 5.0)).await.unwrap();
        repo.create(&product(ProductKind::Website, "landing", 15.0)).await.unwrap();

        let filter = CatalogFilter {
            sort: SortOrder::PriceAsc,
            ..CatalogFilter::published()
        };
        let (items, total) = repo
            .list(ProductKind::Software, &filter, &ListParams::default())
            .await
            .unwrap();
        let slugs: Vec<&str> = items.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(total, 2);
        assert_eq!(slugs, vec!["linter", "editor"]);
    }

    #[tokio::test]
    async fn test_get_by_kind_rejects_other_kind() {
        let repo = SqlxProductRepository::new(migrated_pool().await);
        let site = repo.create(&product(ProductKind::Website, "landing", 15.0)).await.unwrap();

        assert!(repo.get_by_kind(ProductKind::Website, site.id).await.unwrap().is_some());
        assert!(repo.get_by_kind(ProductKind::Software, site.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = SqlxProductRepository::new(migrated_pool().await);
        let mut created = repo.create(&product(ProductKind::Software, "editor", 20.0)).await.unwrap();
        assert!(repo.exists_by_slug("editor").await.unwrap());

        created.discount_price = Some(12.5);
        created.preview_url = Some("https://demo.example.com".to_string());
        repo.update(&created).await.unwrap();

        let found = repo.get_by_id(created.id).await.unwrap().expect("product");
        assert_eq!(found.discount_price, Some(12.5));
        assert_eq!(found.preview_url.as_deref(), Some("https://demo.example.com"));

        assert!(repo.delete(created.id).await.unwrap());
        assert!(!repo.exists_by_slug("editor").await.unwrap());
    }
}
