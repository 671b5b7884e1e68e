//! Product repository for the local catalog mirror.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, QueryBuilder};

use mangaba_core::{Money, ProductId};

use super::RepositoryError;
use crate::models::product::Product;

/// Default page size for catalog listings.
pub const DEFAULT_PAGE_SIZE: u32 = 24;

/// Maximum page size a client may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Filter and pagination options for catalog listings.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Restrict to one category.
    pub category: Option<String>,
    /// Case-insensitive substring match on the product name.
    pub search: Option<String>,
    /// 1-based page number; 0 is treated as 1.
    pub page: u32,
    /// Items per page; 0 falls back to [`DEFAULT_PAGE_SIZE`].
    pub per_page: u32,
}

impl ProductFilter {
    fn limit(&self) -> i64 {
        let per_page = match self.per_page {
            0 => DEFAULT_PAGE_SIZE,
            n => n.min(MAX_PAGE_SIZE),
        };
        i64::from(per_page)
    }

    fn offset(&self) -> i64 {
        let page = self.page.max(1);
        i64::from(page - 1) * self.limit()
    }
}

/// Internal row type for product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: Option<String>,
    price: i64,
    image: Option<String>,
    category: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: Money::from_minor_units(row.price),
            image: row.image,
            category: row.category,
            created_at: row.created_at,
        }
    }
}

/// Repository for catalog product operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching the filter, name-ordered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let mut builder: QueryBuilder<'_, sqlx::Postgres> = QueryBuilder::new(
            "SELECT id, name, description, price, image, category, created_at FROM products",
        );

        let mut has_where = false;
        if let Some(category) = &filter.category {
            builder.push(" WHERE category = ").push_bind(category);
            has_where = true;
        }
        if let Some(search) = &filter.search {
            builder.push(if has_where { " AND " } else { " WHERE " });
            builder
                .push("name ILIKE ")
                .push_bind(format!("%{search}%"));
        }

        builder.push(" ORDER BY name LIMIT ");
        builder.push_bind(filter.limit());
        builder.push(" OFFSET ");
        builder.push_bind(filter.offset());

        let rows: Vec<ProductRow> = builder.build_query_as().fetch_all(self.pool).await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Get a product by its provider ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> = sqlx::query_as(
            r"
            SELECT id, name, description, price, image, category, created_at
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Insert or refresh a mirrored product row (used by catalog sync/seed).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        id: &ProductId,
        name: &str,
        description: Option<&str>,
        price: Money,
        image: Option<&str>,
        category: Option<&str>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO products (id, name, description, price, image, category)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                image = EXCLUDED.image,
                category = EXCLUDED.category
            ",
        )
        .bind(id.as_str())
        .bind(name)
        .bind(description)
        .bind(price.minor_units())
        .bind(image)
        .bind(category)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_defaults() {
        let filter = ProductFilter::default();
        assert_eq!(filter.limit(), i64::from(DEFAULT_PAGE_SIZE));
        assert_eq!(filter.offset(), 0);
    }

    #[test]
    fn test_filter_pagination() {
        let filter = ProductFilter {
            page: 3,
            per_page: 10,
            ..ProductFilter::default()
        };
        assert_eq!(filter.limit(), 10);
        assert_eq!(filter.offset(), 20);
    }

    #[test]
    fn test_filter_caps_page_size() {
        let filter = ProductFilter {
            per_page: 10_000,
            ..ProductFilter::default()
        };
        assert_eq!(filter.limit(), i64::from(MAX_PAGE_SIZE));
    }
}
