//! Product upsert store
//!
//! Products are unique by source URL. The upsert is a single
//! `INSERT .. ON CONFLICT(url) DO UPDATE` statement, so concurrent writers can
//! never produce two rows for one URL, and `id`/`created_at` survive updates.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{ProductDraft, ProductRecord, SourceName};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt product row for {url}: {reason}")]
    CorruptRow { url: String, reason: String },
}

/// Keyed create-or-update store for products
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Create the record for `draft.url` or update the existing one
    async fn upsert_by_url(&self, draft: &ProductDraft) -> Result<ProductRecord, StoreError>;

    async fn find_by_url(&self, url: &str) -> Result<Option<ProductRecord>, StoreError>;

    async fn count(&self) -> Result<i64, StoreError>;
}

const PRODUCT_COLUMNS: &str =
    "id, url, title, price, image_url, source, description, scraped_at, created_at, updated_at";

pub struct SqliteProductRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteProductRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    fn row_to_record(row: &SqliteRow) -> Result<ProductRecord, StoreError> {
        let url: String = row.try_get("url")?;
        let price_text: String = row.try_get("price")?;
        let source_text: String = row.try_get("source")?;

        let price = Decimal::from_str(&price_text).map_err(|e| StoreError::CorruptRow {
            url: url.clone(),
            reason: format!("price '{price_text}': {e}"),
        })?;
        let source = SourceName::from_str(&source_text).map_err(|reason| StoreError::CorruptRow {
            url: url.clone(),
            reason,
        })?;

        Ok(ProductRecord {
            id: row.try_get("id")?,
            url,
            title: row.try_get("title")?,
            price,
            image_url: row.try_get("image_url")?,
            source,
            description: row.try_get("description")?,
            scraped_at: row.try_get("scraped_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl ProductStore for SqliteProductRepository {
    async fn upsert_by_url(&self, draft: &ProductDraft) -> Result<ProductRecord, StoreError> {
        let now = Utc::now();
        let sql = format!(
            r#"
            INSERT INTO products ({PRODUCT_COLUMNS})
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                price = excluded.price,
                image_url = excluded.image_url,
                source = excluded.source,
                description = excluded.description,
                scraped_at = excluded.scraped_at,
                updated_at = excluded.updated_at
            RETURNING {PRODUCT_COLUMNS}
            "#
        );

        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4().to_string())
            .bind(&draft.url)
            .bind(&draft.title)
            .bind(format!("{:.2}", draft.price))
            .bind(&draft.image_url)
            .bind(draft.source.as_str())
            .bind(&draft.description)
            .bind(now)
            .bind(now)
            .bind(now)
            .fetch_one(&*self.pool)
            .await?;

        let record = Self::row_to_record(&row)?;
        debug!("Upserted product {} ({})", record.url, record.id);
        Ok(record)
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<ProductRecord>, StoreError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE url = ?");
        let row = sqlx::query(&sql)
            .bind(url)
            .fetch_optional(&*self.pool)
            .await?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM products")
            .fetch_one(&*self.pool)
            .await?;
        Ok(row.try_get("count")?)
    }
}
