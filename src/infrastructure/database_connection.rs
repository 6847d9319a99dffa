// Database connection and pool management
// This module handles SQLite database connections using sqlx

use std::path::Path;
use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use crate::infrastructure::product_repository::StoreError;

pub struct DatabaseConnection {
    pool: SqlitePool,
}

impl DatabaseConnection {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let db_path = database_url
            .strip_prefix("sqlite://")
            .or_else(|| database_url.strip_prefix("sqlite:"))
            .unwrap_or(database_url);
        let db_path = db_path.split('?').next().unwrap_or(db_path);

        if db_path != ":memory:" {
            if let Some(parent) = Path::new(db_path).parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        info!("Connected to database {}", database_url);
        Ok(Self { pool })
    }

    /// Private in-memory database; a single connection that never recycles so
    /// the data lives as long as the pool
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        let create_products_sql = r#"
            CREATE TABLE IF NOT EXISTS products (
                id TEXT PRIMARY KEY,
                url TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                price TEXT NOT NULL,
                image_url TEXT,
                source TEXT NOT NULL,
                description TEXT,
                scraped_at TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
        "#;

        let create_indexes_sql = r#"
            CREATE INDEX IF NOT EXISTS idx_products_source ON products (source);
            CREATE INDEX IF NOT EXISTS idx_products_scraped_at ON products (scraped_at);
        "#;

        sqlx::query(create_products_sql).execute(&self.pool).await?;
        sqlx::raw_sql(create_indexes_sql).execute(&self.pool).await?;

        Ok(())
    }
}
