//! Row writers.
//!
//! [`PgRowWriter`] inserts rows into PostgreSQL; the trait lets the insert
//! loop run against other destinations.

use std::future::Future;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::error::LoadgenError;
use crate::row::HttpResponseRow;

/// Insert statement for one `http_response` row.
pub const INSERT_HTTP_RESPONSE: &str =
    "INSERT INTO http_response (ts, node_tag, src_ip, src_port, code) VALUES ($1, $2, $3, $4, $5)";

/// Destination for generated rows.
pub trait RowWriter {
    /// Inserts and commits one row.
    fn insert(
        &mut self,
        row: &HttpResponseRow,
    ) -> impl Future<Output = Result<(), LoadgenError>> + Send;
}

/// Writer inserting into PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgRowWriter {
    pool: PgPool,
}

impl PgRowWriter {
    /// Connects to the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub async fn connect(database_url: &str) -> Result<Self, LoadgenError> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Creates a writer on an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Closes the underlying pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl RowWriter for PgRowWriter {
    async fn insert(&mut self, row: &HttpResponseRow) -> Result<(), LoadgenError> {
        sqlx::query(INSERT_HTTP_RESPONSE)
            .bind(row.ts)
            .bind(&row.node_tag)
            .bind(&row.src_ip)
            .bind(&row.src_port)
            .bind(&row.code)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
