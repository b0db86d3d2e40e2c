use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    AuditLogError, AuditQuery, AuditRecord, PartitionKey, Result, SortKey, SortOrder,
    store::AuditLogStore,
};

/// PostgreSQL-backed audit log implementation.
///
/// Records live in the `audit_events` table keyed by `(pk, sk)`. Expiry is
/// not enforced on read; `purge_expired` is expected to run out-of-band.
#[derive(Clone)]
pub struct PostgresAuditLogStore {
    pool: PgPool,
}

impl PostgresAuditLogStore {
    /// Creates a new PostgreSQL audit log store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_record(row: PgRow) -> Result<AuditRecord> {
        Ok(AuditRecord {
            pk: PartitionKey::new(row.try_get::<String, _>("pk")?),
            sk: SortKey::new(row.try_get::<String, _>("sk")?),
            ttl: row.try_get("ttl")?,
            email: row.try_get("email")?,
            created_at: row.try_get("created_at")?,
            request_id: row.try_get("request_id")?,
            event_type: row.try_get("event_type")?,
            info: row.try_get("info")?,
        })
    }
}

#[async_trait]
impl AuditLogStore for PostgresAuditLogStore {
    #[tracing::instrument(skip(self, record), fields(pk = %record.pk, sk = %record.sk))]
    async fn append(&self, record: AuditRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_events (pk, sk, ttl, email, created_at, request_id, event_type, info)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.pk.as_str())
        .bind(record.sk.as_str())
        .bind(record.ttl)
        .bind(&record.email)
        .bind(record.created_at)
        .bind(&record.request_id)
        .bind(&record.event_type)
        .bind(&record.info)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return AuditLogError::DuplicateKey {
                    pk: record.pk.clone(),
                    sk: record.sk.clone(),
                };
            }
            AuditLogError::Database(e)
        })?;

        Ok(())
    }

    #[tracing::instrument(skip(self, query), fields(pk = %query.partition))]
    async fn query(&self, query: AuditQuery) -> Result<Vec<AuditRecord>> {
        let mut sql = String::from(
            "SELECT pk, sk, ttl, email, created_at, request_id, event_type, info FROM audit_events WHERE pk = $1",
        );
        let mut param_count = 1;

        // Build dynamic query
        if query.sort_key_prefix.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND starts_with(sk, ${param_count})"));
        }
        if query.from_sort_key.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND sk >= ${param_count}"));
        }
        if query.to_sort_key.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND sk <= ${param_count}"));
        }

        match query.order {
            SortOrder::Ascending => sql.push_str(" ORDER BY sk ASC"),
            SortOrder::Descending => sql.push_str(" ORDER BY sk DESC"),
        }

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }

        let mut sqlx_query = sqlx::query(&sql).bind(query.partition.as_str());

        if let Some(prefix) = query.sort_key_prefix {
            sqlx_query = sqlx_query.bind(prefix);
        }
        if let Some(from) = query.from_sort_key {
            sqlx_query = sqlx_query.bind(from.as_str().to_string());
        }
        if let Some(to) = query.to_sort_key {
            sqlx_query = sqlx_query.bind(to.as_str().to_string());
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(limit as i64);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        tracing::debug!(rows = rows.len(), "audit query returned");
        rows.into_iter().map(Self::row_to_record).collect()
    }

    #[tracing::instrument(skip(self))]
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM audit_events WHERE ttl <= $1")
            .bind(now.timestamp())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
