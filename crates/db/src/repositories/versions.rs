use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::info;
use uuid::Uuid;

use poolquote_core::domain::quote::QuoteId;
use poolquote_core::domain::snapshot::{QuoteSnapshot, SnapshotPayload};
use poolquote_core::errors::VersionError;

use super::quote::{insert_line_item, load_items, parse_quote_status, quote_status_as_str};
use super::{QuoteVersionStore, RepositoryError, RestoreOutcome};
use crate::DbPool;

/// SQLite-backed append-only version history of a quote.
///
/// `version_number` is assigned inside the insert statement itself
/// (`COALESCE(MAX(version_number), 0) + 1`), so two concurrent snapshot calls
/// serialize on the write transaction instead of both reading the same max.
pub struct SqlQuoteVersionStore {
    pool: DbPool,
}

impl SqlQuoteVersionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn db_error(error: sqlx::Error) -> VersionError {
        VersionError::Storage(error.to_string())
    }

    fn repo_error(error: RepositoryError) -> VersionError {
        VersionError::Storage(error.to_string())
    }

    async fn load_payload(
        conn: &mut SqliteConnection,
        quote_id: &QuoteId,
    ) -> Result<SnapshotPayload, VersionError> {
        let row = sqlx::query("SELECT customer_name, status, currency FROM quote WHERE id = ?")
            .bind(&quote_id.0)
            .fetch_optional(&mut *conn)
            .await
            .map_err(Self::db_error)?;

        let row = row.ok_or_else(|| VersionError::QuoteNotFound { quote_id: quote_id.clone() })?;
        let decode = |e: sqlx::Error| VersionError::Storage(e.to_string());
        let status_raw: String = row.try_get("status").map_err(decode)?;

        let header = poolquote_core::domain::snapshot::QuoteHeader {
            customer_name: row.try_get("customer_name").map_err(decode)?,
            status: parse_quote_status(&status_raw).map_err(Self::repo_error)?,
            currency: row.try_get("currency").map_err(decode)?,
        };
        let items = load_items(conn, quote_id).await.map_err(Self::repo_error)?;

        Ok(SnapshotPayload { header, items })
    }

    async fn insert_snapshot(
        conn: &mut SqliteConnection,
        quote_id: &QuoteId,
        payload: &SnapshotPayload,
        notes: Option<String>,
    ) -> Result<QuoteSnapshot, VersionError> {
        let id = Uuid::new_v4().to_string();
        let payload_json =
            serde_json::to_string(payload).map_err(|e| VersionError::Storage(e.to_string()))?;
        let content_hash = payload.content_hash();
        let created_at = Utc::now();

        let row = sqlx::query(
            "INSERT INTO quote_snapshot (id, quote_id, version_number, payload_json, notes,
                                         content_hash, created_at)
             SELECT ?, ?, COALESCE(MAX(version_number), 0) + 1, ?, ?, ?, ?
             FROM quote_snapshot WHERE quote_id = ?
             RETURNING version_number",
        )
        .bind(&id)
        .bind(&quote_id.0)
        .bind(&payload_json)
        .bind(&notes)
        .bind(&content_hash)
        .bind(created_at.to_rfc3339())
        .bind(&quote_id.0)
        .fetch_one(&mut *conn)
        .await
        .map_err(Self::db_error)?;

        let version_raw: i64 =
            row.try_get("version_number").map_err(|e| VersionError::Storage(e.to_string()))?;
        let version_number = u32::try_from(version_raw).map_err(|_| {
            VersionError::Storage(format!("version_number `{version_raw}` does not fit in u32"))
        })?;

        Ok(QuoteSnapshot {
            id,
            quote_id: quote_id.clone(),
            version_number,
            payload: payload.clone(),
            notes,
            content_hash,
            created_at,
        })
    }

    fn snapshot_from_row(row: &SqliteRow) -> Result<QuoteSnapshot, RepositoryError> {
        let decode = |e: sqlx::Error| RepositoryError::Decode(e.to_string());

        let quote_id: String = row.try_get("quote_id").map_err(decode)?;
        let version_raw: i64 = row.try_get("version_number").map_err(decode)?;
        let payload_json: String = row.try_get("payload_json").map_err(decode)?;
        let created_at_raw: String = row.try_get("created_at").map_err(decode)?;

        let version_number = u32::try_from(version_raw).map_err(|_| {
            RepositoryError::Decode(format!("version_number `{version_raw}` out of range"))
        })?;
        let payload: SnapshotPayload = serde_json::from_str(&payload_json)
            .map_err(|e| RepositoryError::Decode(format!("payload_json: {e}")))?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| RepositoryError::Decode(format!("created_at: {e}")))?;

        Ok(QuoteSnapshot {
            id: row.try_get("id").map_err(decode)?,
            quote_id: QuoteId(quote_id),
            version_number,
            payload,
            notes: row.try_get("notes").map_err(decode)?,
            content_hash: row.try_get("content_hash").map_err(decode)?,
            created_at,
        })
    }
}

#[async_trait::async_trait]
impl QuoteVersionStore for SqlQuoteVersionStore {
    async fn snapshot(
        &self,
        quote_id: &QuoteId,
        notes: Option<String>,
    ) -> Result<QuoteSnapshot, VersionError> {
        let mut tx = self.pool.begin().await.map_err(Self::db_error)?;
        let payload = Self::load_payload(&mut tx, quote_id).await?;
        let snapshot = Self::insert_snapshot(&mut tx, quote_id, &payload, notes).await?;
        tx.commit().await.map_err(Self::db_error)?;

        info!(quote_id = %quote_id, version = snapshot.version_number, "snapshotted quote");
        Ok(snapshot)
    }

    async fn restore(
        &self,
        quote_id: &QuoteId,
        target_version: u32,
    ) -> Result<RestoreOutcome, VersionError> {
        let mut tx = self.pool.begin().await.map_err(Self::db_error)?;

        let target_row = sqlx::query(
            "SELECT payload_json FROM quote_snapshot WHERE quote_id = ? AND version_number = ?",
        )
        .bind(&quote_id.0)
        .bind(i64::from(target_version))
        .fetch_optional(&mut *tx)
        .await
        .map_err(Self::db_error)?;

        let Some(target_row) = target_row else {
            return Err(VersionError::VersionNotFound {
                quote_id: quote_id.clone(),
                version: target_version,
            });
        };
        let payload_json: String = target_row
            .try_get("payload_json")
            .map_err(|e| VersionError::Storage(e.to_string()))?;
        let target: SnapshotPayload = serde_json::from_str(&payload_json).map_err(|_| {
            VersionError::EmptySnapshot { quote_id: quote_id.clone(), version: target_version }
        })?;

        // Snapshot the pre-restore state first; restore never loses history.
        let current = Self::load_payload(&mut tx, quote_id).await?;
        let backup = Self::insert_snapshot(
            &mut tx,
            quote_id,
            &current,
            Some(format!("automatic backup before restore to v{target_version}")),
        )
        .await?;

        sqlx::query("UPDATE quote SET customer_name = ?, status = ?, currency = ?, updated_at = ? WHERE id = ?")
            .bind(&target.header.customer_name)
            .bind(quote_status_as_str(target.header.status))
            .bind(&target.header.currency)
            .bind(Utc::now().to_rfc3339())
            .bind(&quote_id.0)
            .execute(&mut *tx)
            .await
            .map_err(Self::db_error)?;

        sqlx::query("DELETE FROM quote_line_item WHERE quote_id = ?")
            .bind(&quote_id.0)
            .execute(&mut *tx)
            .await
            .map_err(Self::db_error)?;
        for item in &target.items {
            insert_line_item(&mut tx, quote_id, item).await.map_err(Self::repo_error)?;
        }

        tx.commit().await.map_err(Self::db_error)?;

        info!(
            quote_id = %quote_id,
            restored_version = target_version,
            backup_version = backup.version_number,
            "restored quote from version history"
        );
        Ok(RestoreOutcome { restored_version: target_version, backup })
    }

    async fn list_versions(
        &self,
        quote_id: &QuoteId,
    ) -> Result<Vec<QuoteSnapshot>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, quote_id, version_number, payload_json, notes, content_hash, created_at
             FROM quote_snapshot WHERE quote_id = ? ORDER BY version_number",
        )
        .bind(&quote_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::snapshot_from_row).collect()
    }

    async fn find_version(
        &self,
        quote_id: &QuoteId,
        version: u32,
    ) -> Result<Option<QuoteSnapshot>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, quote_id, version_number, payload_json, notes, content_hash, created_at
             FROM quote_snapshot WHERE quote_id = ? AND version_number = ?",
        )
        .bind(&quote_id.0)
        .bind(i64::from(version))
        .fetch_one(&self.pool)
        .await;

        match row {
            Ok(ref row) => Ok(Some(Self::snapshot_from_row(row)?)),
            Err(sqlx::Error::RowNotFound) => Ok(None),
            Err(error) => Err(error.into()),
        }
    }
}
