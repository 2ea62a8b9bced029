use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use poolquote_core::domain::product::ProductId;
use poolquote_core::domain::quote::{
    LineItemSource, Quote, QuoteId, QuoteLineItem, QuoteStatus,
};
use poolquote_core::domain::rule::RuleId;

use super::{QuoteRepository, RepositoryError};
use crate::DbPool;

pub struct SqlQuoteRepository {
    pool: DbPool,
}

impl SqlQuoteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

pub fn quote_status_as_str(status: QuoteStatus) -> &'static str {
    match status {
        QuoteStatus::Draft => "draft",
        QuoteStatus::Sent => "sent",
        QuoteStatus::Order => "order",
        QuoteStatus::Production => "production",
        QuoteStatus::Cancelled => "cancelled",
    }
}

pub(crate) fn parse_quote_status(s: &str) -> Result<QuoteStatus, RepositoryError> {
    match s {
        "draft" => Ok(QuoteStatus::Draft),
        "sent" => Ok(QuoteStatus::Sent),
        "order" => Ok(QuoteStatus::Order),
        "production" => Ok(QuoteStatus::Production),
        "cancelled" => Ok(QuoteStatus::Cancelled),
        other => Err(RepositoryError::Decode(format!("unknown quote status `{other}`"))),
    }
}

fn source_as_columns(source: &LineItemSource) -> (&'static str, Option<String>) {
    match source {
        LineItemSource::PoolBasePrice => ("pool_base_price", None),
        LineItemSource::MappingRule { rule_id } => ("mapping_rule", Some(rule_id.0.clone())),
        LineItemSource::Manual => ("manual", None),
    }
}

fn source_from_columns(
    source: &str,
    rule_id: Option<String>,
) -> Result<LineItemSource, RepositoryError> {
    match source {
        "pool_base_price" => Ok(LineItemSource::PoolBasePrice),
        "manual" => Ok(LineItemSource::Manual),
        "mapping_rule" => {
            let rule_id = rule_id.ok_or_else(|| {
                RepositoryError::Decode("mapping_rule line item without rule_id".to_string())
            })?;
            Ok(LineItemSource::MappingRule { rule_id: RuleId(rule_id) })
        }
        other => Err(RepositoryError::Decode(format!("unknown line item source `{other}`"))),
    }
}

pub(crate) fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("{field} `{raw}`: {e}")))
}

pub(crate) fn row_to_line_item(row: &SqliteRow) -> Result<QuoteLineItem, RepositoryError> {
    let decode = |e: sqlx::Error| RepositoryError::Decode(e.to_string());

    let product_id: Option<String> = row.try_get("product_id").map_err(decode)?;
    let name: String = row.try_get("name").map_err(decode)?;
    let category: String = row.try_get("category").map_err(decode)?;
    let quantity: i64 = row.try_get("quantity").map_err(decode)?;
    let unit_price_raw: String = row.try_get("unit_price").map_err(decode)?;
    let total_price_raw: String = row.try_get("total_price").map_err(decode)?;
    let sort_order: i64 = row.try_get("sort_order").map_err(decode)?;
    let source_raw: String = row.try_get("source").map_err(decode)?;
    let rule_id: Option<String> = row.try_get("rule_id").map_err(decode)?;

    let quantity = u32::try_from(quantity)
        .map_err(|_| RepositoryError::Decode(format!("quantity `{quantity}` out of range")))?;
    let sort_order = i32::try_from(sort_order)
        .map_err(|_| RepositoryError::Decode(format!("sort_order `{sort_order}` out of range")))?;

    Ok(QuoteLineItem {
        product_id: product_id.map(ProductId),
        name,
        category,
        quantity,
        unit_price: super::product::parse_decimal("unit_price", &unit_price_raw)?,
        total_price: super::product::parse_decimal("total_price", &total_price_raw)?,
        sort_order,
        source: source_from_columns(&source_raw, rule_id)?,
    })
}

pub(crate) async fn insert_line_item(
    conn: &mut SqliteConnection,
    quote_id: &QuoteId,
    item: &QuoteLineItem,
) -> Result<(), RepositoryError> {
    let (source, rule_id) = source_as_columns(&item.source);

    sqlx::query(
        "INSERT INTO quote_line_item (id, quote_id, product_id, name, category, quantity,
                                      unit_price, total_price, sort_order, source, rule_id)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&quote_id.0)
    .bind(item.product_id.as_ref().map(|id| id.0.clone()))
    .bind(&item.name)
    .bind(&item.category)
    .bind(i64::from(item.quantity))
    .bind(item.unit_price.to_string())
    .bind(item.total_price.to_string())
    .bind(i64::from(item.sort_order))
    .bind(source)
    .bind(rule_id)
    .execute(conn)
    .await?;

    Ok(())
}

pub(crate) async fn load_items(
    conn: &mut SqliteConnection,
    quote_id: &QuoteId,
) -> Result<Vec<QuoteLineItem>, RepositoryError> {
    let rows = sqlx::query(
        "SELECT product_id, name, category, quantity, unit_price, total_price,
                sort_order, source, rule_id
         FROM quote_line_item WHERE quote_id = ? ORDER BY sort_order",
    )
    .bind(&quote_id.0)
    .fetch_all(conn)
    .await?;

    rows.iter().map(row_to_line_item).collect()
}

#[async_trait::async_trait]
impl QuoteRepository for SqlQuoteRepository {
    async fn find_by_id(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, customer_name, status, currency, created_at, updated_at
             FROM quote WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };

        let decode = |e: sqlx::Error| RepositoryError::Decode(e.to_string());
        let status_raw: String = row.try_get("status").map_err(decode)?;
        let created_at_raw: String = row.try_get("created_at").map_err(decode)?;
        let updated_at_raw: String = row.try_get("updated_at").map_err(decode)?;

        let mut conn = self.pool.acquire().await?;
        let items = load_items(&mut conn, id).await?;

        Ok(Some(Quote {
            id: id.clone(),
            customer_name: row.try_get("customer_name").map_err(decode)?,
            status: parse_quote_status(&status_raw)?,
            currency: row.try_get("currency").map_err(decode)?,
            items,
            created_at: parse_timestamp("created_at", &created_at_raw)?,
            updated_at: parse_timestamp("updated_at", &updated_at_raw)?,
        }))
    }

    /// Upserts the header and replaces the item set in one transaction.
    async fn save(&self, quote: Quote) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO quote (id, customer_name, status, currency, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 customer_name = excluded.customer_name,
                 status = excluded.status,
                 currency = excluded.currency,
                 updated_at = excluded.updated_at",
        )
        .bind(&quote.id.0)
        .bind(&quote.customer_name)
        .bind(quote_status_as_str(quote.status))
        .bind(&quote.currency)
        .bind(quote.created_at.to_rfc3339())
        .bind(quote.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM quote_line_item WHERE quote_id = ?")
            .bind(&quote.id.0)
            .execute(&mut *tx)
            .await?;

        for item in &quote.items {
            insert_line_item(&mut tx, &quote.id, item).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
