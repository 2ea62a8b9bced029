use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use poolquote_core::domain::pool::{PlumbingType, PoolShape};
use poolquote_core::domain::product::ProductId;
use poolquote_core::domain::rule::{MappingRule, RuleId};

use super::{RepositoryError, RuleRepository};
use crate::DbPool;

pub struct SqlRuleRepository {
    pool: DbPool,
}

impl SqlRuleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_rule(row: &SqliteRow) -> Result<MappingRule, RepositoryError> {
    let decode = |e: sqlx::Error| RepositoryError::Decode(e.to_string());

    let id: String = row.try_get("id").map_err(decode)?;
    let config_field: String = row.try_get("config_field").map_err(decode)?;
    let config_value: String = row.try_get("config_value").map_err(decode)?;
    let pool_shapes_json: Option<String> = row.try_get("pool_shapes").map_err(decode)?;
    let plumbing_types_json: Option<String> = row.try_get("plumbing_types").map_err(decode)?;
    let quantity: i64 = row.try_get("quantity").map_err(decode)?;
    let product_id: Option<String> = row.try_get("product_id").map_err(decode)?;
    let active: bool = row.try_get("active").map_err(decode)?;
    let sort_order: i64 = row.try_get("sort_order").map_err(decode)?;

    let pool_shapes: Option<Vec<PoolShape>> = pool_shapes_json
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .map_err(|e| RepositoryError::Decode(format!("pool_shapes: {e}")))?;
    let plumbing_types: Option<Vec<PlumbingType>> = plumbing_types_json
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .map_err(|e| RepositoryError::Decode(format!("plumbing_types: {e}")))?;

    let quantity = u32::try_from(quantity)
        .map_err(|_| RepositoryError::Decode(format!("quantity `{quantity}` out of range")))?;
    if quantity == 0 {
        return Err(RepositoryError::Decode(format!("rule {id} has zero quantity")));
    }
    let sort_order = i32::try_from(sort_order)
        .map_err(|_| RepositoryError::Decode(format!("sort_order `{sort_order}` out of range")))?;

    Ok(MappingRule {
        id: RuleId(id),
        config_field,
        config_value,
        pool_shapes,
        plumbing_types,
        quantity,
        product_id: product_id.map(ProductId),
        active,
        sort_order,
    })
}

#[async_trait::async_trait]
impl RuleRepository for SqlRuleRepository {
    async fn list_active(&self) -> Result<Vec<MappingRule>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, config_field, config_value, pool_shapes, plumbing_types,
                    quantity, product_id, active, sort_order
             FROM mapping_rule WHERE active = 1 ORDER BY sort_order, id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_rule).collect()
    }

    async fn save(&self, rule: MappingRule) -> Result<(), RepositoryError> {
        let pool_shapes_json = rule
            .pool_shapes
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let plumbing_types_json = rule
            .plumbing_types
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;

        sqlx::query(
            "INSERT INTO mapping_rule (id, config_field, config_value, pool_shapes,
                                       plumbing_types, quantity, product_id, active, sort_order)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 config_field = excluded.config_field,
                 config_value = excluded.config_value,
                 pool_shapes = excluded.pool_shapes,
                 plumbing_types = excluded.plumbing_types,
                 quantity = excluded.quantity,
                 product_id = excluded.product_id,
                 active = excluded.active,
                 sort_order = excluded.sort_order",
        )
        .bind(&rule.id.0)
        .bind(&rule.config_field)
        .bind(&rule.config_value)
        .bind(pool_shapes_json)
        .bind(plumbing_types_json)
        .bind(i64::from(rule.quantity))
        .bind(rule.product_id.as_ref().map(|id| id.0.clone()))
        .bind(rule.active)
        .bind(i64::from(rule.sort_order))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SqlRuleRepository;
    use crate::repositories::{RepositoryError, RuleRepository};
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn rule_sort_order_beyond_i32_is_a_decode_error() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        sqlx::query(
            "INSERT INTO mapping_rule (id, config_field, config_value, quantity, active, sort_order)
             VALUES ('r-1', 'technology', 'shaft', 1, 1, 9999999999)",
        )
        .execute(&pool)
        .await
        .expect("insert rule");

        let error = SqlRuleRepository::new(pool)
            .list_active()
            .await
            .expect_err("sort_order does not fit in i32");
        assert!(matches!(error, RepositoryError::Decode(_)));
    }
}
