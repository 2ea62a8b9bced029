use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use poolquote_core::domain::pool::PoolShape;
use poolquote_core::domain::product::{CatalogProduct, CoefficientUnit, PriceType, ProductId};

use super::{ProductRepository, RepositoryError};
use crate::DbPool;

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = "id, name, category, code, unit_price, price_type,
       price_reference_product_id, price_percentage, price_minimum,
       price_coefficient, coefficient_unit, prerequisite_product_ids,
       prerequisite_pool_shapes, active";

pub fn price_type_as_str(price_type: PriceType) -> &'static str {
    match price_type {
        PriceType::Fixed => "fixed",
        PriceType::Percentage => "percentage",
        PriceType::Coefficient => "coefficient",
    }
}

fn parse_price_type(s: &str) -> Result<PriceType, RepositoryError> {
    match s {
        "fixed" => Ok(PriceType::Fixed),
        "percentage" => Ok(PriceType::Percentage),
        "coefficient" => Ok(PriceType::Coefficient),
        other => Err(RepositoryError::Decode(format!("unknown price_type `{other}`"))),
    }
}

pub fn coefficient_unit_as_str(unit: CoefficientUnit) -> &'static str {
    match unit {
        CoefficientUnit::SquareMeter => "m2",
        CoefficientUnit::Meter => "m",
        CoefficientUnit::CubicMeter => "m3",
    }
}

fn parse_coefficient_unit(s: &str) -> Result<CoefficientUnit, RepositoryError> {
    match s {
        "m2" => Ok(CoefficientUnit::SquareMeter),
        "m" => Ok(CoefficientUnit::Meter),
        "m3" => Ok(CoefficientUnit::CubicMeter),
        other => Err(RepositoryError::Decode(format!("unknown coefficient_unit `{other}`"))),
    }
}

pub(crate) fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(raw)
        .map_err(|_| RepositoryError::Decode(format!("{field} `{raw}` is not a decimal")))
}

fn parse_optional_decimal(
    field: &str,
    raw: Option<String>,
) -> Result<Option<Decimal>, RepositoryError> {
    raw.map(|value| parse_decimal(field, &value)).transpose()
}

fn row_to_product(row: &SqliteRow) -> Result<CatalogProduct, RepositoryError> {
    let decode = |e: sqlx::Error| RepositoryError::Decode(e.to_string());

    let id: String = row.try_get("id").map_err(decode)?;
    let name: String = row.try_get("name").map_err(decode)?;
    let category: String = row.try_get("category").map_err(decode)?;
    let code: Option<String> = row.try_get("code").map_err(decode)?;
    let unit_price_raw: String = row.try_get("unit_price").map_err(decode)?;
    let price_type_raw: String = row.try_get("price_type").map_err(decode)?;
    let reference: Option<String> = row.try_get("price_reference_product_id").map_err(decode)?;
    let percentage_raw: Option<String> = row.try_get("price_percentage").map_err(decode)?;
    let minimum_raw: Option<String> = row.try_get("price_minimum").map_err(decode)?;
    let coefficient_raw: Option<String> = row.try_get("price_coefficient").map_err(decode)?;
    let unit_raw: Option<String> = row.try_get("coefficient_unit").map_err(decode)?;
    let prerequisite_ids_json: String =
        row.try_get("prerequisite_product_ids").map_err(decode)?;
    let prerequisite_shapes_json: String =
        row.try_get("prerequisite_pool_shapes").map_err(decode)?;
    let active: bool = row.try_get("active").map_err(decode)?;

    let prerequisite_product_ids: Vec<ProductId> =
        serde_json::from_str::<Vec<String>>(&prerequisite_ids_json)
            .map_err(|e| RepositoryError::Decode(format!("prerequisite_product_ids: {e}")))?
            .into_iter()
            .map(ProductId)
            .collect();
    let prerequisite_pool_shapes: Vec<PoolShape> =
        serde_json::from_str(&prerequisite_shapes_json)
            .map_err(|e| RepositoryError::Decode(format!("prerequisite_pool_shapes: {e}")))?;

    Ok(CatalogProduct {
        id: ProductId(id),
        name,
        category,
        code,
        unit_price: parse_decimal("unit_price", &unit_price_raw)?,
        price_type: parse_price_type(&price_type_raw)?,
        price_reference_product_id: reference.map(ProductId),
        price_percentage: parse_optional_decimal("price_percentage", percentage_raw)?,
        price_minimum: parse_optional_decimal("price_minimum", minimum_raw)?,
        price_coefficient: parse_optional_decimal("price_coefficient", coefficient_raw)?,
        coefficient_unit: unit_raw.as_deref().map(parse_coefficient_unit).transpose()?,
        prerequisite_product_ids,
        prerequisite_pool_shapes,
        active,
    })
}

#[async_trait::async_trait]
impl ProductRepository for SqlProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<CatalogProduct>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM catalog_product WHERE id = ?"
        ))
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_product(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<CatalogProduct>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM catalog_product
             WHERE active = 1 AND code IS NOT NULL AND UPPER(code) = UPPER(?)"
        ))
        .bind(code.trim())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_product(r)?)),
            None => Ok(None),
        }
    }

    async fn list_active(&self) -> Result<Vec<CatalogProduct>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM catalog_product WHERE active = 1 ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_product).collect()
    }

    async fn save(&self, product: CatalogProduct) -> Result<(), RepositoryError> {
        let prerequisite_ids_json = serde_json::to_string(
            &product.prerequisite_product_ids.iter().map(|id| id.0.clone()).collect::<Vec<_>>(),
        )
        .map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let prerequisite_shapes_json = serde_json::to_string(&product.prerequisite_pool_shapes)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;

        sqlx::query(
            "INSERT INTO catalog_product (id, name, category, code, unit_price, price_type,
                                          price_reference_product_id, price_percentage,
                                          price_minimum, price_coefficient, coefficient_unit,
                                          prerequisite_product_ids, prerequisite_pool_shapes,
                                          active)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 category = excluded.category,
                 code = excluded.code,
                 unit_price = excluded.unit_price,
                 price_type = excluded.price_type,
                 price_reference_product_id = excluded.price_reference_product_id,
                 price_percentage = excluded.price_percentage,
                 price_minimum = excluded.price_minimum,
                 price_coefficient = excluded.price_coefficient,
                 coefficient_unit = excluded.coefficient_unit,
                 prerequisite_product_ids = excluded.prerequisite_product_ids,
                 prerequisite_pool_shapes = excluded.prerequisite_pool_shapes,
                 active = excluded.active",
        )
        .bind(&product.id.0)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.code)
        .bind(product.unit_price.to_string())
        .bind(price_type_as_str(product.price_type))
        .bind(product.price_reference_product_id.as_ref().map(|id| id.0.clone()))
        .bind(product.price_percentage.map(|v| v.to_string()))
        .bind(product.price_minimum.map(|v| v.to_string()))
        .bind(product.price_coefficient.map(|v| v.to_string()))
        .bind(product.coefficient_unit.map(coefficient_unit_as_str))
        .bind(prerequisite_ids_json)
        .bind(prerequisite_shapes_json)
        .bind(product.active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
