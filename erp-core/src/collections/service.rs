use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::collection::{Collection, CreateCollection};
use crate::money::ensure_money_scale;

const COLLECTION_COLUMNS: &str =
    "id, billing_id, amount, collected_on, bank_account_id, created_at";

pub fn validate_collection_amount(amount: Decimal) -> AppResult<()> {
    ensure_money_scale(amount, "수금액")?;
    if amount <= Decimal::ZERO {
        return Err(AppError::Validation(
            "수금액은 0보다 커야 합니다.".to_string(),
        ));
    }
    Ok(())
}

pub async fn list_collections(
    pool: &PgPool,
    billing_id: Option<Uuid>,
) -> AppResult<Vec<Collection>> {
    let collections = sqlx::query_as::<_, Collection>(&format!(
        r#"
        SELECT {}
        FROM collections
        WHERE ($1::uuid IS NULL OR billing_id = $1)
        ORDER BY collected_on DESC, created_at DESC
        "#,
        COLLECTION_COLUMNS
    ))
    .bind(billing_id)
    .fetch_all(pool)
    .await?;
    Ok(collections)
}

/// Records a payment against an existing billing.
#[instrument(skip(pool, input), fields(billing_id = %input.billing_id))]
pub async fn create_collection(pool: &PgPool, input: CreateCollection) -> AppResult<Collection> {
    validate_collection_amount(input.amount)?;

    let billing_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM billings WHERE id = $1)")
            .bind(input.billing_id)
            .fetch_one(pool)
            .await?;
    if !billing_exists {
        return Err(AppError::Validation(format!(
            "청구 내역을 찾을 수 없습니다: {}",
            input.billing_id
        )));
    }

    let collection = sqlx::query_as::<_, Collection>(&format!(
        r#"
        INSERT INTO collections (id, billing_id, amount, collected_on, bank_account_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {}
        "#,
        COLLECTION_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(input.billing_id)
    .bind(input.amount)
    .bind(input.collected_on)
    .bind(input.bank_account_id)
    .fetch_one(pool)
    .await?;

    info!(
        "Recorded collection of {} against billing {}",
        collection.amount, collection.billing_id
    );
    Ok(collection)
}

pub async fn delete_collection(pool: &PgPool, collection_id: Uuid) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM collections WHERE id = $1")
        .bind(collection_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "수금 내역을 찾을 수 없습니다: {}",
            collection_id
        )));
    }
    info!("Deleted collection {}", collection_id);
    Ok(())
}
