use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::billing::{Billing, Classification, CreateBilling, UpdateBilling};
use crate::money::ensure_money_scale;

const BILLING_COLUMNS: &str = r#"
    id, order_id, customer_id, billing_type, amount, expected_payment_date,
    invoice_issued, classification, created_at, updated_at
"#;

pub fn validate_billing_amount(amount: Decimal) -> AppResult<()> {
    ensure_money_scale(amount, "청구금액")?;
    if amount <= Decimal::ZERO {
        return Err(AppError::Validation(
            "청구금액은 0보다 커야 합니다.".to_string(),
        ));
    }
    Ok(())
}

/// Lists billings, optionally for a single order.
pub async fn list_billings(pool: &PgPool, order_id: Option<Uuid>) -> AppResult<Vec<Billing>> {
    let billings = sqlx::query_as::<_, Billing>(&format!(
        r#"
        SELECT {}
        FROM billings
        WHERE ($1::uuid IS NULL OR order_id = $1)
        ORDER BY created_at DESC
        "#,
        BILLING_COLUMNS
    ))
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(billings)
}

pub async fn get_billing(pool: &PgPool, billing_id: Uuid) -> AppResult<Billing> {
    sqlx::query_as::<_, Billing>(&format!(
        "SELECT {} FROM billings WHERE id = $1",
        BILLING_COLUMNS
    ))
    .bind(billing_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("청구 내역을 찾을 수 없습니다: {}", billing_id)))
}

#[instrument(skip(pool, input), fields(order_id = %input.order_id))]
pub async fn create_billing(pool: &PgPool, input: CreateBilling) -> AppResult<Billing> {
    validate_billing_amount(input.amount)?;

    let order_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE id = $1)")
        .bind(input.order_id)
        .fetch_one(pool)
        .await?;
    if !order_exists {
        return Err(AppError::Validation(format!(
            "수주를 찾을 수 없습니다: {}",
            input.order_id
        )));
    }

    let billing = sqlx::query_as::<_, Billing>(&format!(
        r#"
        INSERT INTO billings (
            id, order_id, customer_id, billing_type, amount,
            expected_payment_date, invoice_issued, classification
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {}
        "#,
        BILLING_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(input.order_id)
    .bind(input.customer_id)
    .bind(input.billing_type)
    .bind(input.amount)
    .bind(input.expected_payment_date)
    .bind(input.invoice_issued)
    .bind(Classification::Normal)
    .fetch_one(pool)
    .await?;

    info!(
        "Created {} billing {} for order {}",
        billing.billing_type.label(),
        billing.id,
        billing.order_id
    );
    Ok(billing)
}

#[instrument(skip(pool, input))]
pub async fn update_billing(
    pool: &PgPool,
    billing_id: Uuid,
    input: UpdateBilling,
) -> AppResult<Billing> {
    if let Some(amount) = input.amount {
        validate_billing_amount(amount)?;
    }

    sqlx::query_as::<_, Billing>(&format!(
        r#"
        UPDATE billings
        SET
            billing_type = COALESCE($2, billing_type),
            amount = COALESCE($3, amount),
            expected_payment_date = CASE WHEN $4 THEN $5 ELSE expected_payment_date END,
            invoice_issued = COALESCE($6, invoice_issued),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        BILLING_COLUMNS
    ))
    .bind(billing_id)
    .bind(input.billing_type)
    .bind(input.amount)
    .bind(input.expected_payment_date.is_some())
    .bind(input.expected_payment_date.flatten())
    .bind(input.invoice_issued)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("청구 내역을 찾을 수 없습니다: {}", billing_id)))
}

/// Sets the manual receivable classification of a billing.
pub async fn set_classification(
    pool: &PgPool,
    billing_id: Uuid,
    classification: Classification,
) -> AppResult<Billing> {
    let billing = sqlx::query_as::<_, Billing>(&format!(
        r#"
        UPDATE billings
        SET classification = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        BILLING_COLUMNS
    ))
    .bind(billing_id)
    .bind(classification)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("청구 내역을 찾을 수 없습니다: {}", billing_id)))?;

    info!("Billing {} classified as {}", billing.id, classification);
    Ok(billing)
}

/// Deletes a billing that has no collections recorded against it.
#[instrument(skip(pool))]
pub async fn delete_billing(pool: &PgPool, billing_id: Uuid) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    let collections: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM collections WHERE billing_id = $1")
            .bind(billing_id)
            .fetch_one(&mut *tx)
            .await?;
    if collections > 0 {
        return Err(AppError::Conflict(format!(
            "수금 내역 {}건이 있어 삭제할 수 없습니다.",
            collections
        )));
    }

    let result = sqlx::query("DELETE FROM billings WHERE id = $1")
        .bind(billing_id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "청구 내역을 찾을 수 없습니다: {}",
            billing_id
        )));
    }

    tx.commit().await?;
    info!("Deleted billing {}", billing_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_billing_amount_must_be_positive() {
        assert!(validate_billing_amount(Decimal::ZERO).is_err());
        assert!(validate_billing_amount(Decimal::from(-10)).is_err());
        assert!(validate_billing_amount(Decimal::new(1, 2)).is_ok());
    }

    #[test]
    fn test_sub_cent_billing_amount_is_validation_error() {
        assert!(matches!(
            validate_billing_amount(Decimal::new(1, 3)),
            Err(AppError::Validation(_))
        ));
    }
}
