use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::order::{
    Attachment, ContractType, CreateAttachment, CreateOrder, Order, UpdateOrder,
};
use crate::orders::hierarchy::{build_order_rows, OrderRow};
use crate::orders::validation::{
    validate_attachment, validate_contract_amount, validate_order_number, validate_parent_link,
};

const ORDER_COLUMNS: &str = r#"
    id, order_number, contract_type, parent_id, contract_amount, pricing_unit,
    status, customer_id, manager_id, verification_company_id,
    pollutants, methods, attachments, created_at, updated_at
"#;

const DEADLOCK_DETECTED: &str = "40P01";

fn map_write_error(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict("이미 사용 중인 수주번호입니다.".to_string())
        }
        sqlx::Error::Database(db) if db.code().as_deref() == Some(DEADLOCK_DETECTED) => {
            AppError::Conflict("다른 작업과 충돌했습니다. 다시 시도해 주세요.".to_string())
        }
        _ => AppError::Database(e),
    }
}

/// Lists all orders, newest first.
pub async fn list_orders(pool: &PgPool) -> AppResult<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {} FROM orders ORDER BY created_at DESC, order_number DESC",
        ORDER_COLUMNS
    ))
    .fetch_all(pool)
    .await?;
    Ok(orders)
}

/// Lists orders grouped into new/change display rows.
pub async fn list_order_rows(pool: &PgPool) -> AppResult<Vec<OrderRow>> {
    let orders = list_orders(pool).await?;
    Ok(build_order_rows(&orders))
}

pub async fn find_order(pool: &PgPool, order_id: Uuid) -> AppResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {} FROM orders WHERE id = $1",
        ORDER_COLUMNS
    ))
    .bind(order_id)
    .fetch_optional(pool)
    .await?;
    Ok(order)
}

pub async fn get_order(pool: &PgPool, order_id: Uuid) -> AppResult<Order> {
    find_order(pool, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("수주를 찾을 수 없습니다: {}", order_id)))
}

/// Reads an order and holds its row lock until the transaction ends.
async fn lock_order(conn: &mut PgConnection, order_id: Uuid) -> AppResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {} FROM orders WHERE id = $1 FOR UPDATE",
        ORDER_COLUMNS
    ))
    .bind(order_id)
    .fetch_optional(conn)
    .await
    .map_err(map_write_error)?;
    Ok(order)
}

async fn lock_parent(conn: &mut PgConnection, parent_id: Option<Uuid>) -> AppResult<Option<Order>> {
    match parent_id {
        Some(id) => lock_order(conn, id).await,
        None => Ok(None),
    }
}

/// Creates an order after checking the new/change parent invariant.
///
/// The parent row stays locked until the insert commits, so it cannot be
/// retyped to a change contract in between.
#[instrument(skip(pool, input), fields(order_number = %input.order_number))]
pub async fn create_order(pool: &PgPool, input: CreateOrder) -> AppResult<Order> {
    validate_order_number(&input.order_number)?;
    validate_contract_amount(input.contract_amount)?;

    let mut tx = pool.begin().await?;

    let parent = lock_parent(&mut tx, input.parent_id).await?;
    validate_parent_link(None, input.contract_type, input.parent_id, parent.as_ref())?;

    let order = sqlx::query_as::<_, Order>(&format!(
        r#"
        INSERT INTO orders (
            id, order_number, contract_type, parent_id, contract_amount, pricing_unit,
            status, customer_id, manager_id, verification_company_id,
            pollutants, methods, attachments
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, '[]'::jsonb
        )
        RETURNING {}
        "#,
        ORDER_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(input.order_number.trim())
    .bind(input.contract_type)
    .bind(input.parent_id)
    .bind(input.contract_amount)
    .bind(input.pricing_unit)
    .bind(input.status.unwrap_or_else(|| "진행".to_string()))
    .bind(input.customer_id)
    .bind(input.manager_id)
    .bind(input.verification_company_id)
    .bind(Json(input.pollutants))
    .bind(Json(input.methods))
    .fetch_one(&mut *tx)
    .await
    .map_err(map_write_error)?;

    tx.commit().await.map_err(map_write_error)?;

    info!("Created order {} ({})", order.order_number, order.contract_type);
    Ok(order)
}

/// Applies a partial update, as sent by an inline cell edit.
///
/// The edited order and its parent are locked while the parent link and
/// the child count are checked.
#[instrument(skip(pool, input))]
pub async fn update_order(pool: &PgPool, order_id: Uuid, input: UpdateOrder) -> AppResult<Order> {
    if let Some(number) = input.order_number.as_deref() {
        validate_order_number(number)?;
    }
    if let Some(amount) = input.contract_amount {
        validate_contract_amount(amount)?;
    }

    let mut tx = pool.begin().await?;

    let existing = lock_order(&mut tx, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("수주를 찾을 수 없습니다: {}", order_id)))?;

    let contract_type = input.contract_type.unwrap_or(existing.contract_type);
    let parent_id = match input.parent_id {
        Some(explicit) => explicit,
        None => existing.parent_id,
    };

    let parent = if parent_id == Some(order_id) {
        Some(existing.clone())
    } else {
        lock_parent(&mut tx, parent_id).await?
    };
    validate_parent_link(Some(order_id), contract_type, parent_id, parent.as_ref())?;

    if existing.contract_type == ContractType::New && contract_type == ContractType::Change {
        let children: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE parent_id = $1")
                .bind(order_id)
                .fetch_one(&mut *tx)
                .await?;
        if children > 0 {
            return Err(AppError::Conflict(
                "변경 계약이 연결된 신규 계약은 변경 계약으로 바꿀 수 없습니다.".to_string(),
            ));
        }
    }

    let order = sqlx::query_as::<_, Order>(&format!(
        r#"
        UPDATE orders
        SET
            order_number = COALESCE($2, order_number),
            contract_type = $3,
            parent_id = $4,
            contract_amount = COALESCE($5, contract_amount),
            pricing_unit = CASE WHEN $6 THEN $7 ELSE pricing_unit END,
            status = COALESCE($8, status),
            customer_id = CASE WHEN $9 THEN $10 ELSE customer_id END,
            manager_id = CASE WHEN $11 THEN $12 ELSE manager_id END,
            verification_company_id = CASE WHEN $13 THEN $14 ELSE verification_company_id END,
            pollutants = COALESCE($15, pollutants),
            methods = COALESCE($16, methods),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        ORDER_COLUMNS
    ))
    .bind(order_id)
    .bind(input.order_number.as_deref().map(str::trim))
    .bind(contract_type)
    .bind(parent_id)
    .bind(input.contract_amount)
    .bind(input.pricing_unit.is_some())
    .bind(input.pricing_unit.flatten())
    .bind(input.status)
    .bind(input.customer_id.is_some())
    .bind(input.customer_id.flatten())
    .bind(input.manager_id.is_some())
    .bind(input.manager_id.flatten())
    .bind(input.verification_company_id.is_some())
    .bind(input.verification_company_id.flatten())
    .bind(input.pollutants.map(Json))
    .bind(input.methods.map(Json))
    .fetch_one(&mut *tx)
    .await
    .map_err(map_write_error)?;

    tx.commit().await.map_err(map_write_error)?;

    info!("Updated order {}", order.order_number);
    Ok(order)
}

/// Deletes an order unless billings or change contracts still depend on it.
#[instrument(skip(pool))]
pub async fn delete_order(pool: &PgPool, order_id: Uuid) -> AppResult<()> {
    let mut tx = pool.begin().await?;

    let billings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM billings WHERE order_id = $1")
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;
    if billings > 0 {
        return Err(AppError::Conflict(format!(
            "청구 내역 {}건이 있어 삭제할 수 없습니다.",
            billings
        )));
    }

    let children: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE parent_id = $1")
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;
    if children > 0 {
        return Err(AppError::Conflict(
            "연결된 변경 계약이 있어 삭제할 수 없습니다.".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(order_id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("수주를 찾을 수 없습니다: {}", order_id)));
    }

    tx.commit().await?;
    info!("Deleted order {}", order_id);
    Ok(())
}

/// Records metadata for a file already uploaded to the object store.
pub async fn add_attachment(
    pool: &PgPool,
    order_id: Uuid,
    input: CreateAttachment,
) -> AppResult<Order> {
    validate_attachment(&input)?;

    let attachment = Attachment {
        name: input.name,
        path: input.path,
        size: input.size,
        uploaded_at: chrono::Utc::now(),
    };

    let order = sqlx::query_as::<_, Order>(&format!(
        r#"
        UPDATE orders
        SET attachments = attachments || $2, updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        ORDER_COLUMNS
    ))
    .bind(order_id)
    .bind(Json(vec![attachment]))
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("수주를 찾을 수 없습니다: {}", order_id)))?;

    info!("Attached file to order {}", order.order_number);
    Ok(order)
}

/// Drops every attachment stored at `path` and returns their metadata so
/// the caller can remove the objects themselves.
///
/// The order row is locked for the read-modify-write, so a concurrent
/// `add_attachment` waits instead of being overwritten.
pub async fn remove_attachment(
    pool: &PgPool,
    order_id: Uuid,
    path: &str,
) -> AppResult<Vec<Attachment>> {
    let mut tx = pool.begin().await?;

    let order = lock_order(&mut tx, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("수주를 찾을 수 없습니다: {}", order_id)))?;

    let (removed, kept): (Vec<Attachment>, Vec<Attachment>) = order
        .attachments
        .0
        .into_iter()
        .partition(|a| a.path == path);

    if removed.is_empty() {
        return Err(AppError::NotFound(format!(
            "첨부 파일을 찾을 수 없습니다: {}",
            path
        )));
    }

    sqlx::query("UPDATE orders SET attachments = $2, updated_at = NOW() WHERE id = $1")
        .bind(order_id)
        .bind(Json(kept))
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(
        "Removed {} attachment(s) at {} from order {}",
        removed.len(),
        path,
        order.order_number
    );
    Ok(removed)
}
