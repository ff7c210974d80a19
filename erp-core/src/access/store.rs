use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::access::{AccessTable, Module, Page};
use crate::error::{AppError, AppResult};
use crate::models::user::User;

/// Loads the capability flags of a user.
///
/// Inactive or unknown users are rejected; administrators short-circuit
/// without reading the flag tables.
pub async fn load_access(pool: &PgPool, user_id: Uuid) -> AppResult<AccessTable> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, full_name, is_admin, is_active, created_at, updated_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::Forbidden("등록되지 않은 사용자입니다.".to_string()))?;

    if !user.is_active {
        return Err(AppError::Forbidden("비활성화된 사용자입니다.".to_string()));
    }

    if user.is_admin {
        return Ok(AccessTable::admin());
    }

    let module_rows: Vec<(String, bool)> =
        sqlx::query_as("SELECT module, enabled FROM user_module_access WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await?;

    let page_rows: Vec<(String, bool)> =
        sqlx::query_as("SELECT page, enabled FROM user_page_access WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await?;

    let mut table = AccessTable::default();

    for (key, enabled) in module_rows {
        match key.parse::<Module>() {
            Ok(module) if enabled => {
                table.modules.insert(module);
            }
            Ok(_) => {}
            Err(_) => warn!("Ignoring unknown module key '{}' for user {}", key, user_id),
        }
    }

    for (key, enabled) in page_rows {
        match key.parse::<Page>() {
            Ok(page) => {
                table.pages.insert(page, enabled);
            }
            Err(_) => warn!("Ignoring unknown page key '{}' for user {}", key, user_id),
        }
    }

    Ok(table)
}

/// Fails with `Forbidden` unless the user may open `page`.
pub async fn ensure_page(pool: &PgPool, user_id: Uuid, page: Page) -> AppResult<()> {
    let table = load_access(pool, user_id).await?;
    if table.can_access(page) {
        Ok(())
    } else {
        info!("Access to page '{}' denied for user {}", page, user_id);
        Err(AppError::Forbidden(
            "해당 화면에 대한 접근 권한이 없습니다.".to_string(),
        ))
    }
}
