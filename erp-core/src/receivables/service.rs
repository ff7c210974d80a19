use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::info;

use crate::billings::list_billings;
use crate::collections::list_collections;
use crate::error::AppResult;
use crate::receivables::derive::{derive_receivables, Receivable};

/// Builds the receivable view over every billing as of `today`.
pub async fn list_receivables(
    pool: &PgPool,
    today: NaiveDate,
    overdue_threshold_days: i64,
) -> AppResult<Vec<Receivable>> {
    let billings = list_billings(pool, None).await?;
    let collections = list_collections(pool, None).await?;

    info!(
        "Deriving receivables from {} billings and {} collections",
        billings.len(),
        collections.len()
    );

    Ok(derive_receivables(
        &billings,
        &collections,
        today,
        overdue_threshold_days,
    ))
}
