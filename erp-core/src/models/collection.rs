use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Payment recorded against a billing. Maps to the `collections` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Collection {
    pub id: Uuid,
    pub billing_id: Uuid,
    pub amount: Decimal,
    pub collected_on: NaiveDate,
    pub bank_account_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Collection creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCollection {
    pub billing_id: Uuid,
    pub amount: Decimal,
    pub collected_on: NaiveDate,
    pub bank_account_id: Option<Uuid>,
}
