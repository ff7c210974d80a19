use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use crate::models::double_option;

/// Billing type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar")]
#[serde(rename_all = "snake_case")]
pub enum BillingType {
    /// Down payment billed when the contract is signed
    #[sqlx(rename = "contract")]
    Contract,
    #[sqlx(rename = "interim")]
    Interim,
    #[sqlx(rename = "final")]
    Final,
}

impl BillingType {
    pub fn label(&self) -> &'static str {
        match self {
            BillingType::Contract => "계약금",
            BillingType::Interim => "중도금",
            BillingType::Final => "잔금",
        }
    }
}

/// Manually assigned receivable classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar")]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    #[default]
    #[sqlx(rename = "normal")]
    Normal,
    #[sqlx(rename = "overdue_long")]
    OverdueLong,
    #[sqlx(rename = "bad_debt")]
    BadDebt,
    #[sqlx(rename = "written_off")]
    WrittenOff,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Normal => write!(f, "normal"),
            Classification::OverdueLong => write!(f, "overdue_long"),
            Classification::BadDebt => write!(f, "bad_debt"),
            Classification::WrittenOff => write!(f, "written_off"),
        }
    }
}

/// Billing model representing a claim against a customer for part of an
/// order's value. Maps to the `billings` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Billing {
    pub id: Uuid,
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub billing_type: BillingType,
    pub amount: Decimal,
    pub expected_payment_date: Option<NaiveDate>,
    pub invoice_issued: bool,
    pub classification: Classification,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Billing creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBilling {
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub billing_type: BillingType,
    pub amount: Decimal,
    pub expected_payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub invoice_issued: bool,
}

/// Billing update request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBilling {
    pub billing_type: Option<BillingType>,
    pub amount: Option<Decimal>,
    #[serde(default, with = "double_option")]
    pub expected_payment_date: Option<Option<NaiveDate>>,
    pub invoice_issued: Option<bool>,
}

/// Classification change request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetClassification {
    pub classification: Classification,
}
