use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use crate::models::double_option;

/// Contract type of an order.
///
/// A `New` order is an original contract; a `Change` order amends one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar")]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    #[sqlx(rename = "new")]
    New,
    #[sqlx(rename = "change")]
    Change,
}

impl ContractType {
    /// Label shown in the order table.
    pub fn label(&self) -> &'static str {
        match self {
            ContractType::New => "신규",
            ContractType::Change => "변경",
        }
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractType::New => write!(f, "new"),
            ContractType::Change => write!(f, "change"),
        }
    }
}

/// Pollutant measured for a remediation contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutantEntry {
    pub pollutant_id: Uuid,
    pub concentration: Decimal,
    pub group_name: Option<String>,
}

/// Metadata of a file stored in the external object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,

    /// Object store path
    pub path: String,

    /// Size in bytes
    pub size: i64,

    pub uploaded_at: DateTime<Utc>,
}

/// Largest attachment accepted, 20 MB.
pub const MAX_ATTACHMENT_BYTES: i64 = 20 * 1024 * 1024;

/// Order (contract) model.
///
/// Maps to the `orders` table. `parent_id` links a change contract to the
/// new contract it amends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,

    /// Human-facing order number
    pub order_number: String,

    pub contract_type: ContractType,

    /// Originating new contract, only set on change contracts
    pub parent_id: Option<Uuid>,

    pub contract_amount: Decimal,

    /// Pricing unit (e.g. "m3", "ton", "식")
    pub pricing_unit: Option<String>,

    pub status: String,

    pub customer_id: Option<Uuid>,
    pub manager_id: Option<Uuid>,
    pub verification_company_id: Option<Uuid>,

    pub pollutants: Json<Vec<PollutantEntry>>,

    /// Remediation method ids
    pub methods: Json<Vec<Uuid>>,

    pub attachments: Json<Vec<Attachment>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Order creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrder {
    pub order_number: String,
    pub contract_type: ContractType,
    pub parent_id: Option<Uuid>,
    pub contract_amount: Decimal,
    pub pricing_unit: Option<String>,
    pub status: Option<String>,
    pub customer_id: Option<Uuid>,
    pub manager_id: Option<Uuid>,
    pub verification_company_id: Option<Uuid>,
    #[serde(default)]
    pub pollutants: Vec<PollutantEntry>,
    #[serde(default)]
    pub methods: Vec<Uuid>,
}

/// Order update request (single or multiple cell edit).
///
/// Nullable columns use a double option so that `null` clears the cell
/// while an absent field leaves it untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateOrder {
    pub order_number: Option<String>,
    pub contract_type: Option<ContractType>,
    #[serde(default, with = "double_option")]
    pub parent_id: Option<Option<Uuid>>,
    pub contract_amount: Option<Decimal>,
    #[serde(default, with = "double_option")]
    pub pricing_unit: Option<Option<String>>,
    pub status: Option<String>,
    #[serde(default, with = "double_option")]
    pub customer_id: Option<Option<Uuid>>,
    #[serde(default, with = "double_option")]
    pub manager_id: Option<Option<Uuid>>,
    #[serde(default, with = "double_option")]
    pub verification_company_id: Option<Option<Uuid>>,
    pub pollutants: Option<Vec<PollutantEntry>>,
    pub methods: Option<Vec<Uuid>>,
}

/// Attachment registration request, sent after the file was uploaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAttachment {
    pub name: String,
    pub path: String,
    pub size: i64,
}
