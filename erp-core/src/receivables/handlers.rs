use axum::{
    extract::{Query, State},
    response::Json,
    Extension,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::access::{ensure_page, Page};
use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::models::billing::Classification;
use crate::receivables::derive::{summarize, Receivable, ReceivableStatus, ReceivableSummary};
use crate::receivables::service::list_receivables;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ReceivableFilter {
    pub status: Option<ReceivableStatus>,
    pub classification: Option<Classification>,

    /// Hide fully collected billings
    #[serde(default)]
    pub outstanding_only: bool,
}

impl ReceivableFilter {
    pub fn matches(&self, receivable: &Receivable) -> bool {
        self.status.map_or(true, |s| receivable.status == s)
            && self
                .classification
                .map_or(true, |c| receivable.effective_classification == c)
            && (!self.outstanding_only || receivable.status != ReceivableStatus::Completed)
    }
}

#[derive(Debug, Serialize)]
pub struct ReceivableListResponse {
    pub receivables: Vec<Receivable>,
    pub summary: ReceivableSummary,
}

/// `GET /api/receivables`: derived outstanding balances with totals.
///
/// Totals cover the filtered rows.
pub async fn list_receivables_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Query(filter): Query<ReceivableFilter>,
) -> AppResult<Json<ReceivableListResponse>> {
    ensure_page(&state.db, user_id, Page::Receivables).await?;

    let today = Utc::now().date_naive();
    let receivables: Vec<Receivable> =
        list_receivables(&state.db, today, state.config.overdue_threshold_days)
            .await?
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect();
    let summary = summarize(&receivables);

    Ok(Json(ReceivableListResponse {
        receivables,
        summary,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::billing::{Billing, BillingType};
    use crate::models::collection::Collection;
    use crate::receivables::derive::derive_receivables;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn receivable(amount: i64, collected: i64) -> Receivable {
        let billing = Billing {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            billing_type: BillingType::Final,
            amount: Decimal::from(amount),
            expected_payment_date: None,
            invoice_issued: true,
            classification: Classification::Normal,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let collections: Vec<Collection> = (collected > 0)
            .then(|| Collection {
                id: Uuid::new_v4(),
                billing_id: billing.id,
                amount: Decimal::from(collected),
                collected_on: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
                bank_account_id: None,
                created_at: Utc::now(),
            })
            .into_iter()
            .collect();
        let today = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        derive_receivables(&[billing], &collections, today, 90).remove(0)
    }

    #[test]
    fn test_filter_by_status() {
        let filter = ReceivableFilter {
            status: Some(ReceivableStatus::Partial),
            ..ReceivableFilter::default()
        };
        assert!(filter.matches(&receivable(1000, 400)));
        assert!(!filter.matches(&receivable(1000, 0)));
    }

    #[test]
    fn test_outstanding_only_hides_completed() {
        let filter = ReceivableFilter {
            outstanding_only: true,
            ..ReceivableFilter::default()
        };
        assert!(!filter.matches(&receivable(1000, 1000)));
        assert!(filter.matches(&receivable(1000, 999)));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = ReceivableFilter::default();
        assert!(filter.matches(&receivable(1000, 0)));
        assert!(filter.matches(&receivable(1000, 1000)));
    }
}
