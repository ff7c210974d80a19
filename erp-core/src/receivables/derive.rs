use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::billing::{Billing, Classification};
use crate::models::collection::Collection;

/// Collection progress of a billing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceivableStatus {
    /// Nothing collected yet
    Pending,
    Partial,
    Completed,
}

/// Outstanding-balance view of one billing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receivable {
    #[serde(flatten)]
    pub billing: Billing,
    pub collected_amount: Decimal,
    pub remaining_amount: Decimal,
    pub status: ReceivableStatus,

    /// Manual flag, or `overdue_long` when a normal receivable aged past
    /// the threshold
    pub effective_classification: Classification,

    /// Days past the expected payment date while not completed
    pub days_overdue: Option<i64>,

    pub collection_count: usize,
    pub last_collected_on: Option<NaiveDate>,
}

pub fn derive_status(amount: Decimal, collected: Decimal) -> ReceivableStatus {
    if collected <= Decimal::ZERO {
        ReceivableStatus::Pending
    } else if collected < amount {
        ReceivableStatus::Partial
    } else {
        ReceivableStatus::Completed
    }
}

/// Outstanding balance; over-collection shows as zero.
pub fn remaining_amount(amount: Decimal, collected: Decimal) -> Decimal {
    (amount - collected).max(Decimal::ZERO)
}

pub fn days_overdue(
    expected_payment_date: Option<NaiveDate>,
    status: ReceivableStatus,
    today: NaiveDate,
) -> Option<i64> {
    if status == ReceivableStatus::Completed {
        return None;
    }
    let days = (today - expected_payment_date?).num_days();
    (days > 0).then_some(days)
}

pub fn effective_classification(
    manual: Classification,
    days_overdue: Option<i64>,
    overdue_threshold_days: i64,
) -> Classification {
    match (manual, days_overdue) {
        (Classification::Normal, Some(days)) if days > overdue_threshold_days => {
            Classification::OverdueLong
        }
        (manual, _) => manual,
    }
}

/// Derives a receivable for every billing from its collections.
///
/// Collections that reference a billing outside `billings` are ignored.
pub fn derive_receivables(
    billings: &[Billing],
    collections: &[Collection],
    today: NaiveDate,
    overdue_threshold_days: i64,
) -> Vec<Receivable> {
    let mut by_billing: HashMap<Uuid, Vec<&Collection>> = HashMap::new();
    for collection in collections {
        by_billing.entry(collection.billing_id).or_default().push(collection);
    }

    billings
        .iter()
        .map(|billing| {
            let applied = by_billing.get(&billing.id).map(Vec::as_slice).unwrap_or(&[]);
            let collected: Decimal = applied.iter().map(|c| c.amount).sum();
            let status = derive_status(billing.amount, collected);
            let overdue = days_overdue(billing.expected_payment_date, status, today);

            Receivable {
                billing: billing.clone(),
                collected_amount: collected,
                remaining_amount: remaining_amount(billing.amount, collected),
                status,
                effective_classification: effective_classification(
                    billing.classification,
                    overdue,
                    overdue_threshold_days,
                ),
                days_overdue: overdue,
                collection_count: applied.len(),
                last_collected_on: applied.iter().map(|c| c.collected_on).max(),
            }
        })
        .collect()
}

/// Totals shown above the receivable table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReceivableSummary {
    pub total_billed: Decimal,
    pub total_collected: Decimal,
    pub total_remaining: Decimal,
    pub pending_count: usize,
    pub partial_count: usize,
    pub completed_count: usize,
    pub overdue_long_count: usize,
}

pub fn summarize(receivables: &[Receivable]) -> ReceivableSummary {
    receivables
        .iter()
        .fold(ReceivableSummary::default(), |mut acc, r| {
            acc.total_billed += r.billing.amount;
            acc.total_collected += r.collected_amount;
            acc.total_remaining += r.remaining_amount;
            match r.status {
                ReceivableStatus::Pending => acc.pending_count += 1,
                ReceivableStatus::Partial => acc.partial_count += 1,
                ReceivableStatus::Completed => acc.completed_count += 1,
            }
            if r.effective_classification == Classification::OverdueLong {
                acc.overdue_long_count += 1;
            }
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::billing::BillingType;
    use chrono::Utc;

    fn billing(amount: i64, expected: Option<NaiveDate>) -> Billing {
        Billing {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            billing_type: BillingType::Interim,
            amount: Decimal::from(amount),
            expected_payment_date: expected,
            invoice_issued: true,
            classification: Classification::Normal,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn collection(billing_id: Uuid, amount: i64, on: NaiveDate) -> Collection {
        Collection {
            id: Uuid::new_v4(),
            billing_id,
            amount: Decimal::from(amount),
            collected_on: on,
            bank_account_id: None,
            created_at: Utc::now(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_status_progression() {
        let amount = Decimal::from(1000);

        assert_eq!(derive_status(amount, Decimal::ZERO), ReceivableStatus::Pending);
        assert_eq!(derive_status(amount, Decimal::from(400)), ReceivableStatus::Partial);
        assert_eq!(remaining_amount(amount, Decimal::from(400)), Decimal::from(600));
        assert_eq!(derive_status(amount, Decimal::from(1000)), ReceivableStatus::Completed);
        assert_eq!(remaining_amount(amount, Decimal::from(1000)), Decimal::ZERO);
    }

    #[test]
    fn test_over_collection_is_completed_with_zero_remaining() {
        let amount = Decimal::from(1000);
        assert_eq!(derive_status(amount, Decimal::from(1200)), ReceivableStatus::Completed);
        assert_eq!(remaining_amount(amount, Decimal::from(1200)), Decimal::ZERO);
    }

    #[test]
    fn test_partial_collections_are_summed() {
        let b = billing(1000, Some(date(2024, 1, 31)));
        let collections = vec![
            collection(b.id, 150, date(2024, 2, 5)),
            collection(b.id, 250, date(2024, 2, 20)),
            collection(Uuid::new_v4(), 999, date(2024, 2, 21)),
        ];

        let receivables = derive_receivables(&[b], &collections, date(2024, 3, 1), 90);
        let r = &receivables[0];

        assert_eq!(r.collected_amount, Decimal::from(400));
        assert_eq!(r.remaining_amount, Decimal::from(600));
        assert_eq!(r.status, ReceivableStatus::Partial);
        assert_eq!(r.collection_count, 2);
        assert_eq!(r.last_collected_on, Some(date(2024, 2, 20)));
        assert_eq!(r.days_overdue, Some(30));
    }

    #[test]
    fn test_aged_normal_receivable_reported_overdue_long() {
        let b = billing(500, Some(date(2024, 1, 1)));

        let receivables = derive_receivables(&[b], &[], date(2024, 6, 1), 90);

        assert_eq!(receivables[0].status, ReceivableStatus::Pending);
        assert_eq!(receivables[0].effective_classification, Classification::OverdueLong);
    }

    #[test]
    fn test_manual_classification_wins() {
        let mut b = billing(500, Some(date(2024, 1, 1)));
        b.classification = Classification::BadDebt;

        let receivables = derive_receivables(&[b], &[], date(2024, 6, 1), 90);

        assert_eq!(receivables[0].effective_classification, Classification::BadDebt);
    }

    #[test]
    fn test_completed_receivable_never_overdue() {
        let b = billing(500, Some(date(2024, 1, 1)));
        let paid = collection(b.id, 500, date(2024, 5, 30));

        let receivables = derive_receivables(&[b], &[paid], date(2024, 6, 1), 90);

        assert_eq!(receivables[0].days_overdue, None);
        assert_eq!(receivables[0].effective_classification, Classification::Normal);
    }

    #[test]
    fn test_threshold_boundary() {
        assert_eq!(
            effective_classification(Classification::Normal, Some(90), 90),
            Classification::Normal
        );
        assert_eq!(
            effective_classification(Classification::Normal, Some(91), 90),
            Classification::OverdueLong
        );
        assert_eq!(
            effective_classification(Classification::Normal, None, 90),
            Classification::Normal
        );
    }

    #[test]
    fn test_summary_totals() {
        let a = billing(1000, None);
        let b = billing(300, None);
        let c = billing(200, Some(date(2023, 1, 1)));
        let collections = vec![
            collection(a.id, 400, date(2024, 2, 1)),
            collection(b.id, 300, date(2024, 2, 1)),
        ];

        let receivables = derive_receivables(&[a, b, c], &collections, date(2024, 3, 1), 90);
        let summary = summarize(&receivables);

        assert_eq!(summary.total_billed, Decimal::from(1500));
        assert_eq!(summary.total_collected, Decimal::from(700));
        assert_eq!(summary.total_remaining, Decimal::from(800));
        assert_eq!(summary.pending_count, 1);
        assert_eq!(summary.partial_count, 1);
        assert_eq!(summary.completed_count, 1);
        assert_eq!(summary.overdue_long_count, 1);
    }
}
