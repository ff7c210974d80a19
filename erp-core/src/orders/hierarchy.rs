use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::order::{Attachment, ContractType, Order};

/// Attachment annotated with the contract it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcedAttachment {
    pub order_id: Uuid,
    pub order_number: String,
    pub contract_type: ContractType,
    #[serde(flatten)]
    pub attachment: Attachment,
}

/// One display row of the order table.
///
/// A new contract carries its change contracts in `children`; the derived
/// fields roll the children into the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRow {
    #[serde(flatten)]
    pub order: Order,
    pub children: Vec<Order>,
    pub total_amount: Decimal,
    pub type_label: String,
    pub combined_attachments: Vec<SourcedAttachment>,
}

impl OrderRow {
    fn new(order: Order, children: Vec<Order>) -> Self {
        let total_amount = order.contract_amount
            + children.iter().map(|c| c.contract_amount).sum::<Decimal>();

        let type_label = if children.is_empty() {
            order.contract_type.label().to_string()
        } else {
            format!(
                "{} + {}({})",
                ContractType::New.label(),
                ContractType::Change.label(),
                children.len()
            )
        };

        let combined_attachments = std::iter::once(&order)
            .chain(children.iter())
            .flat_map(|source| {
                source.attachments.iter().map(move |attachment| SourcedAttachment {
                    order_id: source.id,
                    order_number: source.order_number.clone(),
                    contract_type: source.contract_type,
                    attachment: attachment.clone(),
                })
            })
            .collect();

        Self {
            order,
            children,
            total_amount,
            type_label,
            combined_attachments,
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Groups a flat order list into display rows.
///
/// Change contracts are nested under the new contract their `parent_id`
/// names. A change contract whose parent is not a new contract in `orders`
/// (missing, another change contract, or itself) stays a top-level row.
/// Top-level rows keep the relative order of `orders`, and children keep
/// their relative order under each parent.
pub fn build_order_rows(orders: &[Order]) -> Vec<OrderRow> {
    // Pass 1: index new contracts by id.
    let parents: HashMap<Uuid, usize> = orders
        .iter()
        .enumerate()
        .filter(|(_, o)| o.contract_type == ContractType::New)
        .map(|(idx, o)| (o.id, idx))
        .collect();

    // Pass 2: attach change contracts to their parents.
    let mut children: HashMap<usize, Vec<Order>> = HashMap::new();
    let mut nested = vec![false; orders.len()];
    for (idx, order) in orders.iter().enumerate() {
        if order.contract_type != ContractType::Change {
            continue;
        }
        if let Some(&parent_idx) = order.parent_id.as_ref().and_then(|p| parents.get(p)) {
            children.entry(parent_idx).or_default().push(order.clone());
            nested[idx] = true;
        }
    }

    orders
        .iter()
        .enumerate()
        .filter(|(idx, _)| !nested[*idx])
        .map(|(idx, order)| {
            OrderRow::new(order.clone(), children.remove(&idx).unwrap_or_default())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sqlx::types::Json;

    fn order(number: &str, contract_type: ContractType, parent: Option<Uuid>, amount: i64) -> Order {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        Order {
            id: Uuid::new_v4(),
            order_number: number.to_string(),
            contract_type,
            parent_id: parent,
            contract_amount: Decimal::from(amount),
            pricing_unit: None,
            status: "진행".to_string(),
            customer_id: None,
            manager_id: None,
            verification_company_id: None,
            pollutants: Json(vec![]),
            methods: Json(vec![]),
            attachments: Json(vec![]),
            created_at: ts,
            updated_at: ts,
        }
    }

    fn attachment(name: &str) -> Attachment {
        Attachment {
            name: name.to_string(),
            path: format!("orders/{}", name),
            size: 1024,
            uploaded_at: Utc.with_ymd_and_hms(2024, 3, 2, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_change_nests_under_new_parent() {
        let parent = order("2024-001", ContractType::New, None, 50);
        let child = order("2024-001-1", ContractType::Change, Some(parent.id), 100);

        let rows = build_order_rows(&[parent.clone(), child.clone()]);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].order.id, parent.id);
        assert_eq!(rows[0].children, vec![child]);
    }

    #[test]
    fn test_child_listed_before_parent_still_nests() {
        let parent = order("2024-001", ContractType::New, None, 50);
        let child = order("2024-001-1", ContractType::Change, Some(parent.id), 100);

        let rows = build_order_rows(&[child.clone(), parent.clone()]);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].order.id, parent.id);
        assert_eq!(rows[0].children[0].id, child.id);
    }

    #[test]
    fn test_orphan_change_stays_top_level() {
        let orphan = order("2023-090-1", ContractType::Change, Some(Uuid::new_v4()), 70);
        let unlinked = order("2023-091-1", ContractType::Change, None, 30);

        let rows = build_order_rows(&[orphan.clone(), unlinked.clone()]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].order.id, orphan.id);
        assert_eq!(rows[0].total_amount, Decimal::from(70));
        assert_eq!(rows[0].type_label, "변경");
        assert_eq!(rows[1].order.id, unlinked.id);
    }

    #[test]
    fn test_total_amount_rolls_up_children() {
        let parent = order("2024-002", ContractType::New, None, 50);
        let c1 = order("2024-002-1", ContractType::Change, Some(parent.id), 100);
        let c2 = order("2024-002-2", ContractType::Change, Some(parent.id), 200);

        let rows = build_order_rows(&[parent, c1, c2]);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total_amount, Decimal::from(350));
        assert_eq!(rows[0].type_label, "신규 + 변경(2)");
    }

    #[test]
    fn test_parent_without_children_is_unmodified() {
        let parent = order("2024-003", ContractType::New, None, 1200);

        let rows = build_order_rows(&[parent.clone()]);

        assert_eq!(rows[0].total_amount, parent.contract_amount);
        assert_eq!(rows[0].type_label, "신규");
        assert!(!rows[0].has_children());
    }

    #[test]
    fn test_change_of_change_is_not_nested() {
        let root = order("2024-004", ContractType::New, None, 10);
        let first = order("2024-004-1", ContractType::Change, Some(root.id), 20);
        let second = order("2024-004-2", ContractType::Change, Some(first.id), 30);

        let rows = build_order_rows(&[root.clone(), first.clone(), second.clone()]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].order.id, root.id);
        assert_eq!(rows[0].children.len(), 1);
        assert_eq!(rows[1].order.id, second.id);
    }

    #[test]
    fn test_self_reference_is_not_nested() {
        let mut looped = order("2024-005-1", ContractType::Change, None, 40);
        looped.parent_id = Some(looped.id);

        let rows = build_order_rows(&[looped.clone()]);

        assert_eq!(rows.len(), 1);
        assert!(rows[0].children.is_empty());
    }

    #[test]
    fn test_attachments_are_combined_and_tagged() {
        let mut parent = order("2024-006", ContractType::New, None, 10);
        parent.attachments = Json(vec![attachment("계약서.pdf")]);
        let mut child = order("2024-006-1", ContractType::Change, Some(parent.id), 5);
        child.attachments = Json(vec![attachment("변경계약서.pdf"), attachment("도면.dwg")]);

        let rows = build_order_rows(&[parent.clone(), child.clone()]);
        let combined = &rows[0].combined_attachments;

        assert_eq!(combined.len(), 3);
        assert_eq!(combined[0].order_id, parent.id);
        assert_eq!(combined[0].contract_type, ContractType::New);
        assert_eq!(combined[1].order_id, child.id);
        assert_eq!(combined[1].order_number, "2024-006-1");
        assert_eq!(combined[2].attachment.name, "도면.dwg");
    }

    #[test]
    fn test_aggregation_is_idempotent_and_pure() {
        let parent = order("2024-007", ContractType::New, None, 10);
        let child = order("2024-007-1", ContractType::Change, Some(parent.id), 5);
        let orphan = order("2024-008-1", ContractType::Change, Some(Uuid::new_v4()), 7);
        let input = vec![parent, child, orphan];
        let snapshot = input.clone();

        let first = build_order_rows(&input);
        let second = build_order_rows(&input);

        assert_eq!(first, second);
        assert_eq!(input, snapshot);
    }

    #[test]
    fn test_empty_input() {
        assert!(build_order_rows(&[]).is_empty());
    }
}
