use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::order::{ContractType, CreateAttachment, Order, MAX_ATTACHMENT_BYTES};
use crate::money::ensure_money_scale;

/// Checks the parent link of an order being created or edited.
///
/// `parent` is the looked-up parent order when `parent_id` is set, `None`
/// when the id did not resolve.
pub fn validate_parent_link(
    order_id: Option<Uuid>,
    contract_type: ContractType,
    parent_id: Option<Uuid>,
    parent: Option<&Order>,
) -> AppResult<()> {
    let Some(parent_id) = parent_id else {
        return Ok(());
    };

    if contract_type == ContractType::New {
        return Err(AppError::Validation(
            "신규 계약은 원계약을 지정할 수 없습니다.".to_string(),
        ));
    }

    if order_id == Some(parent_id) {
        return Err(AppError::Validation(
            "자기 자신을 원계약으로 지정할 수 없습니다.".to_string(),
        ));
    }

    match parent {
        None => Err(AppError::Validation(format!(
            "원계약을 찾을 수 없습니다: {}",
            parent_id
        ))),
        Some(p) if p.contract_type != ContractType::New => Err(AppError::Validation(
            "변경 계약의 원계약은 신규 계약이어야 합니다.".to_string(),
        )),
        Some(_) => Ok(()),
    }
}

pub fn validate_order_number(order_number: &str) -> AppResult<()> {
    if order_number.trim().is_empty() {
        return Err(AppError::Validation("수주번호를 입력해 주세요.".to_string()));
    }
    Ok(())
}

pub fn validate_contract_amount(amount: Decimal) -> AppResult<()> {
    ensure_money_scale(amount, "계약금액")?;
    if amount < Decimal::ZERO {
        return Err(AppError::Validation(
            "계약금액은 0 이상이어야 합니다.".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_attachment(attachment: &CreateAttachment) -> AppResult<()> {
    if attachment.name.trim().is_empty() || attachment.path.trim().is_empty() {
        return Err(AppError::Validation(
            "파일 이름과 경로가 필요합니다.".to_string(),
        ));
    }
    if attachment.size < 0 {
        return Err(AppError::Validation("파일 크기가 올바르지 않습니다.".to_string()));
    }
    if attachment.size > MAX_ATTACHMENT_BYTES {
        return Err(AppError::Validation(
            "파일 크기는 20MB를 초과할 수 없습니다.".to_string(),
        ));
    }
    Ok(())
}
