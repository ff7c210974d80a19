use rust_decimal::Decimal;

use crate::error::{AppError, AppResult};

/// Decimal places kept by the `NUMERIC(18, 2)` amount columns.
pub const MONEY_SCALE: u32 = 2;

/// Rejects amounts the amount columns would silently round.
///
/// Trailing zeros do not count, so `12.300` passes while `12.345` fails.
pub fn ensure_money_scale(amount: Decimal, field: &str) -> AppResult<()> {
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(AppError::Validation(format!(
            "{}은(는) 소수점 {}자리까지만 입력할 수 있습니다.",
            field, MONEY_SCALE
        )));
    }
    Ok(())
}
