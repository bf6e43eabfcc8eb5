use rust_decimal::Decimal;

use crate::database::models::NewBuildItem;
use crate::services::compatibility::Catalog;

/// Sum of unit price × quantity over the items, rounded to cents. `None` when
/// a product or its price is unknown, or the sum overflows.
pub fn total_price(items: &[NewBuildItem], catalog: &Catalog) -> Option<Decimal> {
    let total = items.iter().try_fold(Decimal::ZERO, |total, item| {
        let unit = catalog.product(item.product_id)?.price?;
        let line = unit.checked_mul(Decimal::from(item.quantity))?;
        total.checked_add(line)
    })?;
    Some(total.round_dp(2))
}
