//! Discount calculation
//!
//! Two independent systems that are never combined:
//! - the order-level loyalty/volume discount applied at checkout, and
//! - the catalog-level sale price shown on listings while a product's
//!   discount window is running.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Cart size at which the volume discount kicks in.
pub const BULK_QUANTITY_THRESHOLD: i64 = 5;

/// Completed-order count at which the loyalty discount kicks in.
pub const LOYALTY_ORDER_THRESHOLD: i64 = 10;

/// Order totals after the loyalty/volume discount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub base_total: Decimal,
    pub discount_amount: Decimal,
    pub final_total: Decimal,
}

/// Computes the checkout quote for a cart. Each line is
/// (unit price, quantity). Rates are additive: 5% for five or more items
/// in the cart, 10% for ten or more previously completed orders, so a
/// customer can reach 15% off. Amounts round to two decimals.
pub fn loyalty_quote<I>(lines: I, completed_orders: i64) -> Quote
where
    I: IntoIterator<Item = (Decimal, i32)>,
{
    let mut base_total = Decimal::ZERO;
    let mut total_quantity: i64 = 0;
    for (unit_price, quantity) in lines {
        base_total += unit_price * Decimal::from(quantity);
        total_quantity += i64::from(quantity);
    }

    let mut rate = Decimal::ZERO;
    if total_quantity >= BULK_QUANTITY_THRESHOLD {
        rate += Decimal::new(5, 2);
    }
    if completed_orders >= LOYALTY_ORDER_THRESHOLD {
        rate += Decimal::new(10, 2);
    }

    let discount_amount = (base_total * rate).round_dp(2);
    let final_total = (base_total - discount_amount).round_dp(2);
    Quote { base_total, discount_amount, final_total }
}

/// Catalog sale price: while a product is on sale and `now` falls inside
/// its discount window (open bounds are unbounded), the listed price is
/// reduced by the product's discount percent, rounded to two decimals.
/// Outside the window, or off sale, the list price stands.
pub fn sale_price(
    price: Decimal,
    discount_percent: Option<Decimal>,
    on_sale: bool,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Decimal {
    let Some(percent) = discount_percent else { return price };
    if !on_sale {
        return price;
    }
    if starts_at.is_some_and(|start| start > now) || ends_at.is_some_and(|end| end < now) {
        return price;
    }
    (price - price * percent / Decimal::ONE_HUNDRED).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dec(value: i64, scale: u32) -> Decimal {
        Decimal::new(value, scale)
    }

    #[test]
    fn test_no_discount_below_thresholds() {
        let quote = loyalty_quote(vec![(dec(1000, 2), 2), (dec(500, 2), 2)], 9);
        assert_eq!(quote.discount_amount, Decimal::ZERO);
        assert_eq!(quote.final_total, quote.base_total);
    }

    #[test]
    fn test_volume_discount_alone() {
        let quote = loyalty_quote(vec![(dec(1000, 2), 5)], 0);
        assert_eq!(quote.base_total, dec(5000, 2));
        assert_eq!(quote.discount_amount, dec(250, 2)); // 5%
        assert_eq!(quote.final_total, dec(4750, 2));
    }

    #[test]
    fn test_loyalty_discount_alone() {
        let quote = loyalty_quote(vec![(dec(1000, 2), 1)], 10);
        assert_eq!(quote.discount_amount, dec(100, 2)); // 10%
        assert_eq!(quote.final_total, dec(900, 2));
    }

    #[test]
    fn test_rates_are_additive_not_compounded() {
        // Worked example: [{100 x 3}, {50 x 2}], 12 completed orders.
        // baseTotal 400, 5 items -> 5% + 10% = 15% -> 60.00 off, 340.00 due.
        let quote = loyalty_quote(vec![(dec(10000, 2), 3), (dec(5000, 2), 2)], 12);
        assert_eq!(quote.base_total, dec(40000, 2));
        assert_eq!(quote.discount_amount, dec(6000, 2));
        assert_eq!(quote.final_total, dec(34000, 2));
    }

    #[test]
    fn test_totals_reconcile_at_every_threshold_combination() {
        let lines = vec![(dec(1999, 2), 3), (dec(750, 2), 4)];
        for completed in [0, 9, 10, 25] {
            let quote = loyalty_quote(lines.clone(), completed);
            assert_eq!(quote.final_total + quote.discount_amount, quote.base_total.round_dp(2));
        }
    }

    #[test]
    fn test_empty_cart_quotes_zero() {
        let quote = loyalty_quote(Vec::<(Decimal, i32)>::new(), 50);
        assert_eq!(quote.base_total, Decimal::ZERO);
        assert_eq!(quote.discount_amount, Decimal::ZERO);
        assert_eq!(quote.final_total, Decimal::ZERO);
    }

    #[test]
    fn test_sale_price_inside_window() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 6, 30, 0, 0, 0).unwrap();
        let price = sale_price(dec(2500, 2), Some(dec(20, 0)), true, Some(start), Some(end), now);
        assert_eq!(price, dec(2000, 2));
    }

    #[test]
    fn test_sale_price_outside_window() {
        let now = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 6, 30, 0, 0, 0).unwrap();
        let price = sale_price(dec(2500, 2), Some(dec(20, 0)), true, Some(start), Some(end), now);
        assert_eq!(price, dec(2500, 2));
    }

    #[test]
    fn test_sale_price_open_bounds_are_unbounded() {
        let now = Utc::now();
        assert_eq!(sale_price(dec(1000, 2), Some(dec(50, 0)), true, None, None, now), dec(500, 2));
    }

    #[test]
    fn test_sale_price_requires_on_sale_flag() {
        let now = Utc::now();
        assert_eq!(sale_price(dec(1000, 2), Some(dec(50, 0)), false, None, None, now), dec(1000, 2));
        assert_eq!(sale_price(dec(1000, 2), None, true, None, None, now), dec(1000, 2));
    }

    #[test]
    fn test_sale_price_rounds_to_two_decimals() {
        let now = Utc::now();
        // 9.99 at 15% off = 8.4915 -> 8.49
        assert_eq!(sale_price(dec(999, 2), Some(dec(15, 0)), true, None, None, now), dec(849, 2));
    }
}
