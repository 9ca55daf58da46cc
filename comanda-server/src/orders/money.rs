//! Money calculation using rust_decimal
//!
//! Amounts are stored as `f64` (SQLite REAL). Every calculation converts to
//! `Decimal`, and results are rounded to cents on the way back.

use rust_decimal::prelude::*;
use shared::models::DiscountKind;

/// Cents, half away from zero
const DECIMAL_PLACES: u32 = 2;

/// Maximum unit price, modifier price, discount amount or payment
pub const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum quantity per line
pub const MAX_QUANTITY: i64 = 9999;

/// Amounts of one order line, as snapshotted on the item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineAmounts {
    pub unit_price: f64,
    pub quantity: i64,
    pub modifier_prices: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscountAmount {
    pub kind: DiscountKind,
    pub value: f64,
}

/// Derived order totals
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrderTotals {
    pub subtotal: f64,
    pub discount_total: f64,
    pub total: f64,
}

/// f64 → Decimal. NaN and infinities become zero.
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Decimal → f64, rounded to cents
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    round_money(value).to_f64().unwrap_or_default()
}

#[inline]
fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// `(unit_price + Σ modifier prices) × quantity`
pub fn line_total(line: &LineAmounts) -> Decimal {
    let modifiers: Decimal = line.modifier_prices.iter().map(|p| to_decimal(*p)).sum();
    (to_decimal(line.unit_price) + modifiers) * Decimal::from(line.quantity)
}

/// Reduction produced by one discount against `subtotal`
pub fn discount_amount(discount: &DiscountAmount, subtotal: Decimal) -> Decimal {
    let value = to_decimal(discount.value);
    match discount.kind {
        DiscountKind::Percentage => subtotal * value / Decimal::ONE_HUNDRED,
        DiscountKind::Fixed => value,
    }
}

/// Recompute subtotal, discount total and total.
///
/// `total = max(0, subtotal - discount_total)`; `discount_total` itself is not
/// capped so the applied reductions stay visible.
pub fn calculate_totals(lines: &[LineAmounts], discounts: &[DiscountAmount]) -> OrderTotals {
    let subtotal: Decimal = lines.iter().map(line_total).sum();
    let subtotal = round_money(subtotal);

    let discount_total: Decimal = discounts.iter().map(|d| discount_amount(d, subtotal)).sum();
    let discount_total = round_money(discount_total);

    let total = (subtotal - discount_total).max(Decimal::ZERO);

    OrderTotals {
        subtotal: to_f64(subtotal),
        discount_total: to_f64(discount_total),
        total: to_f64(total),
    }
}

/// Sum of payment amounts
pub fn sum_payments(amounts: &[f64]) -> f64 {
    to_f64(amounts.iter().map(|a| to_decimal(*a)).sum())
}

/// An order is paid once it has at least one payment and the cumulative
/// amount reaches the total, compared at cent precision.
pub fn is_fully_paid(payment_count: usize, paid: f64, total: f64) -> bool {
    payment_count > 0 && round_money(to_decimal(paid)) >= round_money(to_decimal(total))
}
