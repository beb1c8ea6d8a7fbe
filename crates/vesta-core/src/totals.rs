//! # Bill Totals
//!
//! Pure arithmetic for turning a cart of lines into bill totals.
//!
//! ## Where Totals Come From
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  line subtotal = round(quantity × unit_price) − line discount     │
//! │                                                                   │
//! │  subtotal  = Σ line subtotals                                     │
//! │  discount  = amount, or percentage-of-subtotal resolved to cents  │
//! │  total     = subtotal − discount + tax                            │
//! │                                                                   │
//! │  change    = max(0, paid − (total − credit))                      │
//! │  loyalty   = total / 10 000 cents  (1 point per 100 units)        │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The billing engine computes totals exactly once, here, and stores the
//! results; the persisted bill always satisfies
//! `total = subtotal − discount + tax`.

use crate::inputs::SaleLine;
use crate::money::Money;
use crate::types::DiscountType;
use crate::LOYALTY_CENTS_PER_POINT;

/// Computed monetary breakdown of a bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillTotals {
    pub subtotal_cents: i64,
    /// Discount resolved to an amount, whatever the input form was.
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

/// Computes one line's subtotal: `round(quantity × unit_price) − discount`.
pub fn line_subtotal_cents(line: &SaleLine) -> i64 {
    let gross = Money::from_cents(line.unit_price_cents).times_quantity(line.quantity);
    (gross - Money::from_cents(line.discount_cents)).cents()
}

/// Resolves the bill-level discount input to a cent amount.
///
/// Percentage discounts are expressed in basis points and taken from the
/// subtotal with half-up rounding.
pub fn resolve_discount_cents(subtotal_cents: i64, discount: i64, kind: DiscountType) -> i64 {
    match kind {
        DiscountType::Amount => discount,
        DiscountType::Percentage => Money::from_cents(subtotal_cents).percentage(discount).cents(),
    }
}

/// Computes the full monetary breakdown for a set of lines.
pub fn compute_bill_totals(
    items: &[SaleLine],
    discount: i64,
    discount_type: DiscountType,
    tax_cents: i64,
) -> BillTotals {
    let subtotal_cents: i64 = items.iter().map(line_subtotal_cents).sum();
    let discount_cents = resolve_discount_cents(subtotal_cents, discount, discount_type);
    let total_cents = subtotal_cents - discount_cents + tax_cents;

    BillTotals {
        subtotal_cents,
        discount_cents,
        tax_cents,
        total_cents,
    }
}

/// Change due back to the customer.
///
/// The credit portion of the total is not tendered, so change is what was
/// paid beyond `total − credit`, floored at zero.
pub fn change_cents(total_cents: i64, paid_cents: i64, credit_cents: i64) -> i64 {
    (paid_cents - (total_cents - credit_cents)).max(0)
}

/// Loyalty points earned by an identified customer for a sale total:
/// 1 point per 100 currency units, floor division. Walk-ins earn nothing
/// (the caller skips the award when there is no customer).
pub fn loyalty_points_for_total(total_cents: i64) -> i64 {
    if total_cents <= 0 {
        return 0;
    }
    total_cents / LOYALTY_CENTS_PER_POINT
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(qty: f64, unit_price_cents: i64, discount_cents: i64) -> SaleLine {
        SaleLine {
            product_id: 1,
            quantity: qty,
            unit_price_cents,
            discount_cents,
        }
    }

    #[test]
    fn test_line_subtotal_whole_units() {
        // 3 × $2.99 − $0.50 = $8.47
        assert_eq!(line_subtotal_cents(&line(3.0, 299, 50)), 847);
    }

    #[test]
    fn test_line_subtotal_fractional_units() {
        // 1.25 kg × $3.99 = 498.75 → 499
        assert_eq!(line_subtotal_cents(&line(1.25, 399, 0)), 499);
    }

    #[test]
    fn test_totals_amount_discount() {
        let items = [line(2.0, 1000, 0), line(1.0, 500, 0)];
        let totals = compute_bill_totals(&items, 300, DiscountType::Amount, 100);

        assert_eq!(totals.subtotal_cents, 2500);
        assert_eq!(totals.discount_cents, 300);
        assert_eq!(totals.total_cents, 2300);
        // The stored invariant
        assert_eq!(
            totals.total_cents,
            totals.subtotal_cents - totals.discount_cents + totals.tax_cents
        );
    }

    #[test]
    fn test_totals_percentage_discount_resolved_to_amount() {
        let items = [line(1.0, 10_000, 0)];
        // 10% of $100.00 = $10.00
        let totals = compute_bill_totals(&items, 1000, DiscountType::Percentage, 0);

        assert_eq!(totals.discount_cents, 1000);
        assert_eq!(totals.total_cents, 9000);
    }

    #[test]
    fn test_change() {
        // total 2300, credit 0, paid 2500 → change 200
        assert_eq!(change_cents(2300, 2500, 0), 200);
        // exact payment
        assert_eq!(change_cents(2300, 2300, 0), 0);
        // credit covers part; paid covers the rest exactly
        assert_eq!(change_cents(2300, 1300, 1000), 0);
        // underpaid never yields negative change
        assert_eq!(change_cents(2300, 1000, 0), 0);
    }

    #[test]
    fn test_loyalty_floor_division() {
        // total 250.00 → floor(250 / 100) = 2 points
        assert_eq!(loyalty_points_for_total(25_000), 2);
        // 99.99 → 0 points
        assert_eq!(loyalty_points_for_total(9_999), 0);
        // 100.00 → 1 point
        assert_eq!(loyalty_points_for_total(10_000), 1);
        assert_eq!(loyalty_points_for_total(0), 0);
        assert_eq!(loyalty_points_for_total(-500), 0);
    }
}
