//! Line item value object.
//!
//! A [`LineItem`] pins a catalog reference, a quantity and the unit price that was current
//! when the line was rung up. It is built once at transaction time and its price is written
//! verbatim into `order_items.price` or `sale_items.price`; nothing later re-derives it from
//! the catalog, so historical totals stay accurate after price changes.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Largest amount a `DECIMAL(10,2)` price or total column holds
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0x540B_E3FF, 2, 0, false, 2); // 99999999.99

/// Reference to a variant, used by the orders ledger
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantRef(pub i64);

/// Reference to a product, used by the sales ledger
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductRef(pub i64);

/// One validated line of an order or sale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LineItem<R> {
    reference: R,
    quantity: i32,
    unit_price: Decimal,
}

impl<R: Copy> LineItem<R> {
    /// Builds a line, rejecting non-positive quantities and prices the ledger cannot store.
    ///
    /// The price must be a whole number of cents between zero and [`MAX_AMOUNT`]. Free
    /// lines are allowed.
    ///
    /// # Errors
    /// Returns `Error::InvalidQuantity` or `Error::InvalidPrice`.
    pub fn new(reference: R, quantity: i32, unit_price: Decimal) -> Result<Self> {
        if quantity <= 0 {
            return Err(Error::InvalidQuantity { quantity });
        }
        validate_amount(unit_price)?;
        Ok(Self {
            reference,
            quantity,
            unit_price,
        })
    }

    /// Catalog reference of the line
    #[must_use]
    pub const fn reference(&self) -> R {
        self.reference
    }

    /// Units on the line
    #[must_use]
    pub const fn quantity(&self) -> i32 {
        self.quantity
    }

    /// Snapshot unit price
    #[must_use]
    pub const fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// `unit_price * quantity`
    ///
    /// # Errors
    /// Returns `Error::AmountOverflow` if the product exceeds [`MAX_AMOUNT`].
    pub fn subtotal(&self) -> Result<Decimal> {
        self.unit_price
            .checked_mul(Decimal::from(self.quantity))
            .filter(|subtotal| *subtotal <= MAX_AMOUNT)
            .ok_or(Error::AmountOverflow { kind: "line" })
    }
}

/// Sum of the subtotals of `lines`.
///
/// Prices are whole cents, so the sum is exact and equals what the item rows add up to.
///
/// # Errors
/// Returns `Error::AmountOverflow` (tagged with `kind`) if any subtotal or the sum exceeds
/// [`MAX_AMOUNT`].
pub fn total_of<R: Copy>(lines: &[LineItem<R>], kind: &'static str) -> Result<Decimal> {
    lines
        .iter()
        .try_fold(Decimal::ZERO, |total, line| {
            total
                .checked_add(line.subtotal().map_err(|_| Error::AmountOverflow { kind })?)
                .filter(|total| *total <= MAX_AMOUNT)
                .ok_or(Error::AmountOverflow { kind })
        })
        .map(round_money)
}

/// Rejects a price or amount that `DECIMAL(10,2)` cannot hold exactly.
///
/// # Errors
/// Returns `Error::InvalidPrice` for negative amounts, fractions of a cent, or amounts
/// above [`MAX_AMOUNT`].
pub fn validate_amount(price: Decimal) -> Result<()> {
    if price < Decimal::ZERO || price > MAX_AMOUNT || price.normalize().scale() > 2 {
        return Err(Error::InvalidPrice { price });
    }
    Ok(())
}

/// Rounds an amount to the two decimal places the ledger stores.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp(2)
}

/// Rejects an empty set of lines for a ledger entry of the given kind.
///
/// # Errors
/// Returns `Error::EmptyTransaction` when `lines` is empty.
pub fn validate_lines<R>(lines: &[LineItem<R>], kind: &'static str) -> Result<()> {
    if lines.is_empty() {
        return Err(Error::EmptyTransaction { kind });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rejects_non_positive_quantity() {
        let zero = LineItem::new(VariantRef(1), 0, dec!(10.00));
        assert!(matches!(zero, Err(Error::InvalidQuantity { quantity: 0 })));

        let negative = LineItem::new(VariantRef(1), -3, dec!(10.00));
        assert!(matches!(negative, Err(Error::InvalidQuantity { quantity: -3 })));
    }

    #[test]
    fn test_rejects_negative_price_but_allows_free_items() {
        let negative = LineItem::new(ProductRef(1), 1, dec!(-0.01));
        assert!(matches!(negative, Err(Error::InvalidPrice { .. })));

        let free = LineItem::new(ProductRef(1), 1, Decimal::ZERO).unwrap();
        assert_eq!(free.subtotal().unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_rejects_prices_the_ledger_cannot_store() {
        let sub_cent = LineItem::new(VariantRef(1), 1, dec!(0.005));
        assert!(matches!(sub_cent, Err(Error::InvalidPrice { .. })));

        let huge = LineItem::new(VariantRef(1), 2, Decimal::MAX);
        assert!(matches!(huge, Err(Error::InvalidPrice { .. })));

        let too_big = LineItem::new(VariantRef(1), 1, dec!(100000000.00));
        assert!(matches!(too_big, Err(Error::InvalidPrice { .. })));

        // Trailing zeros are not extra precision
        let ceiling = LineItem::new(VariantRef(1), 1, dec!(99999999.9900)).unwrap();
        assert_eq!(ceiling.unit_price(), MAX_AMOUNT);
    }

    #[test]
    fn test_totals_that_overflow_are_errors() {
        let line = LineItem::new(VariantRef(1), i32::MAX, MAX_AMOUNT).unwrap();
        assert!(matches!(
            line.subtotal(),
            Err(Error::AmountOverflow { kind: "line" })
        ));

        let lines = vec![
            LineItem::new(VariantRef(1), 1, MAX_AMOUNT).unwrap(),
            LineItem::new(VariantRef(2), 1, dec!(0.01)).unwrap(),
        ];
        assert!(matches!(
            total_of(&lines, "order"),
            Err(Error::AmountOverflow { kind: "order" })
        ));
    }

    #[test]
    fn test_total_of_sums_subtotals() {
        let lines = vec![
            LineItem::new(VariantRef(1), 2, dec!(49.99)).unwrap(),
            LineItem::new(VariantRef(2), 1, dec!(79.99)).unwrap(),
        ];
        assert_eq!(total_of(&lines, "order").unwrap(), dec!(179.97));
        assert_eq!(lines[0].subtotal().unwrap(), dec!(99.98));
        assert_eq!(lines[1].reference(), VariantRef(2));
    }

    #[test]
    fn test_validate_lines() {
        let none: Vec<LineItem<ProductRef>> = Vec::new();
        assert!(matches!(
            validate_lines(&none, "sale"),
            Err(Error::EmptyTransaction { kind: "sale" })
        ));
        let one = vec![LineItem::new(ProductRef(4), 1, dec!(2.50)).unwrap()];
        assert!(validate_lines(&one, "sale").is_ok());
    }
}
