//! Order pricing.
//!
//! Lines are priced from the live catalog exactly once, when they are created
//! or edited. The resulting unit price is stored on the order item and all
//! later totals are computed from that snapshot.

use thiserror::Error;

use crate::domain::inventory::StockKey;
use crate::domain::order::{NewOrderItem, OrderItem};
use crate::domain::product::{Product, Variant};

/// Reasons a line cannot be priced against the catalog.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("product #{0} was not found")]
    UnknownProduct(i32),
    #[error("product «{product}» has no variant #{variant_id}")]
    UnknownVariant { product: String, variant_id: i32 },
    #[error("choose a variant for «{0}»")]
    VariantRequired(String),
    #[error("«{0}» has no variants")]
    VariantNotAllowed(String),
    #[error("«{0}» is archived")]
    Archived(String),
    #[error("«{0}» has no price")]
    MissingPrice(String),
    #[error("the total for «{0}» is too large")]
    TotalOverflow(String),
}

/// A customer's request for one line before pricing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRequest {
    pub product_id: i32,
    pub variant_id: Option<i32>,
    pub quantity: i32,
    pub amount_paid: i64,
    pub discount: i64,
}

/// Resolve the variant referenced by a line, validating it against the
/// product's pricing mode.
pub fn resolve_variant(
    product: &Product,
    variant_id: Option<i32>,
) -> Result<Option<&Variant>, PricingError> {
    match variant_id {
        Some(variant_id) => {
            if !product.has_variants() {
                return Err(PricingError::VariantNotAllowed(product.name.clone()));
            }
            product
                .variant(variant_id)
                .map(Some)
                .ok_or_else(|| PricingError::UnknownVariant {
                    product: product.name.clone(),
                    variant_id,
                })
        }
        None if product.has_variants() => Err(PricingError::VariantRequired(product.name.clone())),
        None => Ok(None),
    }
}

/// Current catalog price of a product or one of its variants, in paise.
pub fn resolve_unit_price(product: &Product, variant_id: Option<i32>) -> Result<i64, PricingError> {
    match resolve_variant(product, variant_id)? {
        Some(variant) => Ok(variant.price),
        None => product
            .price
            .ok_or_else(|| PricingError::MissingPrice(product.name.clone())),
    }
}

/// Stock key a line or receipt for this product should be counted under.
pub fn resolve_stock_key(product: &Product, variant_id: Option<i32>) -> Result<StockKey, PricingError> {
    let variant = resolve_variant(product, variant_id)?;
    Ok(StockKey::new(product.id, variant.map(|variant| variant.id)))
}

/// Price a requested line against the current catalog.
///
/// Quantities below one are raised to one. Archived products cannot be
/// ordered.
pub fn price_line(product: &Product, request: &LineRequest) -> Result<NewOrderItem, PricingError> {
    if product.is_archived {
        return Err(PricingError::Archived(product.name.clone()));
    }
    reprice_line(product, request)
}

/// Re-resolve the price of a line that already exists on an order. Unlike
/// [`price_line`] this accepts archived products.
pub fn reprice_line(product: &Product, request: &LineRequest) -> Result<NewOrderItem, PricingError> {
    if product.id != request.product_id {
        return Err(PricingError::UnknownProduct(request.product_id));
    }

    let variant = resolve_variant(product, request.variant_id)?;
    let unit_price = resolve_unit_price(product, request.variant_id)?;
    let quantity = request.quantity.max(1);
    let total_price = line_total(unit_price, quantity)
        .ok_or_else(|| PricingError::TotalOverflow(product.name.clone()))?;

    Ok(NewOrderItem {
        product_id: product.id,
        variant_id: variant.map(|variant| variant.id),
        name: product.display_name(variant),
        quantity,
        unit_price,
        total_price,
        amount_paid: request.amount_paid,
        discount: request.discount,
    })
}

/// `unit_price * quantity`, or `None` when the product overflows.
pub fn line_total(unit_price: i64, quantity: i32) -> Option<i64> {
    unit_price.checked_mul(i64::from(quantity))
}

/// Monetary amounts carried by a priced line.
pub trait LineAmounts {
    fn total_price(&self) -> Option<i64>;
    fn amount_paid(&self) -> i64;
    fn discount(&self) -> i64;
}

impl LineAmounts for NewOrderItem {
    fn total_price(&self) -> Option<i64> {
        Some(self.total_price)
    }

    fn amount_paid(&self) -> i64 {
        self.amount_paid
    }

    fn discount(&self) -> i64 {
        self.discount
    }
}

impl LineAmounts for OrderItem {
    fn total_price(&self) -> Option<i64> {
        line_total(self.unit_price, self.quantity)
    }

    fn amount_paid(&self) -> i64 {
        self.amount_paid
    }

    fn discount(&self) -> i64 {
        self.discount
    }
}

/// Order-level aggregates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderTotals {
    pub total_amount: i64,
    pub total_paid: i64,
    pub total_discount: i64,
}

impl OrderTotals {
    /// Sum the amounts of every line. `None` when any sum overflows.
    pub fn from_lines<'a, L, I>(lines: I) -> Option<Self>
    where
        L: LineAmounts + 'a,
        I: IntoIterator<Item = &'a L>,
    {
        lines.into_iter().try_fold(Self::default(), |totals, line| {
            Some(Self {
                total_amount: totals.total_amount.checked_add(line.total_price()?)?,
                total_paid: totals.total_paid.checked_add(line.amount_paid())?,
                total_discount: totals.total_discount.checked_add(line.discount())?,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn chips() -> Product {
        Product {
            id: 1,
            hub_id: 1,
            name: "Chips".to_string(),
            price: None,
            is_archived: false,
            variants: vec![
                Variant {
                    id: 10,
                    product_id: 1,
                    name: "Small".to_string(),
                    price: 2000,
                },
                Variant {
                    id: 11,
                    product_id: 1,
                    name: "Large".to_string(),
                    price: 3500,
                },
            ],
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        }
    }

    fn sugar() -> Product {
        Product {
            id: 2,
            hub_id: 1,
            name: "Sugar".to_string(),
            price: Some(4500),
            is_archived: false,
            variants: Vec::new(),
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        }
    }

    fn request(product_id: i32, variant_id: Option<i32>, quantity: i32) -> LineRequest {
        LineRequest {
            product_id,
            variant_id,
            quantity,
            amount_paid: 0,
            discount: 0,
        }
    }

    #[test]
    fn resolves_variant_and_flat_prices() {
        assert_eq!(resolve_unit_price(&chips(), Some(11)), Ok(3500));
        assert_eq!(resolve_unit_price(&sugar(), None), Ok(4500));
    }

    #[test]
    fn rejects_mismatched_variant_references() {
        assert_eq!(
            resolve_unit_price(&chips(), None),
            Err(PricingError::VariantRequired("Chips".to_string()))
        );
        assert_eq!(
            resolve_unit_price(&sugar(), Some(10)),
            Err(PricingError::VariantNotAllowed("Sugar".to_string()))
        );
        assert!(matches!(
            resolve_unit_price(&chips(), Some(99)),
            Err(PricingError::UnknownVariant { variant_id: 99, .. })
        ));
    }

    #[test]
    fn price_line_snapshots_unit_price_and_name() {
        let mut line = request(1, Some(11), 3);
        line.amount_paid = 5000;

        let priced = price_line(&chips(), &line).expect("line should price");

        assert_eq!(priced.unit_price, 3500);
        assert_eq!(priced.total_price, 10500);
        assert_eq!(priced.amount_paid, 5000);
        assert_eq!(priced.name, "Chips (Large)");
        assert_eq!(priced.variant_id, Some(11));
    }

    #[test]
    fn price_line_raises_quantity_to_one() {
        let priced = price_line(&sugar(), &request(2, None, 0)).expect("line should price");
        assert_eq!(priced.quantity, 1);
        assert_eq!(priced.total_price, 4500);

        let priced = price_line(&sugar(), &request(2, None, -4)).expect("line should price");
        assert_eq!(priced.quantity, 1);
    }

    #[test]
    fn price_line_rejects_archived_products() {
        let mut product = sugar();
        product.is_archived = true;

        assert_eq!(
            price_line(&product, &request(2, None, 1)),
            Err(PricingError::Archived("Sugar".to_string()))
        );

        let repriced = reprice_line(&product, &request(2, None, 2)).expect("existing line");
        assert_eq!(repriced.total_price, repriced.unit_price * 2);
    }

    #[test]
    fn totals_sum_every_line() {
        let lines = vec![
            price_line(
                &chips(),
                &LineRequest {
                    amount_paid: 5000,
                    discount: 500,
                    ..request(1, Some(11), 3)
                },
            )
            .expect("chips"),
            price_line(
                &sugar(),
                &LineRequest {
                    amount_paid: 4500,
                    ..request(2, None, 2)
                },
            )
            .expect("sugar"),
        ];

        let totals = OrderTotals::from_lines(&lines).expect("totals fit");

        assert_eq!(totals.total_amount, 10500 + 9000);
        assert_eq!(totals.total_paid, 9500);
        assert_eq!(totals.total_discount, 500);
    }

    #[test]
    fn oversized_line_total_is_rejected() {
        let mut expensive = sugar();
        expensive.price = Some(i64::MAX / 100 * 100);

        assert_eq!(line_total(i64::MAX / 2, 3), None);
        assert_eq!(
            price_line(&expensive, &request(2, None, 2)),
            Err(PricingError::TotalOverflow("Sugar".to_string()))
        );
    }

    #[test]
    fn totals_overflow_is_reported() {
        let line = price_line(
            &sugar(),
            &LineRequest {
                amount_paid: i64::MAX / 100 * 100,
                ..request(2, None, 1)
            },
        )
        .expect("sugar");

        assert_eq!(OrderTotals::from_lines(&[line.clone(), line]), None);
    }

    #[test]
    fn stock_key_follows_variant() {
        assert_eq!(
            resolve_stock_key(&chips(), Some(10)),
            Ok(StockKey::new(1, Some(10)))
        );
        assert_eq!(resolve_stock_key(&sugar(), None), Ok(StockKey::new(2, None)));
    }
}
