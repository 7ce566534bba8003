//! Stock ledger arithmetic.
//!
//! Remaining stock is one counter per [`StockKey`]. Counters never go below
//! zero: a subtraction larger than the counter clamps to zero. A counter that
//! does not exist yet is only created by a positive adjustment.
//!
//! Order items hold stock while they are not cancelled. Every change to an
//! order's items is turned into ledger deltas by comparing the held
//! quantities before and after the change.

use std::collections::{BTreeMap, HashMap};

use crate::domain::inventory::StockKey;
use crate::domain::order::DeliveryStatus;

/// Quantity a counter should be set to after applying `delta`.
///
/// Returns `None` when there is no counter and nothing to add.
pub fn next_quantity(current: Option<i32>, delta: i32) -> Option<i32> {
    match current {
        Some(quantity) => Some(quantity.saturating_add(delta).max(0)),
        None if delta > 0 => Some(delta),
        None => None,
    }
}

/// A named change to one remaining-stock counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockMovement {
    /// Stock arriving from a dealer.
    Receive(i32),
    /// Stock leaving the shelf: sold, damaged or written off.
    Consume(i32),
    /// Stock coming back, e.g. a cancelled line.
    Restore(i32),
}

impl StockMovement {
    /// Signed ledger delta of the movement.
    pub fn delta(self) -> i32 {
        match self {
            StockMovement::Receive(quantity) | StockMovement::Restore(quantity) => quantity,
            StockMovement::Consume(quantity) => -quantity,
        }
    }
}

/// Quantity held per stock key by the given order lines. `None` when a
/// key's total does not fit in an `i32`.
pub fn held_stock<I>(lines: I) -> Option<HashMap<StockKey, i32>>
where
    I: IntoIterator<Item = (StockKey, i32, DeliveryStatus)>,
{
    let mut held: HashMap<StockKey, i32> = HashMap::new();
    for (key, quantity, status) in lines {
        if status.holds_stock() {
            let total = held.entry(key).or_default();
            *total = total.checked_add(quantity)?;
        }
    }
    Some(held)
}

/// Ledger deltas that move stock from the `before` holdings to the `after`
/// holdings. A positive delta returns stock, a negative one consumes it.
///
/// Deltas are ordered by key so concurrent writers touch rows in the same
/// order. `None` when a delta does not fit in an `i32`.
pub fn hold_deltas(
    before: &HashMap<StockKey, i32>,
    after: &HashMap<StockKey, i32>,
) -> Option<Vec<(StockKey, i32)>> {
    let mut deltas: BTreeMap<StockKey, i32> = BTreeMap::new();

    for (key, quantity) in before {
        let delta = deltas.entry(*key).or_default();
        *delta = delta.checked_add(*quantity)?;
    }
    for (key, quantity) in after {
        let delta = deltas.entry(*key).or_default();
        *delta = delta.checked_sub(*quantity)?;
    }

    Some(deltas.into_iter().filter(|(_, delta)| *delta != 0).collect())
}

/// Deltas that replace the effect of a received-stock record: the old record
/// is reversed before the new one is applied.
///
/// When both records use the same key the two steps are merged into one net
/// delta so the intermediate value is never clamped.
pub fn receipt_deltas(
    old: Option<(StockKey, i32)>,
    new: Option<(StockKey, i32)>,
) -> Vec<(StockKey, i32)> {
    match (old, new) {
        (Some((old_key, old_qty)), Some((new_key, new_qty))) if old_key == new_key => {
            let delta = new_qty - old_qty;
            if delta == 0 {
                Vec::new()
            } else {
                vec![(new_key, delta)]
            }
        }
        (old, new) => old
            .map(|(key, quantity)| (key, -quantity))
            .into_iter()
            .chain(new)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHIPS_LARGE: StockKey = StockKey {
        product_id: 1,
        variant_id: Some(2),
    };
    const SUGAR: StockKey = StockKey {
        product_id: 3,
        variant_id: None,
    };

    fn held(lines: &[(StockKey, i32, DeliveryStatus)]) -> HashMap<StockKey, i32> {
        held_stock(lines.iter().copied()).expect("held stock fits")
    }

    fn deltas(
        before: &HashMap<StockKey, i32>,
        after: &HashMap<StockKey, i32>,
    ) -> Vec<(StockKey, i32)> {
        hold_deltas(before, after).expect("deltas fit")
    }

    #[test]
    fn next_quantity_adds_and_clamps() {
        assert_eq!(next_quantity(Some(10), 5), Some(15));
        assert_eq!(next_quantity(Some(10), -4), Some(6));
        assert_eq!(next_quantity(Some(3), -10), Some(0));
    }

    #[test]
    fn next_quantity_creates_only_on_positive_delta() {
        assert_eq!(next_quantity(None, 7), Some(7));
        assert_eq!(next_quantity(None, 0), None);
        assert_eq!(next_quantity(None, -2), None);
    }

    #[test]
    fn movements_map_to_signed_deltas() {
        assert_eq!(StockMovement::Receive(5).delta(), 5);
        assert_eq!(StockMovement::Restore(2).delta(), 2);
        assert_eq!(StockMovement::Consume(3).delta(), -3);
    }

    #[test]
    fn held_stock_ignores_cancelled_lines() {
        let holdings = held(&[
            (CHIPS_LARGE, 3, DeliveryStatus::Pending),
            (CHIPS_LARGE, 2, DeliveryStatus::Delivered),
            (SUGAR, 4, DeliveryStatus::Cancelled),
        ]);

        assert_eq!(holdings.get(&CHIPS_LARGE), Some(&5));
        assert_eq!(holdings.get(&SUGAR), None);
    }

    #[test]
    fn cancelling_an_item_returns_its_stock() {
        let before = held(&[(CHIPS_LARGE, 3, DeliveryStatus::Pending)]);
        let after = held(&[(CHIPS_LARGE, 3, DeliveryStatus::Cancelled)]);

        assert_eq!(deltas(&before, &after), vec![(CHIPS_LARGE, 3)]);
        assert_eq!(deltas(&after, &before), vec![(CHIPS_LARGE, -3)]);
    }

    #[test]
    fn switching_product_moves_stock_between_keys() {
        let before = held(&[(CHIPS_LARGE, 2, DeliveryStatus::Pending)]);
        let after = held(&[(SUGAR, 5, DeliveryStatus::Pending)]);

        assert_eq!(
            deltas(&before, &after),
            vec![(CHIPS_LARGE, 2), (SUGAR, -5)]
        );
    }

    #[test]
    fn unchanged_holdings_produce_no_deltas() {
        let before = held(&[(SUGAR, 1, DeliveryStatus::Pending)]);
        let after = held(&[(SUGAR, 1, DeliveryStatus::Delivered)]);

        assert!(deltas(&before, &after).is_empty());
    }

    #[test]
    fn oversized_holdings_are_reported() {
        let lines = [
            (CHIPS_LARGE, 2_000_000_000, DeliveryStatus::Pending),
            (CHIPS_LARGE, 2_000_000_000, DeliveryStatus::Pending),
        ];
        assert_eq!(held_stock(lines), None);

        let before = HashMap::from([(SUGAR, i32::MAX)]);
        let after = HashMap::from([(SUGAR, -1)]);
        assert_eq!(hold_deltas(&before, &after), None);
    }

    #[test]
    fn receipt_deltas_reverse_before_applying() {
        assert_eq!(
            receipt_deltas(Some((SUGAR, 10)), Some((CHIPS_LARGE, 4))),
            vec![(SUGAR, -10), (CHIPS_LARGE, 4)]
        );
        assert_eq!(receipt_deltas(None, Some((SUGAR, 4))), vec![(SUGAR, 4)]);
        assert_eq!(receipt_deltas(Some((SUGAR, 4)), None), vec![(SUGAR, -4)]);
    }

    #[test]
    fn receipt_deltas_merge_same_key() {
        assert_eq!(
            receipt_deltas(Some((SUGAR, 10)), Some((SUGAR, 12))),
            vec![(SUGAR, 2)]
        );
        assert!(receipt_deltas(Some((SUGAR, 10)), Some((SUGAR, 10))).is_empty());
    }

    #[test]
    fn same_key_receipt_edit_applies_net_change() {
        let apply = |counter: i32, old: i32, new: i32| {
            receipt_deltas(Some((SUGAR, old)), Some((SUGAR, new)))
                .into_iter()
                .try_fold(counter, |counter, (_, delta)| next_quantity(Some(counter), delta))
        };

        assert_eq!(apply(2, 10, 12), Some(4));
        assert_eq!(apply(2, 10, 8), Some(0));
    }
}
