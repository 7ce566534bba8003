use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::hall::Hall;
use crate::domain::order::CustomerDetails;
use crate::domain::pricing::LineRequest;
use crate::forms::{
    MAX_MONEY, MAX_QUANTITY, default_quantity, optional_date, optional_id, optional_money,
    optional_text, quantity, sanitize_inline_text,
};

const NAME_MAX_LEN: u64 = 128;
const PHONE_MAX_LEN: u64 = 32;
const ROLL_MAX_LEN: u64 = 32;

pub type OrderFormResult<T> = Result<T, OrderFormError>;

/// Errors that can occur while processing an order payload.
#[derive(Debug, Error)]
pub enum OrderFormError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("customer name cannot be empty")]
    EmptyName,
    #[error("customer phone cannot be empty")]
    EmptyPhone,
    #[error("unknown hall `{0}`")]
    UnknownHall(String),
    #[error("item {line} has no product")]
    MissingProduct { line: usize },
    #[error("item {line} is listed more than once")]
    DuplicateItem { line: usize },
    #[error("item {line} has a quantity or amount outside the accepted range")]
    OutOfRange { line: usize },
    #[error("order has no items")]
    NoItems,
    #[error("failed to parse order form: {0}")]
    Encoding(#[from] serde_qs::Error),
}

/// One requested line of an order. `id` refers to an existing item when the
/// order is being edited.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemPayload {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<i32>,
    #[serde(default, deserialize_with = "optional_id")]
    pub product_id: Option<i32>,
    #[serde(default, deserialize_with = "optional_id")]
    pub variant_id: Option<i32>,
    #[serde(default = "default_quantity", deserialize_with = "quantity")]
    pub quantity: i32,
    #[serde(default, deserialize_with = "optional_money")]
    pub amount_paid: Option<i64>,
    #[serde(default, deserialize_with = "optional_money")]
    pub discount: Option<i64>,
}

/// Order payload shared by the JSON API and the HTML order form.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OrderPayload {
    #[validate(length(min = 1, max = NAME_MAX_LEN))]
    pub customer_name: String,
    #[validate(length(min = 1, max = PHONE_MAX_LEN))]
    pub customer_phone: String,
    #[serde(default, deserialize_with = "optional_text")]
    #[validate(length(max = PHONE_MAX_LEN))]
    pub customer_alt_phone: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    #[validate(length(max = ROLL_MAX_LEN))]
    pub customer_roll: Option<String>,
    pub hall: String,
    #[serde(default, deserialize_with = "optional_date")]
    pub delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub items: Vec<ItemPayload>,
}

/// A priced-to-be line, keyed by the existing item id when editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftLine {
    pub id: Option<i32>,
    pub request: LineRequest,
}

/// Validated order payload ready for pricing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub customer: CustomerDetails,
    pub hall: Hall,
    pub delivery_date: NaiveDate,
    pub lines: Vec<DraftLine>,
}

impl OrderPayload {
    /// Parse the bracketed HTML form encoding (`items[0][product_id]=3`).
    pub fn from_form_body(body: &[u8]) -> OrderFormResult<Self> {
        Ok(serde_qs::Config::new(5, false).deserialize_bytes(body)?)
    }

    /// Validate and normalise the payload. Orders without a delivery date
    /// are due `today`.
    pub fn into_draft(self, today: NaiveDate) -> OrderFormResult<OrderDraft> {
        self.validate()?;

        let name = sanitize_inline_text(&self.customer_name);
        if name.is_empty() {
            return Err(OrderFormError::EmptyName);
        }

        let phone = sanitize_inline_text(&self.customer_phone);
        if phone.is_empty() {
            return Err(OrderFormError::EmptyPhone);
        }

        let hall = self
            .hall
            .parse::<Hall>()
            .map_err(|_| OrderFormError::UnknownHall(self.hall.trim().to_string()))?;

        let mut seen_ids = Vec::new();
        let mut lines = Vec::with_capacity(self.items.len());

        for (index, item) in self.items.into_iter().enumerate() {
            let line = index + 1;
            let Some(product_id) = item.product_id else {
                let carries_money = [item.amount_paid, item.discount]
                    .into_iter()
                    .any(|amount| amount.is_some_and(|value| value != 0));
                if carries_money {
                    return Err(OrderFormError::MissingProduct { line });
                }
                // Blank or cleared row.
                continue;
            };

            let amount_paid = item.amount_paid.unwrap_or(0);
            let discount = item.discount.unwrap_or(0);
            if item.quantity > MAX_QUANTITY
                || !(0..=MAX_MONEY).contains(&amount_paid)
                || !(0..=MAX_MONEY).contains(&discount)
            {
                return Err(OrderFormError::OutOfRange { line });
            }

            if let Some(id) = item.id {
                if seen_ids.contains(&id) {
                    return Err(OrderFormError::DuplicateItem { line });
                }
                seen_ids.push(id);
            }

            lines.push(DraftLine {
                id: item.id,
                request: LineRequest {
                    product_id,
                    variant_id: item.variant_id,
                    quantity: item.quantity,
                    amount_paid,
                    discount,
                },
            });
        }

        Ok(OrderDraft {
            customer: CustomerDetails {
                name,
                phone,
                alt_phone: self.customer_alt_phone,
                roll: self.customer_roll,
            },
            hall,
            delivery_date: self.delivery_date.unwrap_or(today),
            lines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 1).unwrap_or_default()
    }

    fn payload(items: Vec<ItemPayload>) -> OrderPayload {
        OrderPayload {
            customer_name: "  Asha   Rao ".to_string(),
            customer_phone: "9876543210".to_string(),
            customer_alt_phone: None,
            customer_roll: Some("21CS1001".to_string()),
            hall: "Nehru".to_string(),
            delivery_date: None,
            items,
        }
    }

    fn item(product_id: i32) -> ItemPayload {
        ItemPayload {
            id: None,
            product_id: Some(product_id),
            variant_id: None,
            quantity: 1,
            amount_paid: None,
            discount: None,
        }
    }

    #[test]
    fn draft_normalises_customer_and_defaults_date() {
        let draft = payload(vec![item(3)]).into_draft(today()).expect("valid payload");

        assert_eq!(draft.customer.name, "Asha Rao");
        assert_eq!(draft.hall, Hall::Nehru);
        assert_eq!(draft.delivery_date, today());
        assert_eq!(draft.lines.len(), 1);
        assert_eq!(draft.lines[0].request.amount_paid, 0);
    }

    #[test]
    fn unknown_hall_is_rejected() {
        let mut payload = payload(vec![item(3)]);
        payload.hall = "Atlantis".to_string();

        let result = payload.into_draft(today());

        assert!(matches!(result, Err(OrderFormError::UnknownHall(hall)) if hall == "Atlantis"));
    }

    #[test]
    fn paid_line_without_product_is_rejected() {
        let mut line = item(3);
        line.product_id = None;
        line.amount_paid = Some(500);

        let result = payload(vec![item(1), line]).into_draft(today());

        assert!(matches!(result, Err(OrderFormError::MissingProduct { line: 2 })));
    }

    #[test]
    fn blank_and_cleared_rows_are_skipped() {
        let mut blank = item(3);
        blank.product_id = None;
        let mut cleared = item(4);
        cleared.id = Some(12);
        cleared.product_id = None;
        cleared.amount_paid = Some(0);

        let draft = payload(vec![blank, item(1), cleared])
            .into_draft(today())
            .expect("valid payload");

        assert_eq!(draft.lines.len(), 1);
        assert_eq!(draft.lines[0].request.product_id, 1);
    }

    #[test]
    fn repeated_item_id_is_rejected() {
        let mut first = item(1);
        first.id = Some(10);
        let mut second = item(2);
        second.id = Some(10);

        let result = payload(vec![first, second]).into_draft(today());

        assert!(matches!(result, Err(OrderFormError::DuplicateItem { line: 2 })));
    }

    #[test]
    fn oversized_lines_are_rejected() {
        let mut bulk = item(1);
        bulk.quantity = 2_000_000_000;
        let result = payload(vec![item(1), bulk]).into_draft(today());
        assert!(matches!(result, Err(OrderFormError::OutOfRange { line: 2 })));

        let mut overpaid = item(1);
        overpaid.amount_paid = Some(i64::MAX / 100 * 100);
        let result = payload(vec![overpaid]).into_draft(today());
        assert!(matches!(result, Err(OrderFormError::OutOfRange { line: 1 })));
    }

    #[test]
    fn json_payload_parses_money_and_quantity() {
        let raw = r#"{
            "customer_name": "Ravi",
            "customer_phone": "99999",
            "hall": "lbs",
            "delivery_date": "2025-09-03",
            "items": [{"product_id": 1, "variant_id": 2, "quantity": "3", "amount_paid": 50}]
        }"#;

        let draft = serde_json::from_str::<OrderPayload>(raw)
            .expect("valid json")
            .into_draft(today())
            .expect("valid payload");

        assert_eq!(draft.hall, Hall::Lbs);
        assert_eq!(draft.delivery_date, NaiveDate::from_ymd_opt(2025, 9, 3).unwrap());
        assert_eq!(
            draft.lines[0].request,
            LineRequest {
                product_id: 1,
                variant_id: Some(2),
                quantity: 3,
                amount_paid: 5000,
                discount: 0,
            }
        );
    }

    #[test]
    fn html_form_body_parses_nested_items() {
        let body = b"customer_name=Ravi&customer_phone=99999&customer_alt_phone=&hall=patel&delivery_date=&items[0][id]=&items[0][product_id]=4&items[0][quantity]=2&items[0][amount_paid]=10.50&items[1][id]=7&items[1][product_id]=5&items[1][variant_id]=9";

        let payload = OrderPayload::from_form_body(body).expect("valid form body");

        assert_eq!(payload.customer_alt_phone, None);
        assert_eq!(payload.delivery_date, None);
        assert_eq!(payload.items.len(), 2);
        assert_eq!(payload.items[0].id, None);
        assert_eq!(payload.items[0].amount_paid, Some(1050));
        assert_eq!(payload.items[1].id, Some(7));
        assert_eq!(payload.items[1].quantity, 1);
        assert_eq!(payload.items[1].variant_id, Some(9));
    }
}
