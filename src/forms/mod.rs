//! Request payloads accepted by the HTML forms and the JSON API, together
//! with the lenient field parsers they share.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, de};

pub mod delivery;
pub mod finance;
pub mod inventory;
pub mod orders;
pub mod products;

/// Quantity used when a line arrives without a usable quantity.
pub const DEFAULT_QUANTITY: i32 = 1;

/// Largest quantity accepted on an order line or a stock record.
pub const MAX_QUANTITY: i32 = 10_000;

/// Largest amount accepted in a single money field, in paise (₹1 crore).
pub const MAX_MONEY: i64 = 1_000_000_000;

/// A scalar field as it arrives from either a JSON body or a urlencoded form.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Parse a rupee amount such as `35`, `35.5` or `₹1,250.75` into paise.
///
/// Negative amounts and more than two decimal places are rejected.
pub fn parse_money(input: &str) -> Option<i64> {
    let cleaned: String = input
        .trim()
        .trim_start_matches('₹')
        .chars()
        .filter(|ch| *ch != ',' && !ch.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let (whole, fraction) = match cleaned.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (cleaned.as_str(), ""),
    };

    if fraction.len() > 2
        || !whole.chars().all(|ch| ch.is_ascii_digit())
        || !fraction.chars().all(|ch| ch.is_ascii_digit())
        || (whole.is_empty() && fraction.is_empty())
    {
        return None;
    }

    let rupees: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let paise: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().ok()? * 10,
        _ => fraction.parse().ok()?,
    };

    rupees.checked_mul(100)?.checked_add(paise)
}

fn money_from_scalar(value: Scalar) -> Result<Option<i64>, String> {
    let paise = match value {
        Scalar::Int(rupees) if rupees >= 0 => rupees.checked_mul(100),
        Scalar::Float(rupees) if rupees >= 0.0 && rupees.is_finite() => {
            let paise = (rupees * 100.0).round();
            (paise <= MAX_MONEY as f64).then_some(paise as i64)
        }
        Scalar::Text(text) if text.trim().is_empty() => return Ok(None),
        Scalar::Text(text) => Some(
            parse_money(&text).ok_or_else(|| format!("invalid amount `{}`", text.trim()))?,
        ),
        Scalar::Int(rupees) => return Err(format!("invalid amount `{rupees}`")),
        Scalar::Float(rupees) => return Err(format!("invalid amount `{rupees}`")),
    };

    match paise {
        Some(paise) if paise <= MAX_MONEY => Ok(Some(paise)),
        _ => Err(format!("amount exceeds ₹{}", MAX_MONEY / 100)),
    }
}

/// Money in rupees (number or decimal string) converted to paise. Blank
/// values and `null` become `None`.
pub fn optional_money<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Scalar>::deserialize(deserializer)? {
        Some(value) => money_from_scalar(value).map_err(de::Error::custom),
        None => Ok(None),
    }
}

/// Record identifier given as a number or numeric text. Blank values and
/// `null` become `None`.
pub fn optional_id<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Scalar>::deserialize(deserializer)? {
        Some(Scalar::Int(id)) => i32::try_from(id)
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid id `{id}`"))),
        Some(Scalar::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Scalar::Text(text)) => text
            .trim()
            .parse::<i32>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid id `{}`", text.trim()))),
        Some(Scalar::Float(value)) => Err(de::Error::custom(format!("invalid id `{value}`"))),
        None => Ok(None),
    }
}

/// Line quantity. Anything missing, unparsable or below one becomes one;
/// quantities above [`MAX_QUANTITY`] are rejected.
pub fn quantity<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let parsed = match Option::<Scalar>::deserialize(deserializer)? {
        Some(Scalar::Int(value)) => Some(value),
        Some(Scalar::Float(value)) if value.is_finite() => Some(value.trunc() as i64),
        Some(Scalar::Text(text)) => text.trim().parse::<i64>().ok(),
        _ => None,
    };

    match parsed {
        Some(value) if value > i64::from(MAX_QUANTITY) => Err(de::Error::custom(format!(
            "quantity `{value}` exceeds {MAX_QUANTITY}"
        ))),
        Some(value) if value >= 1 => i32::try_from(value).map_err(de::Error::custom),
        _ => Ok(DEFAULT_QUANTITY),
    }
}

pub fn default_quantity() -> i32 {
    DEFAULT_QUANTITY
}

/// Trimmed text where blank values and `null` become `None`.
pub fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty()))
}

/// ISO `YYYY-MM-DD` date. Blank values and `null` become `None`.
pub fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match optional_text(deserializer)? {
        Some(text) => NaiveDate::parse_from_str(&text, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid date `{text}`"))),
        None => Ok(None),
    }
}

/// Collapse runs of whitespace and drop control characters.
pub(crate) fn sanitize_inline_text(input: &str) -> String {
    let mut sanitized = String::with_capacity(input.len());
    let mut previous_whitespace = false;

    for ch in input.trim().chars() {
        if ch.is_whitespace() {
            if !previous_whitespace {
                sanitized.push(' ');
                previous_whitespace = true;
            }
        } else if ch.is_control() {
            continue;
        } else {
            sanitized.push(ch);
            previous_whitespace = false;
        }
    }

    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Line {
        #[serde(default, deserialize_with = "optional_id")]
        product_id: Option<i32>,
        #[serde(default = "default_quantity", deserialize_with = "quantity")]
        quantity: i32,
        #[serde(default, deserialize_with = "optional_money")]
        amount_paid: Option<i64>,
    }

    #[test]
    fn parse_money_handles_rupee_strings() {
        assert_eq!(parse_money("35"), Some(3500));
        assert_eq!(parse_money("35.5"), Some(3550));
        assert_eq!(parse_money(" ₹1,250.75 "), Some(125_075));
        assert_eq!(parse_money(".5"), Some(50));
        assert_eq!(parse_money("-3"), None);
        assert_eq!(parse_money("1.234"), None);
        assert_eq!(parse_money("abc"), None);
        assert_eq!(parse_money(""), None);
    }

    #[test]
    fn json_numbers_and_strings_are_accepted() {
        let line: Line =
            serde_json::from_str(r#"{"product_id": "7", "quantity": 3, "amount_paid": 50}"#)
                .expect("valid line");

        assert_eq!(line.product_id, Some(7));
        assert_eq!(line.quantity, 3);
        assert_eq!(line.amount_paid, Some(5000));

        let line: Line = serde_json::from_str(r#"{"product_id": 7, "amount_paid": "12.50"}"#)
            .expect("valid line");
        assert_eq!(line.amount_paid, Some(1250));
    }

    #[test]
    fn invalid_quantity_is_coerced_to_one() {
        for raw in [
            r#"{"quantity": 0}"#,
            r#"{"quantity": -4}"#,
            r#"{"quantity": "lots"}"#,
            r#"{"quantity": null}"#,
            r#"{}"#,
        ] {
            let line: Line = serde_json::from_str(raw).expect("lenient quantity");
            assert_eq!(line.quantity, 1, "payload {raw}");
        }
    }

    #[test]
    fn oversized_quantity_and_money_are_rejected() {
        for raw in [
            r#"{"quantity": 2000000000}"#,
            r#"{"quantity": "10001"}"#,
            r#"{"amount_paid": 92233720368547758}"#,
            r#"{"amount_paid": "10000000.01"}"#,
            r#"{"amount_paid": 1e300}"#,
        ] {
            assert!(serde_json::from_str::<Line>(raw).is_err(), "payload {raw}");
        }

        let line: Line = serde_json::from_str(r#"{"quantity": 10000, "amount_paid": 10000000}"#)
            .expect("values at the limit");
        assert_eq!(line.quantity, MAX_QUANTITY);
        assert_eq!(line.amount_paid, Some(MAX_MONEY));
    }

    #[test]
    fn urlencoded_blank_values_become_none() {
        let line: Line = serde_qs::from_str("product_id=&quantity=&amount_paid=")
            .expect("blank form fields");

        assert_eq!(line.product_id, None);
        assert_eq!(line.quantity, 1);
        assert_eq!(line.amount_paid, None);
    }

    #[test]
    fn negative_money_is_rejected() {
        let result = serde_json::from_str::<Line>(r#"{"amount_paid": -5}"#);
        assert!(result.is_err());
    }

    #[test]
    fn sanitize_inline_text_collapses_whitespace() {
        assert_eq!(sanitize_inline_text("  Chips \t Large \n"), "Chips Large");
    }
}
