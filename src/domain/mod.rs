use thiserror::Error;

pub mod finance;
pub mod hall;
pub mod inventory;
pub mod ledger;
pub mod order;
pub mod pricing;
pub mod product;
pub mod user;

/// Error returned when a stored or submitted enum value is not recognised.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} `{value}`")]
pub struct ParseEnumError {
    /// Name of the enumeration being parsed.
    pub kind: &'static str,
    /// Raw value that failed to parse.
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Format an amount stored in paise as a rupee string, e.g. `3500` -> `35.00`.
pub fn format_paise(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
