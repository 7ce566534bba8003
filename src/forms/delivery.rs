use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::hall::Hall;
use crate::domain::order::DeliveryStatus;
use crate::forms::{optional_date, optional_text};

#[derive(Debug, Error)]
pub enum DeliveryFormError {
    #[error("unknown delivery status `{0}`")]
    UnknownStatus(String),
    #[error("unknown hall `{0}`")]
    UnknownHall(String),
    #[error("select at least one item")]
    NoItems,
    #[error("failed to parse form: {0}")]
    Encoding(#[from] serde::de::value::Error),
}

/// New delivery status for an item or a whole order.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

impl StatusForm {
    pub fn status(&self) -> Result<DeliveryStatus, DeliveryFormError> {
        self.status
            .parse()
            .map_err(|_| DeliveryFormError::UnknownStatus(self.status.trim().to_string()))
    }
}

/// Checked items submitted by the dashboard's "mark delivered" button.
///
/// Browsers repeat the field name for every checked box
/// (`item_ids=3&item_ids=7`), so the body is decoded with
/// `serde_html_form`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkDeliverForm {
    #[serde(default)]
    pub item_ids: Vec<i32>,
}

impl BulkDeliverForm {
    pub fn from_form_body(body: &[u8]) -> Result<Self, DeliveryFormError> {
        Ok(serde_html_form::from_bytes(body)?)
    }

    pub fn into_item_ids(self) -> Result<Vec<i32>, DeliveryFormError> {
        let mut ids = self.item_ids;
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Err(DeliveryFormError::NoItems);
        }
        Ok(ids)
    }
}

/// Filters of the delivery dashboard.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryQuery {
    #[serde(default, deserialize_with = "optional_date")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "optional_text")]
    pub hall: Option<String>,
}

impl DeliveryQuery {
    pub fn hall(&self) -> Result<Option<Hall>, DeliveryFormError> {
        self.hall
            .as_deref()
            .map(|value| {
                value
                    .parse::<Hall>()
                    .map_err(|_| DeliveryFormError::UnknownHall(value.to_string()))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_item_ids_are_collected() {
        let form = BulkDeliverForm::from_form_body(b"item_ids=7&item_ids=3&item_ids=7")
            .expect("valid body");

        assert_eq!(form.into_item_ids().expect("ids"), vec![3, 7]);
    }

    #[test]
    fn empty_selection_is_rejected() {
        let form = BulkDeliverForm::from_form_body(b"").expect("valid body");

        assert!(matches!(form.into_item_ids(), Err(DeliveryFormError::NoItems)));
    }

    #[test]
    fn status_form_parses_known_values() {
        let form = StatusForm {
            status: " Cancelled ".to_string(),
        };
        assert_eq!(form.status().expect("status"), DeliveryStatus::Cancelled);

        let form = StatusForm {
            status: "lost".to_string(),
        };
        assert!(matches!(form.status(), Err(DeliveryFormError::UnknownStatus(_))));
    }

    #[test]
    fn dashboard_query_parses_hall() {
        let query = DeliveryQuery {
            date: None,
            hall: Some("rk".to_string()),
        };

        assert_eq!(query.hall().expect("hall"), Some(Hall::Rk));
    }
}
