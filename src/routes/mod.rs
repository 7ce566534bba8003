use std::collections::HashMap;

use actix_web::HttpResponse;
use actix_web_flash_messages::FlashMessage;
use chrono::NaiveDate;
use pushkind_common::routes::redirect;

use crate::domain::format_paise;
use crate::services::ServiceError;

pub mod api;
pub mod delivery;
pub mod finance;
pub mod inventory;
pub mod main;
pub mod orders;
pub mod products;

/// Local calendar date used for delivery defaults and the rollover.
pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Sends the user back to `back` with a flash message describing `err`.
///
/// Missing roles go to the "not assigned" page instead.
pub(crate) fn redirect_with_error(err: ServiceError, action: &str, back: &str) -> HttpResponse {
    match err {
        ServiceError::Unauthorized => {
            FlashMessage::error("Insufficient permissions.").send();
            redirect("/na")
        }
        ServiceError::Forbidden => {
            FlashMessage::error("Only the staff member who created this record can change it.")
                .send();
            redirect(back)
        }
        ServiceError::NotFound => {
            FlashMessage::error("Record not found.").send();
            redirect(back)
        }
        ServiceError::Form(message) | ServiceError::Conflict(message) => {
            FlashMessage::error(message).send();
            redirect(back)
        }
        ServiceError::Internal(message) => {
            log::error!("Failed to {action}: {message}");
            FlashMessage::error(format!("Failed to {action}.")).send();
            redirect(back)
        }
    }
}

/// Error response for a page that could not be loaded.
pub(crate) fn page_error(err: ServiceError, page: &str, path: &str) -> HttpResponse {
    match err {
        ServiceError::Unauthorized => {
            FlashMessage::error("Insufficient permissions.").send();
            redirect("/na")
        }
        ServiceError::Form(message) => {
            FlashMessage::error(message).send();
            redirect(path)
        }
        err => {
            log::error!("Failed to load {page}: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Tera filter rendering an amount in paise as rupees: `{{ 3500 | paise }}`
/// renders `35.00`.
pub fn paise_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    match value.as_i64() {
        Some(amount) => Ok(tera::Value::String(format_paise(amount))),
        None if value.is_null() => Ok(tera::Value::String(String::new())),
        None => Err(tera::Error::msg(format!(
            "filter `paise` expects an integer, got {value}"
        ))),
    }
}
