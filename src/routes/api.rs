//! JSON API mounted under `/api/v1`.
//!
//! Error bodies are `{"error": ..., "details": ...}` with `details` present
//! only when there is something the caller can act on.

use actix_web::error::InternalError;
use actix_web::{HttpResponse, Responder, delete, get, patch, post, put, web};
use pushkind_common::domain::auth::AuthenticatedUser;
use serde::Serialize;
use serde_json::json;

use crate::forms::delivery::StatusForm;
use crate::forms::inventory::InventoryForm;
use crate::forms::orders::OrderPayload;
use crate::repository::DieselRepository;
use crate::routes::today;
use crate::services::orders::{IndexQuery, ReconcileOutcome};
use crate::services::{ServiceError, delivery, inventory, orders, stock};

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

fn error_body(error: &str, details: Option<String>) -> ErrorBody {
    ErrorBody {
        error: error.to_string(),
        details,
    }
}

fn error_response(err: ServiceError, action: &str) -> HttpResponse {
    match err {
        ServiceError::Form(details) => {
            HttpResponse::BadRequest().json(error_body("validation failed", Some(details)))
        }
        ServiceError::Conflict(details) => {
            HttpResponse::BadRequest().json(error_body("conflict", Some(details)))
        }
        ServiceError::Unauthorized => {
            HttpResponse::Forbidden().json(error_body("insufficient permissions", None))
        }
        ServiceError::Forbidden => HttpResponse::Forbidden().json(error_body(
            "only the creator of this order can change it",
            None,
        )),
        ServiceError::NotFound => HttpResponse::NotFound().json(error_body("not found", None)),
        ServiceError::Internal(message) => {
            log::error!("Failed to {action}: {message}");
            HttpResponse::InternalServerError().json(error_body("internal server error", None))
        }
    }
}

fn deleted() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": true, "deleted": true }))
}

/// Malformed JSON bodies get the same error shape as validation failures.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response =
            HttpResponse::BadRequest().json(error_body("invalid request body", Some(err.to_string())));
        InternalError::from_response(err, response).into()
    })
}

#[get("/orders")]
pub async fn api_list_orders(
    params: web::Query<IndexQuery>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match orders::load_orders_page(repo.get_ref(), &user, params.0) {
        Ok(data) => HttpResponse::Ok().json(data.orders),
        Err(err) => error_response(err, "list orders"),
    }
}

#[get("/orders/{order_id}")]
pub async fn api_get_order(
    order_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match orders::get_order(repo.get_ref(), &user, order_id.into_inner()) {
        Ok(order) => HttpResponse::Ok().json(order),
        Err(err) => error_response(err, "load the order"),
    }
}

#[post("/orders")]
pub async fn api_create_order(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(payload): web::Json<OrderPayload>,
) -> impl Responder {
    match orders::build_order(repo.get_ref(), &user, payload, today()) {
        Ok(order) => HttpResponse::Created().json(order),
        Err(err) => error_response(err, "create an order"),
    }
}

#[put("/orders/{order_id}")]
pub async fn api_update_order(
    order_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(payload): web::Json<OrderPayload>,
) -> impl Responder {
    match orders::reconcile_order(repo.get_ref(), &user, order_id.into_inner(), payload, today()) {
        Ok(ReconcileOutcome::Updated(order)) => HttpResponse::Ok().json(order),
        Ok(ReconcileOutcome::Deleted) => deleted(),
        Err(err) => error_response(err, "update an order"),
    }
}

#[delete("/orders/{order_id}")]
pub async fn api_delete_order(
    order_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match orders::remove_order(repo.get_ref(), &user, order_id.into_inner()) {
        Ok(()) => deleted(),
        Err(err) => error_response(err, "delete an order"),
    }
}

#[patch("/order-items/{item_id}/status")]
pub async fn api_item_status(
    item_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<StatusForm>,
) -> impl Responder {
    let result = form
        .status()
        .map_err(|err| ServiceError::Form(err.to_string()))
        .and_then(|status| {
            delivery::set_item_status(repo.get_ref(), &user, item_id.into_inner(), status)
        });

    match result {
        Ok(order) => HttpResponse::Ok().json(order),
        Err(err) => error_response(err, "change an item status"),
    }
}

#[post("/inventory")]
pub async fn api_create_inventory(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<InventoryForm>,
) -> impl Responder {
    match inventory::create_inventory(repo.get_ref(), &user, form, today()) {
        Ok(record) => HttpResponse::Created().json(record),
        Err(err) => error_response(err, "record received stock"),
    }
}

#[put("/inventory/{inventory_id}")]
pub async fn api_update_inventory(
    inventory_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<InventoryForm>,
) -> impl Responder {
    match inventory::update_inventory(repo.get_ref(), &user, inventory_id.into_inner(), form, today())
    {
        Ok(record) => HttpResponse::Ok().json(record),
        Err(err) => error_response(err, "update received stock"),
    }
}

#[delete("/inventory/{inventory_id}")]
pub async fn api_delete_inventory(
    inventory_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match inventory::delete_inventory(repo.get_ref(), &user, inventory_id.into_inner()) {
        Ok(()) => HttpResponse::Ok().json(json!({ "success": true })),
        Err(err) => error_response(err, "delete received stock"),
    }
}

#[get("/stock")]
pub async fn api_stock(user: AuthenticatedUser, repo: web::Data<DieselRepository>) -> impl Responder {
    match stock::load_stock(repo.get_ref(), &user) {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(err) => error_response(err, "load remaining stock"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn service_errors_map_to_status_codes() {
        let cases = [
            (ServiceError::Form("bad".to_string()), StatusCode::BAD_REQUEST),
            (ServiceError::Conflict("used".to_string()), StatusCode::BAD_REQUEST),
            (ServiceError::Unauthorized, StatusCode::FORBIDDEN),
            (ServiceError::Forbidden, StatusCode::FORBIDDEN),
            (ServiceError::NotFound, StatusCode::NOT_FOUND),
            (
                ServiceError::Internal("db down".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(error_response(err, "test").status(), status);
        }
    }

    #[test]
    fn error_body_omits_empty_details() {
        let value = serde_json::to_value(error_body("not found", None)).expect("serialize");
        assert_eq!(value, json!({ "error": "not found" }));

        let value =
            serde_json::to_value(error_body("validation failed", Some("no items".to_string())))
                .expect("serialize");
        assert_eq!(value["details"], "no items");
    }
}
