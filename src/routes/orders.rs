use actix_web::{Responder, post, web};
use actix_web_flash_messages::FlashMessage;
use pushkind_common::domain::auth::AuthenticatedUser;
use pushkind_common::routes::redirect;

use crate::forms::orders::OrderPayload;
use crate::repository::DieselRepository;
use crate::routes::{redirect_with_error, today};
use crate::services::ServiceError;
use crate::services::orders::{self, ReconcileOutcome};

#[post("/orders/add")]
pub async fn add_order(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    body: web::Bytes,
) -> impl Responder {
    let result = OrderPayload::from_form_body(&body)
        .map_err(|err| ServiceError::Form(err.to_string()))
        .and_then(|payload| orders::build_order(repo.get_ref(), &user, payload, today()));

    match result {
        Ok(order) => {
            FlashMessage::success(format!(
                "Order #{} for {} saved.",
                order.id, order.customer.name
            ))
            .send();
            redirect("/")
        }
        Err(err) => redirect_with_error(err, "add the order", "/"),
    }
}

#[post("/orders/{order_id}/edit")]
pub async fn edit_order(
    order_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    body: web::Bytes,
) -> impl Responder {
    let order_id = order_id.into_inner();
    let result = OrderPayload::from_form_body(&body)
        .map_err(|err| ServiceError::Form(err.to_string()))
        .and_then(|payload| {
            orders::reconcile_order(repo.get_ref(), &user, order_id, payload, today())
        });

    match result {
        Ok(ReconcileOutcome::Updated(order)) => {
            FlashMessage::success(format!("Order #{} updated.", order.id)).send();
            redirect("/")
        }
        Ok(ReconcileOutcome::Deleted) => {
            FlashMessage::success(format!("Order #{order_id} had no items left and was deleted."))
                .send();
            redirect("/")
        }
        Err(err) => redirect_with_error(err, "update the order", "/"),
    }
}

#[post("/orders/{order_id}/delete")]
pub async fn delete_order(
    order_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let order_id = order_id.into_inner();

    match orders::remove_order(repo.get_ref(), &user, order_id) {
        Ok(()) => {
            FlashMessage::success(format!("Order #{order_id} deleted.")).send();
            redirect("/")
        }
        Err(err) => redirect_with_error(err, "delete the order", "/"),
    }
}
