use actix_web::{Responder, get, web};
use actix_web_flash_messages::IncomingFlashMessages;
use pushkind_common::domain::auth::AuthenticatedUser;
use pushkind_common::models::config::CommonServerConfig;
use pushkind_common::routes::{base_context, render_template};
use tera::Tera;

use crate::domain::hall::hall_options;
use crate::repository::DieselRepository;
use crate::routes::{page_error, today};
use crate::services::orders::{self, IndexQuery};
use crate::services::products;

#[get("/")]
pub async fn show_index(
    params: web::Query<IndexQuery>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<CommonServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let data = match orders::load_orders_page(repo.get_ref(), &user, params.0) {
        Ok(data) => data,
        Err(err) => return page_error(err, "orders", "/"),
    };

    let catalog = match products::load_catalog(repo.get_ref(), &user) {
        Ok(catalog) => catalog,
        Err(err) => return page_error(err, "catalog", "/"),
    };

    let mut context = base_context(
        &flash_messages,
        &user,
        "index",
        &server_config.auth_service_url,
    );
    context.insert("orders", &data.orders);
    context.insert("search", &data.search);
    context.insert("hall", &data.hall.map(|hall| hall.as_str()));
    context.insert("status", &data.status.map(|status| status.as_str()));
    context.insert("halls", &hall_options());
    context.insert("catalog", &catalog);
    context.insert("today", &today());
    render_template(&tera, "main/index.html", &context)
}
