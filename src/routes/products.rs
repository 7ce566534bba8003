use actix_multipart::form::MultipartForm;
use actix_web::{Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use pushkind_common::domain::auth::AuthenticatedUser;
use pushkind_common::models::config::CommonServerConfig;
use pushkind_common::routes::{base_context, redirect, render_template};
use tera::Tera;

use crate::forms::products::{ProductForm, UploadProductsForm};
use crate::repository::DieselRepository;
use crate::routes::{page_error, redirect_with_error};
use crate::services::{ServiceError, products};

#[get("/products")]
pub async fn show_products(
    params: web::Query<products::ProductsQuery>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<CommonServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    match products::load_products_page(repo.get_ref(), &user, params.0) {
        Ok(data) => {
            let mut context = base_context(
                &flash_messages,
                &user,
                "products",
                &server_config.auth_service_url,
            );
            let has_active_filters = data.show_archived
                || data
                    .search
                    .as_ref()
                    .map(|value| !value.trim().is_empty())
                    .unwrap_or(false);
            context.insert("products", &data.products);
            context.insert("search", &data.search);
            context.insert("show_archived", &data.show_archived);
            context.insert("has_active_filters", &has_active_filters);
            render_template(&tera, "products/index.html", &context)
        }
        Err(err) => page_error(err, "products", "/products"),
    }
}

#[post("/products/add")]
pub async fn add_product(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    body: web::Bytes,
) -> impl Responder {
    let result = ProductForm::from_form_body(&body)
        .map_err(|err| ServiceError::Form(err.to_string()))
        .and_then(|form| products::create_product(repo.get_ref(), &user, form));

    match result {
        Ok(product) => {
            FlashMessage::success(format!("Product «{}» added.", product.name)).send();
            redirect("/products")
        }
        Err(err) => redirect_with_error(err, "add the product", "/products"),
    }
}

#[post("/products/{product_id}/edit")]
pub async fn edit_product(
    product_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    body: web::Bytes,
) -> impl Responder {
    let product_id = product_id.into_inner();
    let result = ProductForm::from_form_body(&body)
        .map_err(|err| ServiceError::Form(err.to_string()))
        .and_then(|form| products::update_product(repo.get_ref(), &user, product_id, form));

    match result {
        Ok(product) => {
            FlashMessage::success(format!("Product «{}» updated.", product.name)).send();
            redirect("/products")
        }
        Err(err) => redirect_with_error(err, "update the product", "/products"),
    }
}

#[post("/products/{product_id}/archive")]
pub async fn archive_product(
    product_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match products::set_archived(repo.get_ref(), &user, product_id.into_inner(), true) {
        Ok(product) => {
            FlashMessage::success(format!("Product «{}» archived.", product.name)).send();
            redirect("/products")
        }
        Err(err) => redirect_with_error(err, "archive the product", "/products"),
    }
}

#[post("/products/{product_id}/restore")]
pub async fn restore_product(
    product_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match products::set_archived(repo.get_ref(), &user, product_id.into_inner(), false) {
        Ok(product) => {
            FlashMessage::success(format!("Product «{}» restored.", product.name)).send();
            redirect("/products?show_archived=true")
        }
        Err(err) => redirect_with_error(err, "restore the product", "/products"),
    }
}

#[post("/products/upload")]
pub async fn upload_products(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    MultipartForm(form): MultipartForm<UploadProductsForm>,
) -> impl Responder {
    match products::import_products(repo.get_ref(), &user, form) {
        Ok(created) => {
            FlashMessage::success(format!("Imported {created} product(s).")).send();
            redirect("/products")
        }
        Err(err) => redirect_with_error(err, "import products", "/products"),
    }
}
