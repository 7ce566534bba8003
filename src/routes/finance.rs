use actix_web::{Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use pushkind_common::domain::auth::AuthenticatedUser;
use pushkind_common::models::config::CommonServerConfig;
use pushkind_common::routes::{base_context, redirect, render_template};
use tera::Tera;

use crate::forms::finance::ExpenseForm;
use crate::repository::DieselRepository;
use crate::routes::{page_error, redirect_with_error};
use crate::services::finance::{self, FinanceQuery};
use crate::services::products;

#[get("/finance")]
pub async fn show_finance(
    params: web::Query<FinanceQuery>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<CommonServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let data = match finance::load_finance_page(repo.get_ref(), &user, params.0) {
        Ok(data) => data,
        Err(err) => return page_error(err, "finance", "/finance"),
    };

    let catalog = match products::load_catalog(repo.get_ref(), &user) {
        Ok(catalog) => catalog,
        Err(err) => return page_error(err, "catalog", "/finance"),
    };

    let mut context = base_context(
        &flash_messages,
        &user,
        "finance",
        &server_config.auth_service_url,
    );
    context.insert("expenses", &data.expenses);
    context.insert("summary", &data.summary);
    context.insert(
        "expense_type",
        &data.expense_type.map(|expense_type| expense_type.as_str()),
    );
    context.insert("catalog", &catalog);
    render_template(&tera, "finance/index.html", &context)
}

#[post("/finance/add")]
pub async fn add_expense(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Form(form): web::Form<ExpenseForm>,
) -> impl Responder {
    match finance::create_expense(repo.get_ref(), &user, form) {
        Ok(expense) => {
            FlashMessage::success(format!("Expense «{}» recorded.", expense.description)).send();
            redirect("/finance")
        }
        Err(err) => redirect_with_error(err, "record the expense", "/finance"),
    }
}

#[post("/finance/{expense_id}/edit")]
pub async fn edit_expense(
    expense_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Form(form): web::Form<ExpenseForm>,
) -> impl Responder {
    match finance::update_expense(repo.get_ref(), &user, expense_id.into_inner(), form) {
        Ok(expense) => {
            FlashMessage::success(format!("Expense «{}» updated.", expense.description)).send();
            redirect("/finance")
        }
        Err(err) => redirect_with_error(err, "update the expense", "/finance"),
    }
}

#[post("/finance/{expense_id}/delete")]
pub async fn delete_expense(
    expense_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match finance::delete_expense(repo.get_ref(), &user, expense_id.into_inner()) {
        Ok(()) => {
            FlashMessage::success("Expense deleted.").send();
            redirect("/finance")
        }
        Err(err) => redirect_with_error(err, "delete the expense", "/finance"),
    }
}
