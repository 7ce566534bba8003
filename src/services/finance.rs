use pushkind_common::domain::auth::AuthenticatedUser;
use pushkind_common::pagination::{DEFAULT_ITEMS_PER_PAGE, Paginated};
use serde::{Deserialize, Serialize};

use crate::TREASURER_ROLE;
use crate::domain::finance::{
    ExpenseLink, ExpenseType, FinanceExpense, FinanceExpenseListQuery, FinanceSummary,
};
use crate::domain::format_paise;
use crate::domain::inventory::StockKey;
use crate::forms::finance::ExpenseForm;
use crate::repository::{FinanceReader, FinanceWriter, ProductReader, UserReader, UserWriter};
use crate::services::stock::catalog_stock_key;
use crate::services::{ServiceError, ServiceResult, ensure_any_role, ensure_user};

#[derive(Debug, Default, Deserialize)]
pub struct FinanceQuery {
    pub expense_type: Option<String>,
    pub page: Option<usize>,
}

/// Data required to render the treasurer's page.
pub struct FinancePageData {
    pub expenses: Paginated<ExpenseView>,
    pub summary: SummaryView,
    pub expense_type: Option<ExpenseType>,
}

#[derive(Debug, Serialize)]
pub struct ExpenseView {
    #[serde(flatten)]
    pub expense: FinanceExpense,
    pub value_display: String,
}

/// Summary figures formatted as rupees.
#[derive(Debug, Serialize)]
pub struct SummaryView {
    pub sales: String,
    pub collected: String,
    pub discounts: String,
    pub outstanding: String,
    pub purchase_expenses: String,
    pub general_expenses: String,
    pub total_expenses: String,
    pub balance: String,
    pub inventory_cost: String,
}

impl From<FinanceSummary> for SummaryView {
    fn from(summary: FinanceSummary) -> Self {
        Self {
            sales: format_paise(summary.sales),
            collected: format_paise(summary.collected),
            discounts: format_paise(summary.discounts),
            outstanding: format_paise(summary.outstanding()),
            purchase_expenses: format_paise(summary.purchase_expenses),
            general_expenses: format_paise(summary.general_expenses),
            total_expenses: format_paise(summary.total_expenses()),
            balance: format_paise(summary.balance()),
            inventory_cost: format_paise(summary.inventory_cost),
        }
    }
}

pub fn load_finance_page<R>(
    repo: &R,
    user: &AuthenticatedUser,
    query: FinanceQuery,
) -> ServiceResult<FinancePageData>
where
    R: FinanceReader + ?Sized,
{
    ensure_any_role(user, &[TREASURER_ROLE])?;

    let expense_type = query
        .expense_type
        .filter(|value| !value.trim().is_empty())
        .map(|value| value.parse::<ExpenseType>())
        .transpose()
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    let page = query.page.unwrap_or(1);
    let mut list_query =
        FinanceExpenseListQuery::new(user.hub_id).paginate(page, DEFAULT_ITEMS_PER_PAGE);
    if let Some(expense_type) = expense_type {
        list_query = list_query.expense_type(expense_type);
    }

    let (total, expenses) = repo.list_expenses(list_query).map_err(ServiceError::from)?;
    let summary = repo
        .finance_summary(user.hub_id)
        .map_err(ServiceError::from)?;

    let views = expenses
        .into_iter()
        .map(|expense| ExpenseView {
            value_display: format_paise(expense.value),
            expense,
        })
        .collect();

    let total_pages = total.div_ceil(DEFAULT_ITEMS_PER_PAGE);

    Ok(FinancePageData {
        expenses: Paginated::new(views, page, total_pages),
        summary: summary.into(),
        expense_type,
    })
}

pub fn create_expense<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: ExpenseForm,
) -> ServiceResult<FinanceExpense>
where
    R: FinanceWriter + ProductReader + UserReader + UserWriter + ?Sized,
{
    ensure_any_role(user, &[TREASURER_ROLE])?;

    let creator = ensure_user(repo, user)?;

    let new_expense = form
        .into_new_expense(user.hub_id, creator.id)
        .map_err(|err| ServiceError::Form(err.to_string()))?;
    check_link(repo, user.hub_id, &new_expense.link)?;

    repo.create_expense(&new_expense)
        .map_err(ServiceError::from)
}

pub fn update_expense<R>(
    repo: &R,
    user: &AuthenticatedUser,
    expense_id: i32,
    form: ExpenseForm,
) -> ServiceResult<FinanceExpense>
where
    R: FinanceWriter + ProductReader + ?Sized,
{
    ensure_any_role(user, &[TREASURER_ROLE])?;

    let updates = form
        .into_update_expense(chrono::Local::now().naive_utc())
        .map_err(|err| ServiceError::Form(err.to_string()))?;
    check_link(repo, user.hub_id, &updates.link)?;

    repo.update_expense(expense_id, user.hub_id, &updates)
        .map_err(ServiceError::from)
}

pub fn delete_expense<R>(repo: &R, user: &AuthenticatedUser, expense_id: i32) -> ServiceResult<()>
where
    R: FinanceWriter + ?Sized,
{
    ensure_any_role(user, &[TREASURER_ROLE])?;

    repo.delete_expense(expense_id, user.hub_id)
        .map_err(ServiceError::from)
}

/// A linked product must exist in the hub and a linked variant must belong
/// to it.
fn check_link<R>(repo: &R, hub_id: i32, link: &ExpenseLink) -> ServiceResult<()>
where
    R: ProductReader + ?Sized,
{
    match link.product_id {
        Some(product_id) => {
            catalog_stock_key(repo, hub_id, StockKey::new(product_id, link.variant_id))?;
            Ok(())
        }
        None => Ok(()),
    }
}
