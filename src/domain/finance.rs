use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use pushkind_common::pagination::Pagination;
use serde::{Deserialize, Serialize};

use crate::domain::ParseEnumError;

/// Accounting category of an expense.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseType {
    /// Stock bought for resale.
    Purchase,
    /// Anything else: transport, packaging, printing.
    #[default]
    General,
}

impl ExpenseType {
    pub fn as_str(self) -> &'static str {
        match self {
            ExpenseType::Purchase => "purchase",
            ExpenseType::General => "general",
        }
    }
}

impl fmt::Display for ExpenseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpenseType {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "purchase" => Ok(ExpenseType::Purchase),
            "general" => Ok(ExpenseType::General),
            _ => Err(ParseEnumError::new("expense type", value)),
        }
    }
}

/// Accounting record kept by the treasurer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FinanceExpense {
    pub id: i32,
    pub hub_id: i32,
    pub expense_type: ExpenseType,
    pub description: String,
    /// Amount in paise.
    pub value: i64,
    pub product_id: Option<i32>,
    pub variant_id: Option<i32>,
    pub quantity: Option<i32>,
    pub created_by: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Optional link from an expense to the stock it paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpenseLink {
    pub product_id: Option<i32>,
    pub variant_id: Option<i32>,
    pub quantity: Option<i32>,
}

/// Payload required to insert an expense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFinanceExpense {
    pub hub_id: i32,
    pub expense_type: ExpenseType,
    pub description: String,
    pub value: i64,
    pub link: ExpenseLink,
    pub created_by: i32,
}

/// Replacement values for an existing expense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateFinanceExpense {
    pub expense_type: ExpenseType,
    pub description: String,
    pub value: i64,
    pub link: ExpenseLink,
    pub updated_at: NaiveDateTime,
}

/// Hub-wide money overview shown to the treasurer. All amounts in paise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FinanceSummary {
    /// Sum of order totals excluding cancelled orders.
    pub sales: i64,
    /// Payments collected on those orders.
    pub collected: i64,
    /// Discounts granted on those orders.
    pub discounts: i64,
    pub purchase_expenses: i64,
    pub general_expenses: i64,
    /// Cost of every received-stock record.
    pub inventory_cost: i64,
}

impl FinanceSummary {
    /// Money still owed by customers.
    pub fn outstanding(&self) -> i64 {
        self.sales - self.discounts - self.collected
    }

    pub fn total_expenses(&self) -> i64 {
        self.purchase_expenses + self.general_expenses
    }

    /// Cash position: collected payments minus recorded expenses.
    pub fn balance(&self) -> i64 {
        self.collected - self.total_expenses()
    }
}

/// Query definition used to list expenses for a hub.
#[derive(Debug, Clone)]
pub struct FinanceExpenseListQuery {
    pub hub_id: i32,
    pub expense_type: Option<ExpenseType>,
    pub pagination: Option<Pagination>,
}

impl FinanceExpenseListQuery {
    pub fn new(hub_id: i32) -> Self {
        Self {
            hub_id,
            expense_type: None,
            pagination: None,
        }
    }

    pub fn expense_type(mut self, expense_type: ExpenseType) -> Self {
        self.expense_type = Some(expense_type);
        self
    }

    /// Apply pagination to the query with the given page number and page size.
    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}
