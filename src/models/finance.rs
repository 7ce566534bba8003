use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::finance::{
    FinanceExpense as DomainFinanceExpense, NewFinanceExpense as DomainNewFinanceExpense,
    UpdateFinanceExpense as DomainUpdateFinanceExpense,
};
use crate::models::parse_column;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::finance_expenses)]
pub struct FinanceExpense {
    pub id: i32,
    pub hub_id: i32,
    pub expense_type: String,
    pub description: String,
    pub value: i64,
    pub product_id: Option<i32>,
    pub variant_id: Option<i32>,
    pub quantity: Option<i32>,
    pub created_by: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::finance_expenses)]
pub struct NewFinanceExpense<'a> {
    pub hub_id: i32,
    pub expense_type: &'a str,
    pub description: &'a str,
    pub value: i64,
    pub product_id: Option<i32>,
    pub variant_id: Option<i32>,
    pub quantity: Option<i32>,
    pub created_by: i32,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::finance_expenses, treat_none_as_null = true)]
pub struct UpdateFinanceExpense<'a> {
    pub expense_type: &'a str,
    pub description: &'a str,
    pub value: i64,
    pub product_id: Option<i32>,
    pub variant_id: Option<i32>,
    pub quantity: Option<i32>,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<FinanceExpense> for DomainFinanceExpense {
    type Error = diesel::result::Error;

    fn try_from(value: FinanceExpense) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id,
            hub_id: value.hub_id,
            expense_type: parse_column(&value.expense_type)?,
            description: value.description,
            value: value.value,
            product_id: value.product_id,
            variant_id: value.variant_id,
            quantity: value.quantity,
            created_by: value.created_by,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

impl<'a> From<&'a DomainNewFinanceExpense> for NewFinanceExpense<'a> {
    fn from(value: &'a DomainNewFinanceExpense) -> Self {
        Self {
            hub_id: value.hub_id,
            expense_type: value.expense_type.as_str(),
            description: value.description.as_str(),
            value: value.value,
            product_id: value.link.product_id,
            variant_id: value.link.variant_id,
            quantity: value.link.quantity,
            created_by: value.created_by,
        }
    }
}

impl<'a> From<&'a DomainUpdateFinanceExpense> for UpdateFinanceExpense<'a> {
    fn from(value: &'a DomainUpdateFinanceExpense) -> Self {
        Self {
            expense_type: value.expense_type.as_str(),
            description: value.description.as_str(),
            value: value.value,
            product_id: value.link.product_id,
            variant_id: value.link.variant_id,
            quantity: value.link.quantity,
            updated_at: value.updated_at,
        }
    }
}
