use chrono::NaiveDateTime;
use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::finance::{ExpenseLink, ExpenseType, NewFinanceExpense, UpdateFinanceExpense};
use crate::forms::{optional_id, optional_money, sanitize_inline_text};

const DESCRIPTION_MAX_LEN: u64 = 256;

pub type ExpenseFormResult<T> = Result<T, ExpenseFormError>;

#[derive(Debug, Error)]
pub enum ExpenseFormError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("unknown expense type `{0}`")]
    UnknownType(String),
    #[error("description cannot be empty")]
    EmptyDescription,
    #[error("amount is required")]
    MissingValue,
    #[error("a variant needs a product")]
    VariantWithoutProduct,
    #[error("quantity must be at least 1")]
    InvalidQuantity,
}

/// Payload of the add and edit expense forms.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ExpenseForm {
    #[serde(default)]
    pub expense_type: String,
    #[validate(length(min = 1, max = DESCRIPTION_MAX_LEN))]
    pub description: String,
    #[serde(default, deserialize_with = "optional_money")]
    pub value: Option<i64>,
    #[serde(default, deserialize_with = "optional_id")]
    pub product_id: Option<i32>,
    #[serde(default, deserialize_with = "optional_id")]
    pub variant_id: Option<i32>,
    #[serde(default, deserialize_with = "optional_id")]
    pub quantity: Option<i32>,
}

impl ExpenseForm {
    fn into_parts(self) -> ExpenseFormResult<(ExpenseType, String, i64, ExpenseLink)> {
        self.validate()?;

        let expense_type = if self.expense_type.trim().is_empty() {
            ExpenseType::default()
        } else {
            self.expense_type
                .parse::<ExpenseType>()
                .map_err(|_| ExpenseFormError::UnknownType(self.expense_type.trim().to_string()))?
        };

        let description = sanitize_inline_text(&self.description);
        if description.is_empty() {
            return Err(ExpenseFormError::EmptyDescription);
        }

        let value = self.value.ok_or(ExpenseFormError::MissingValue)?;

        if self.variant_id.is_some() && self.product_id.is_none() {
            return Err(ExpenseFormError::VariantWithoutProduct);
        }

        if matches!(self.quantity, Some(quantity) if quantity < 1) {
            return Err(ExpenseFormError::InvalidQuantity);
        }

        let link = ExpenseLink {
            product_id: self.product_id,
            variant_id: self.variant_id,
            quantity: self.quantity,
        };

        Ok((expense_type, description, value, link))
    }

    pub fn into_new_expense(
        self,
        hub_id: i32,
        created_by: i32,
    ) -> ExpenseFormResult<NewFinanceExpense> {
        let (expense_type, description, value, link) = self.into_parts()?;
        Ok(NewFinanceExpense {
            hub_id,
            expense_type,
            description,
            value,
            link,
            created_by,
        })
    }

    pub fn into_update_expense(
        self,
        updated_at: NaiveDateTime,
    ) -> ExpenseFormResult<UpdateFinanceExpense> {
        let (expense_type, description, value, link) = self.into_parts()?;
        Ok(UpdateFinanceExpense {
            expense_type,
            description,
            value,
            link,
            updated_at,
        })
    }
}
