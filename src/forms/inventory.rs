use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::inventory::{NewInventory, StockKey, UpdateInventory};
use crate::domain::ledger::StockMovement;
use crate::forms::{
    MAX_MONEY, MAX_QUANTITY, optional_date, optional_id, optional_money, optional_text,
};

const DEALER_MAX_LEN: u64 = 128;

pub type InventoryFormResult<T> = Result<T, InventoryFormError>;

#[derive(Debug, Error)]
pub enum InventoryFormError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("choose a product")]
    MissingProduct,
    #[error("quantity must be between 1 and {}", MAX_QUANTITY)]
    InvalidQuantity,
    #[error("cost per unit is required")]
    MissingCost,
    #[error("unknown stock movement `{0}`")]
    UnknownMovement(String),
}

/// Payload for recording or correcting a received-stock event.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InventoryForm {
    #[serde(default, deserialize_with = "optional_id")]
    pub product_id: Option<i32>,
    #[serde(default, deserialize_with = "optional_id")]
    pub variant_id: Option<i32>,
    #[serde(default, deserialize_with = "optional_id")]
    pub quantity_added: Option<i32>,
    #[serde(default, deserialize_with = "optional_money")]
    #[validate(range(min = 0, max = MAX_MONEY))]
    pub cost_per_unit: Option<i64>,
    #[serde(default, deserialize_with = "optional_text")]
    #[validate(length(max = DEALER_MAX_LEN))]
    pub dealer: Option<String>,
    #[serde(default, deserialize_with = "optional_date")]
    pub date_received: Option<NaiveDate>,
}

/// Validated receipt values shared by create and update.
struct Receipt {
    key: StockKey,
    quantity_added: i32,
    cost_per_unit: i64,
    dealer: Option<String>,
    date_received: NaiveDate,
}

impl InventoryForm {
    fn into_receipt(self, today: NaiveDate) -> InventoryFormResult<Receipt> {
        self.validate()?;

        let product_id = self.product_id.ok_or(InventoryFormError::MissingProduct)?;
        let quantity_added = self
            .quantity_added
            .filter(|quantity| (1..=MAX_QUANTITY).contains(quantity))
            .ok_or(InventoryFormError::InvalidQuantity)?;
        let cost_per_unit = self.cost_per_unit.ok_or(InventoryFormError::MissingCost)?;

        Ok(Receipt {
            key: StockKey::new(product_id, self.variant_id),
            quantity_added,
            cost_per_unit,
            dealer: self.dealer,
            date_received: self.date_received.unwrap_or(today),
        })
    }

    pub fn into_new_inventory(
        self,
        hub_id: i32,
        created_by: i32,
        today: NaiveDate,
    ) -> InventoryFormResult<NewInventory> {
        let receipt = self.into_receipt(today)?;
        Ok(NewInventory {
            hub_id,
            key: receipt.key,
            quantity_added: receipt.quantity_added,
            cost_per_unit: receipt.cost_per_unit,
            dealer: receipt.dealer,
            date_received: receipt.date_received,
            created_by,
        })
    }

    pub fn into_update_inventory(
        self,
        today: NaiveDate,
        updated_at: NaiveDateTime,
    ) -> InventoryFormResult<UpdateInventory> {
        let receipt = self.into_receipt(today)?;
        Ok(UpdateInventory {
            key: receipt.key,
            quantity_added: receipt.quantity_added,
            cost_per_unit: receipt.cost_per_unit,
            dealer: receipt.dealer,
            date_received: receipt.date_received,
            updated_at,
        })
    }
}

/// Manual correction of a remaining-stock counter.
#[derive(Debug, Clone, Deserialize)]
pub struct StockMovementForm {
    #[serde(default, deserialize_with = "optional_id")]
    pub product_id: Option<i32>,
    #[serde(default, deserialize_with = "optional_id")]
    pub variant_id: Option<i32>,
    #[serde(default, deserialize_with = "optional_id")]
    pub quantity: Option<i32>,
    pub movement: String,
}

impl StockMovementForm {
    pub fn into_movement(self) -> InventoryFormResult<(StockKey, StockMovement)> {
        let product_id = self.product_id.ok_or(InventoryFormError::MissingProduct)?;
        let quantity = self
            .quantity
            .filter(|quantity| (1..=MAX_QUANTITY).contains(quantity))
            .ok_or(InventoryFormError::InvalidQuantity)?;

        let movement = match self.movement.trim().to_ascii_lowercase().as_str() {
            "receive" => StockMovement::Receive(quantity),
            "consume" => StockMovement::Consume(quantity),
            "restore" => StockMovement::Restore(quantity),
            _ => {
                return Err(InventoryFormError::UnknownMovement(
                    self.movement.trim().to_string(),
                ));
            }
        };

        Ok((StockKey::new(product_id, self.variant_id), movement))
    }
}
