use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use crate::domain::inventory::{
    Inventory as DomainInventory, NewInventory as DomainNewInventory,
    RemainingInventory as DomainRemainingInventory, UpdateInventory as DomainUpdateInventory,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::inventory)]
pub struct Inventory {
    pub id: i32,
    pub hub_id: i32,
    pub product_id: i32,
    pub variant_id: Option<i32>,
    pub quantity_added: i32,
    pub cost_per_unit: i64,
    pub dealer: Option<String>,
    pub date_received: NaiveDate,
    pub created_by: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::remaining_inventory)]
pub struct RemainingInventory {
    pub id: i32,
    pub hub_id: i32,
    pub product_id: i32,
    pub variant_id: Option<i32>,
    pub quantity: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::inventory)]
pub struct NewInventory<'a> {
    pub hub_id: i32,
    pub product_id: i32,
    pub variant_id: Option<i32>,
    pub quantity_added: i32,
    pub cost_per_unit: i64,
    pub dealer: Option<&'a str>,
    pub date_received: NaiveDate,
    pub created_by: i32,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::inventory, treat_none_as_null = true)]
pub struct UpdateInventory<'a> {
    pub product_id: i32,
    pub variant_id: Option<i32>,
    pub quantity_added: i32,
    pub cost_per_unit: i64,
    pub dealer: Option<&'a str>,
    pub date_received: NaiveDate,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::remaining_inventory)]
pub struct NewRemainingInventory {
    pub hub_id: i32,
    pub product_id: i32,
    pub variant_id: Option<i32>,
    pub quantity: i32,
}

impl From<Inventory> for DomainInventory {
    fn from(value: Inventory) -> Self {
        Self {
            id: value.id,
            hub_id: value.hub_id,
            product_id: value.product_id,
            variant_id: value.variant_id,
            quantity_added: value.quantity_added,
            cost_per_unit: value.cost_per_unit,
            dealer: value.dealer,
            date_received: value.date_received,
            created_by: value.created_by,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<RemainingInventory> for DomainRemainingInventory {
    fn from(value: RemainingInventory) -> Self {
        Self {
            id: value.id,
            hub_id: value.hub_id,
            product_id: value.product_id,
            variant_id: value.variant_id,
            quantity: value.quantity,
            updated_at: value.updated_at,
        }
    }
}

impl<'a> From<&'a DomainNewInventory> for NewInventory<'a> {
    fn from(value: &'a DomainNewInventory) -> Self {
        Self {
            hub_id: value.hub_id,
            product_id: value.key.product_id,
            variant_id: value.key.variant_id,
            quantity_added: value.quantity_added,
            cost_per_unit: value.cost_per_unit,
            dealer: value.dealer.as_deref(),
            date_received: value.date_received,
            created_by: value.created_by,
        }
    }
}

impl<'a> From<&'a DomainUpdateInventory> for UpdateInventory<'a> {
    fn from(value: &'a DomainUpdateInventory) -> Self {
        Self {
            product_id: value.key.product_id,
            variant_id: value.key.variant_id,
            quantity_added: value.quantity_added,
            cost_per_unit: value.cost_per_unit,
            dealer: value.dealer.as_deref(),
            date_received: value.date_received,
            updated_at: value.updated_at,
        }
    }
}
