use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use crate::domain::order::{
    CustomerDetails, NewOrder as DomainNewOrder, NewOrderItem as DomainNewOrderItem,
    Order as DomainOrder, OrderItem as DomainOrderItem,
};
use crate::models::parse_column;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::orders)]
pub struct Order {
    pub id: i32,
    pub hub_id: i32,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_alt_phone: Option<String>,
    pub customer_roll: Option<String>,
    pub hall: String,
    pub delivery_date: NaiveDate,
    pub total_amount: i64,
    pub total_paid: i64,
    pub total_discount: i64,
    pub delivery_status: String,
    pub created_by: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = crate::schema::order_items)]
#[diesel(belongs_to(Order, foreign_key = order_id))]
pub struct OrderItem {
    pub id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub variant_id: Option<i32>,
    pub name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub total_price: i64,
    pub amount_paid: i64,
    pub discount: i64,
    pub delivery_status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::orders)]
pub struct NewOrder<'a> {
    pub hub_id: i32,
    pub customer_name: &'a str,
    pub customer_phone: &'a str,
    pub customer_alt_phone: Option<&'a str>,
    pub customer_roll: Option<&'a str>,
    pub hall: &'a str,
    pub delivery_date: NaiveDate,
    pub created_by: i32,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::order_items)]
pub struct NewOrderItem<'a> {
    pub order_id: i32,
    pub product_id: i32,
    pub variant_id: Option<i32>,
    pub name: &'a str,
    pub quantity: i32,
    pub unit_price: i64,
    pub total_price: i64,
    pub amount_paid: i64,
    pub discount: i64,
    pub updated_at: NaiveDateTime,
}

/// Re-priced values written over an existing item. The delivery status is
/// left untouched.
#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::order_items, treat_none_as_null = true)]
pub struct RepriceOrderItem<'a> {
    pub product_id: i32,
    pub variant_id: Option<i32>,
    pub name: &'a str,
    pub quantity: i32,
    pub unit_price: i64,
    pub total_price: i64,
    pub amount_paid: i64,
    pub discount: i64,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::orders, treat_none_as_null = true)]
pub struct UpdateCustomer<'a> {
    pub customer_name: &'a str,
    pub customer_phone: &'a str,
    pub customer_alt_phone: Option<&'a str>,
    pub customer_roll: Option<&'a str>,
    pub hall: &'a str,
    pub delivery_date: NaiveDate,
    pub updated_at: NaiveDateTime,
}

/// Derived columns refreshed after any change to an order's items.
#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::orders)]
pub struct OrderAggregates<'a> {
    pub total_amount: i64,
    pub total_paid: i64,
    pub total_discount: i64,
    pub delivery_status: &'a str,
}

impl Order {
    pub fn into_domain(self, items: Vec<OrderItem>) -> Result<DomainOrder, diesel::result::Error> {
        let items = items
            .into_iter()
            .map(OrderItem::into_domain)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DomainOrder {
            id: self.id,
            hub_id: self.hub_id,
            customer: CustomerDetails {
                name: self.customer_name,
                phone: self.customer_phone,
                alt_phone: self.customer_alt_phone,
                roll: self.customer_roll,
            },
            hall: parse_column(&self.hall)?,
            delivery_date: self.delivery_date,
            total_amount: self.total_amount,
            total_paid: self.total_paid,
            total_discount: self.total_discount,
            delivery_status: parse_column(&self.delivery_status)?,
            created_by: self.created_by,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl OrderItem {
    pub fn into_domain(self) -> Result<DomainOrderItem, diesel::result::Error> {
        Ok(DomainOrderItem {
            id: self.id,
            order_id: self.order_id,
            product_id: self.product_id,
            variant_id: self.variant_id,
            name: self.name,
            quantity: self.quantity,
            unit_price: self.unit_price,
            total_price: self.total_price,
            amount_paid: self.amount_paid,
            discount: self.discount,
            delivery_status: parse_column(&self.delivery_status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl<'a> From<&'a DomainNewOrder> for NewOrder<'a> {
    fn from(value: &'a DomainNewOrder) -> Self {
        Self {
            hub_id: value.hub_id,
            customer_name: value.customer.name.as_str(),
            customer_phone: value.customer.phone.as_str(),
            customer_alt_phone: value.customer.alt_phone.as_deref(),
            customer_roll: value.customer.roll.as_deref(),
            hall: value.hall.as_str(),
            delivery_date: value.delivery_date,
            created_by: value.created_by,
            updated_at: value.updated_at,
        }
    }
}

impl<'a> NewOrderItem<'a> {
    pub fn from_domain(
        order_id: i32,
        value: &'a DomainNewOrderItem,
        updated_at: NaiveDateTime,
    ) -> Self {
        Self {
            order_id,
            product_id: value.product_id,
            variant_id: value.variant_id,
            name: value.name.as_str(),
            quantity: value.quantity,
            unit_price: value.unit_price,
            total_price: value.total_price,
            amount_paid: value.amount_paid,
            discount: value.discount,
            updated_at,
        }
    }
}

impl<'a> RepriceOrderItem<'a> {
    pub fn from_domain(value: &'a DomainNewOrderItem, updated_at: NaiveDateTime) -> Self {
        Self {
            product_id: value.product_id,
            variant_id: value.variant_id,
            name: value.name.as_str(),
            quantity: value.quantity,
            unit_price: value.unit_price,
            total_price: value.total_price,
            amount_paid: value.amount_paid,
            discount: value.discount,
            updated_at,
        }
    }
}
