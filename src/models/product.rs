use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::product::{Product as DomainProduct, Variant as DomainVariant};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::products)]
pub struct Product {
    pub id: i32,
    pub hub_id: i32,
    pub name: String,
    pub price: Option<i64>,
    pub is_archived: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = crate::schema::variants)]
#[diesel(belongs_to(Product, foreign_key = product_id))]
pub struct Variant {
    pub id: i32,
    pub product_id: i32,
    pub name: String,
    pub price: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::products)]
pub struct NewProduct<'a> {
    pub hub_id: i32,
    pub name: &'a str,
    pub price: Option<i64>,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::variants)]
pub struct NewVariant<'a> {
    pub product_id: i32,
    pub name: &'a str,
    pub price: i64,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::products)]
pub struct UpdateProduct<'a> {
    pub name: Option<&'a str>,
    pub price: Option<Option<i64>>,
    pub is_archived: Option<bool>,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::variants)]
pub struct UpdateVariant<'a> {
    pub name: &'a str,
    pub price: i64,
    pub updated_at: NaiveDateTime,
}

impl Product {
    pub fn into_domain(self, variants: Vec<Variant>) -> DomainProduct {
        DomainProduct {
            id: self.id,
            hub_id: self.hub_id,
            name: self.name,
            price: self.price,
            is_archived: self.is_archived,
            variants: variants.into_iter().map(Variant::into_domain).collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl Variant {
    pub fn into_domain(self) -> DomainVariant {
        DomainVariant {
            id: self.id,
            product_id: self.product_id,
            name: self.name,
            price: self.price,
        }
    }
}

impl From<(Product, Vec<Variant>)> for DomainProduct {
    fn from(value: (Product, Vec<Variant>)) -> Self {
        value.0.into_domain(value.1)
    }
}
