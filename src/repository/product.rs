use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use pushkind_common::repository::errors::{RepositoryError, RepositoryResult};

use crate::{
    domain::product::{
        NewProduct as DomainNewProduct, Product as DomainProduct, ProductListQuery,
        ProductPricing, ProductUpdate, UpdateProduct as DomainUpdateProduct,
    },
    models::product::{
        NewProduct as DbNewProduct, NewVariant as DbNewVariant, Product as DbProduct,
        UpdateProduct as DbUpdateProduct, UpdateVariant as DbUpdateVariant, Variant as DbVariant,
    },
    repository::{DieselRepository, ProductReader, ProductWriter},
};

impl ProductReader for DieselRepository {
    fn get_product_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<DomainProduct>> {
        use crate::schema::products;

        let mut conn = self.conn()?;
        let product = products::table
            .filter(products::id.eq(id))
            .filter(products::hub_id.eq(hub_id))
            .first::<DbProduct>(&mut conn)
            .optional()?;

        let Some(product) = product else {
            return Ok(None);
        };

        let variants = load_variants(&mut conn, product.id)?;
        Ok(Some(product.into_domain(variants)))
    }

    fn list_products(
        &self,
        query: ProductListQuery,
    ) -> RepositoryResult<(usize, Vec<DomainProduct>)> {
        use crate::schema::{products, variants};

        let mut conn = self.conn()?;

        let mut count_query = products::table
            .filter(products::hub_id.eq(query.hub_id))
            .into_boxed::<diesel::sqlite::Sqlite>();

        if !query.include_archived {
            count_query = count_query.filter(products::is_archived.eq(false));
        }

        if let Some(term) = query.search.as_ref() {
            let pattern = format!("%{}%", term);
            count_query = count_query.filter(products::name.like(pattern));
        }

        let total = count_query.count().get_result::<i64>(&mut conn)? as usize;

        let mut items = products::table
            .filter(products::hub_id.eq(query.hub_id))
            .into_boxed::<diesel::sqlite::Sqlite>();

        if !query.include_archived {
            items = items.filter(products::is_archived.eq(false));
        }

        if let Some(term) = query.search.as_ref() {
            let pattern = format!("%{}%", term);
            items = items.filter(products::name.like(pattern));
        }

        items = items.order((products::is_archived.asc(), products::name.asc()));

        if let Some(pagination) = &query.pagination {
            let offset = ((pagination.page.max(1) - 1) * pagination.per_page) as i64;
            let limit = pagination.per_page as i64;
            items = items.offset(offset).limit(limit);
        }

        let db_products = items.load::<DbProduct>(&mut conn)?;

        if db_products.is_empty() {
            return Ok((total, Vec::new()));
        }

        let grouped = DbVariant::belonging_to(&db_products)
            .order(variants::id.asc())
            .load::<DbVariant>(&mut conn)?
            .grouped_by(&db_products);

        let products = db_products
            .into_iter()
            .zip(grouped)
            .map(DomainProduct::from)
            .collect();

        Ok((total, products))
    }
}

impl ProductWriter for DieselRepository {
    fn create_product(&self, new_product: &DomainNewProduct) -> RepositoryResult<DomainProduct> {
        use crate::schema::{products, variants};

        let mut conn = self.conn()?;

        conn.transaction::<DomainProduct, RepositoryError, _>(|conn| {
            let price = match &new_product.pricing {
                ProductPricing::Flat(price) => Some(*price),
                ProductPricing::Variants(_) => None,
            };

            let db_new = DbNewProduct {
                hub_id: new_product.hub_id,
                name: new_product.name.as_str(),
                price,
                updated_at: new_product.updated_at,
            };

            let created = diesel::insert_into(products::table)
                .values(&db_new)
                .get_result::<DbProduct>(conn)?;

            if let ProductPricing::Variants(drafts) = &new_product.pricing {
                let payload: Vec<DbNewVariant> = drafts
                    .iter()
                    .map(|draft| DbNewVariant {
                        product_id: created.id,
                        name: draft.name.as_str(),
                        price: draft.price,
                        updated_at: new_product.updated_at,
                    })
                    .collect();

                if !payload.is_empty() {
                    diesel::insert_into(variants::table)
                        .values(&payload)
                        .execute(conn)?;
                }
            }

            let variants = load_variants(conn, created.id)?;
            Ok(created.into_domain(variants))
        })
    }

    fn update_product(
        &self,
        product_id: i32,
        hub_id: i32,
        updates: &DomainUpdateProduct,
    ) -> RepositoryResult<ProductUpdate> {
        use crate::schema::{products, remaining_inventory, variants};

        let mut conn = self.conn()?;

        conn.immediate_transaction::<ProductUpdate, RepositoryError, _>(|conn| {
            let target = products::table
                .filter(products::id.eq(product_id))
                .filter(products::hub_id.eq(hub_id));

            products::table
                .filter(products::id.eq(product_id))
                .filter(products::hub_id.eq(hub_id))
                .select(products::id)
                .first::<i32>(conn)
                .optional()?
                .ok_or(RepositoryError::NotFound)?;

            let drafts = match &updates.pricing {
                Some(ProductPricing::Flat(_)) => Some(&[][..]),
                Some(ProductPricing::Variants(drafts)) => Some(drafts.as_slice()),
                None => None,
            };

            let mut removed: Vec<i32> = Vec::new();
            if let Some(drafts) = drafts {
                let kept: Vec<i32> = drafts.iter().filter_map(|draft| draft.id).collect();
                removed = variants::table
                    .filter(variants::product_id.eq(product_id))
                    .filter(variants::id.ne_all(&kept))
                    .select(variants::id)
                    .load::<i32>(conn)?;

                if !removed.is_empty() {
                    let references = count_variant_references(conn, &removed)?;
                    if references > 0 {
                        return Ok(ProductUpdate::VariantsInUse(references));
                    }
                }
            }

            let price = match &updates.pricing {
                Some(ProductPricing::Flat(price)) => Some(Some(*price)),
                Some(ProductPricing::Variants(_)) => Some(None),
                None => None,
            };

            let db_updates = DbUpdateProduct {
                name: updates.name.as_deref(),
                price,
                is_archived: updates.is_archived,
                updated_at: updates.updated_at,
            };

            let updated = diesel::update(target)
                .set(&db_updates)
                .get_result::<DbProduct>(conn)?;

            if !removed.is_empty() {
                diesel::delete(
                    remaining_inventory::table
                        .filter(remaining_inventory::variant_id.eq_any(&removed))
                        .filter(remaining_inventory::quantity.eq(0)),
                )
                .execute(conn)?;
                diesel::delete(variants::table.filter(variants::id.eq_any(&removed)))
                    .execute(conn)?;
            }

            for draft in drafts.unwrap_or_default() {
                match draft.id {
                    Some(variant_id) => {
                        let changed = diesel::update(
                            variants::table
                                .filter(variants::id.eq(variant_id))
                                .filter(variants::product_id.eq(product_id)),
                        )
                        .set(&DbUpdateVariant {
                            name: draft.name.as_str(),
                            price: draft.price,
                            updated_at: updates.updated_at,
                        })
                        .execute(conn)?;

                        if changed == 0 {
                            return Err(RepositoryError::NotFound);
                        }
                    }
                    None => {
                        diesel::insert_into(variants::table)
                            .values(&DbNewVariant {
                                product_id,
                                name: draft.name.as_str(),
                                price: draft.price,
                                updated_at: updates.updated_at,
                            })
                            .execute(conn)?;
                    }
                }
            }

            let variants = load_variants(conn, updated.id)?;
            Ok(ProductUpdate::Updated(updated.into_domain(variants)))
        })
    }
}

fn load_variants(conn: &mut SqliteConnection, product_id: i32) -> RepositoryResult<Vec<DbVariant>> {
    use crate::schema::variants;

    Ok(variants::table
        .filter(variants::product_id.eq(product_id))
        .order(variants::id.asc())
        .load::<DbVariant>(conn)?)
}

/// Number of order items, receipts, expenses and non-empty stock counters
/// referencing any of the given variants.
fn count_variant_references(
    conn: &mut SqliteConnection,
    variant_ids: &[i32],
) -> RepositoryResult<usize> {
    use crate::schema::{finance_expenses, inventory, order_items, remaining_inventory};

    let items = order_items::table
        .filter(order_items::variant_id.eq_any(variant_ids))
        .count()
        .get_result::<i64>(conn)?;
    let receipts = inventory::table
        .filter(inventory::variant_id.eq_any(variant_ids))
        .count()
        .get_result::<i64>(conn)?;
    let expenses = finance_expenses::table
        .filter(finance_expenses::variant_id.eq_any(variant_ids))
        .count()
        .get_result::<i64>(conn)?;
    // Empty counters are dropped together with the variant.
    let counters = remaining_inventory::table
        .filter(remaining_inventory::variant_id.eq_any(variant_ids))
        .filter(remaining_inventory::quantity.gt(0))
        .count()
        .get_result::<i64>(conn)?;

    Ok((items + receipts + expenses + counters) as usize)
}
