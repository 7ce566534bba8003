use chrono::NaiveDateTime;
use pushkind_common::pagination::Pagination;
use serde::{Deserialize, Serialize};

/// Priced sub-option of a product, e.g. a pack size.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Variant {
    /// Unique identifier of the variant.
    pub id: i32,
    /// Product the variant belongs to.
    pub product_id: i32,
    /// Human-readable name of the variant.
    pub name: String,
    /// Current catalog price in paise.
    pub price: i64,
}

/// Domain representation of a catalog product managed by a hub.
///
/// A product is priced either through its own flat `price` or through its
/// `variants`, never both.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Product {
    /// Unique identifier of the product.
    pub id: i32,
    /// Owning hub identifier.
    pub hub_id: i32,
    /// Human-readable name of the product.
    pub name: String,
    /// Flat price in paise, unset when the product has variants.
    pub price: Option<i64>,
    /// Flag indicating whether the product has been archived.
    pub is_archived: bool,
    /// Variants ordered by creation.
    pub variants: Vec<Variant>,
    /// Timestamp for when the product record was created.
    pub created_at: NaiveDateTime,
    /// Timestamp for the last update to the product record.
    pub updated_at: NaiveDateTime,
}

impl Product {
    /// Look up a variant of this product.
    pub fn variant(&self, variant_id: i32) -> Option<&Variant> {
        self.variants.iter().find(|variant| variant.id == variant_id)
    }

    /// Whether the product is priced through variants.
    pub fn has_variants(&self) -> bool {
        !self.variants.is_empty()
    }

    /// Display name for a line referencing this product and an optional variant.
    pub fn display_name(&self, variant: Option<&Variant>) -> String {
        match variant {
            Some(variant) => format!("{} ({})", self.name, variant.name),
            None => self.name.clone(),
        }
    }
}

/// Variant submitted as part of a product payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDraft {
    /// Existing variant identifier when editing, `None` for new variants.
    pub id: Option<i32>,
    /// Human-readable name of the variant.
    pub name: String,
    /// Price in paise.
    pub price: i64,
}

/// How a product is priced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductPricing {
    /// Single price for the product itself.
    Flat(i64),
    /// One or more priced variants.
    Variants(Vec<VariantDraft>),
}

/// Payload required to insert a new product for a hub.
#[derive(Debug, Clone)]
pub struct NewProduct {
    /// Owning hub identifier.
    pub hub_id: i32,
    /// Human-readable name of the product.
    pub name: String,
    /// Flat price or variant list.
    pub pricing: ProductPricing,
    /// Timestamp captured when the product payload was created.
    pub updated_at: NaiveDateTime,
}

impl NewProduct {
    /// Build a new product payload with the current timestamp.
    pub fn new(hub_id: i32, name: impl Into<String>, pricing: ProductPricing) -> Self {
        Self {
            hub_id,
            name: name.into(),
            pricing,
            updated_at: chrono::Local::now().naive_utc(),
        }
    }
}

/// Patch data applied when updating an existing product.
#[derive(Debug, Clone)]
pub struct UpdateProduct {
    /// Optional name update.
    pub name: Option<String>,
    /// Optional pricing replacement.
    pub pricing: Option<ProductPricing>,
    /// Whether the product should be archived or restored.
    pub is_archived: Option<bool>,
    /// Timestamp captured when the patch was created.
    pub updated_at: NaiveDateTime,
}

impl Default for UpdateProduct {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateProduct {
    /// Create a new patch object with no changes applied yet.
    pub fn new() -> Self {
        Self {
            name: None,
            pricing: None,
            is_archived: None,
            updated_at: chrono::Local::now().naive_utc(),
        }
    }

    /// Update the product name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replace the product pricing.
    pub fn pricing(mut self, pricing: ProductPricing) -> Self {
        self.pricing = Some(pricing);
        self
    }

    /// Archive or restore the product.
    pub fn archived(mut self, is_archived: bool) -> Self {
        self.is_archived = Some(is_archived);
        self
    }
}

/// Result of writing an [`UpdateProduct`].
#[derive(Debug, Clone)]
pub enum ProductUpdate {
    Updated(Product),
    /// The update drops variants that this many order items, stock records
    /// or expenses still reference. Nothing was written.
    VariantsInUse(usize),
}

/// Query definition used to list products for a hub.
#[derive(Debug, Clone)]
pub struct ProductListQuery {
    /// Owning hub identifier.
    pub hub_id: i32,
    /// Optional name search term.
    pub search: Option<String>,
    /// Whether archived products should be included in the results.
    pub include_archived: bool,
    /// Optional pagination options applied to the query.
    pub pagination: Option<Pagination>,
}

impl ProductListQuery {
    /// Construct a query that targets all products belonging to `hub_id`.
    pub fn new(hub_id: i32) -> Self {
        Self {
            hub_id,
            search: None,
            include_archived: false,
            pagination: None,
        }
    }

    /// Filter the results by a search term applied to the name.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Include archived products in the results.
    pub fn include_archived(mut self) -> Self {
        self.include_archived = true;
        self
    }

    /// Apply pagination to the query with the given page number and page size.
    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}
