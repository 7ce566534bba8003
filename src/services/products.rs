use pushkind_common::domain::auth::AuthenticatedUser;
use pushkind_common::pagination::{DEFAULT_ITEMS_PER_PAGE, Paginated};
use serde::{Deserialize, Serialize};

use crate::domain::format_paise;
use crate::domain::product::{
    Product, ProductListQuery, ProductPricing, ProductUpdate, UpdateProduct, Variant,
};
use crate::forms::products::{ProductForm, UploadProductsForm};
use crate::repository::{ProductReader, ProductWriter};
use crate::services::{ServiceError, ServiceResult, ensure_any_role};
use crate::{DELIVERY_ROLE, SALES_ROLE, TREASURER_ROLE};

/// Query parameters accepted by the products index page.
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    /// Optional search string entered by the user.
    pub search: Option<String>,
    /// Page requested by the UI (1-based).
    pub page: Option<usize>,
    /// Whether archived items should be included in the response.
    #[serde(default)]
    pub show_archived: bool,
}

/// Data required to render the products index template.
pub struct ProductsPageData {
    /// Paginated list of products displayed in the table.
    pub products: Paginated<ProductView>,
    /// Search query echoed back to the view when present.
    pub search: Option<String>,
    /// Whether archived items were requested.
    pub show_archived: bool,
}

/// Loads the catalog page. Every staff role may browse the catalog.
pub fn load_products_page<R>(
    repo: &R,
    user: &AuthenticatedUser,
    query: ProductsQuery,
) -> ServiceResult<ProductsPageData>
where
    R: ProductReader + ?Sized,
{
    ensure_any_role(user, &[SALES_ROLE, DELIVERY_ROLE, TREASURER_ROLE])?;

    let ProductsQuery {
        search,
        page,
        show_archived,
    } = query;

    let page = page.unwrap_or(1);
    let mut list_query = ProductListQuery::new(user.hub_id).paginate(page, DEFAULT_ITEMS_PER_PAGE);

    if let Some(search_term) = search.as_ref() {
        list_query = list_query.search(search_term);
    }

    if show_archived {
        list_query = list_query.include_archived();
    }

    let (total, items) = repo.list_products(list_query).map_err(ServiceError::from)?;

    let view_items: Vec<ProductView> = items.into_iter().map(ProductView::from).collect();

    let total_pages = total.div_ceil(DEFAULT_ITEMS_PER_PAGE);
    let products = Paginated::new(view_items, page, total_pages);

    Ok(ProductsPageData {
        products,
        search,
        show_archived,
    })
}

/// Active products offered on the order form.
pub fn load_catalog<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<Vec<ProductView>>
where
    R: ProductReader + ?Sized,
{
    ensure_any_role(user, &[SALES_ROLE, DELIVERY_ROLE, TREASURER_ROLE])?;

    let (_, products) = repo
        .list_products(ProductListQuery::new(user.hub_id))
        .map_err(ServiceError::from)?;

    Ok(products.into_iter().map(ProductView::from).collect())
}

/// Creates a new product for the authenticated user's hub.
pub fn create_product<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: ProductForm,
) -> ServiceResult<Product>
where
    R: ProductWriter + ?Sized,
{
    ensure_any_role(user, &[])?;

    let payload = form
        .into_new_product(user.hub_id)
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    repo.create_product(&payload).map_err(ServiceError::from)
}

/// Replaces the name and pricing of a product.
///
/// Variants that are dropped from the form are deleted, which is refused
/// while any order, stock record or expense still points at them.
pub fn update_product<R>(
    repo: &R,
    user: &AuthenticatedUser,
    product_id: i32,
    form: ProductForm,
) -> ServiceResult<Product>
where
    R: ProductReader + ProductWriter + ?Sized,
{
    ensure_any_role(user, &[])?;

    let existing = repo
        .get_product_by_id(product_id, user.hub_id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;

    let updates = form
        .into_update_product()
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    ensure_known_variants(&existing, &updates)?;

    let outcome = repo
        .update_product(product_id, user.hub_id, &updates)
        .map_err(ServiceError::from)?;
    updated_product(outcome, &existing.name)
}

/// Submitted variant ids must belong to the product being edited.
fn ensure_known_variants(existing: &Product, updates: &UpdateProduct) -> ServiceResult<()> {
    let Some(ProductPricing::Variants(drafts)) = &updates.pricing else {
        return Ok(());
    };

    match drafts
        .iter()
        .filter_map(|draft| draft.id)
        .find(|id| existing.variant(*id).is_none())
    {
        Some(id) => Err(ServiceError::Form(format!(
            "«{}» has no variant #{id}",
            existing.name
        ))),
        None => Ok(()),
    }
}

fn updated_product(outcome: ProductUpdate, name: &str) -> ServiceResult<Product> {
    match outcome {
        ProductUpdate::Updated(product) => Ok(product),
        ProductUpdate::VariantsInUse(references) => Err(ServiceError::Conflict(format!(
            "«{name}» has variants still used by {references} order item(s), stock or expense record(s)"
        ))),
    }
}

/// Archives or restores a product. Archived products stay on existing
/// orders but cannot be added to new lines.
pub fn set_archived<R>(
    repo: &R,
    user: &AuthenticatedUser,
    product_id: i32,
    archived: bool,
) -> ServiceResult<Product>
where
    R: ProductWriter + ?Sized,
{
    ensure_any_role(user, &[])?;

    let outcome = repo
        .update_product(product_id, user.hub_id, &UpdateProduct::new().archived(archived))
        .map_err(ServiceError::from)?;
    updated_product(outcome, &format!("product #{product_id}"))
}

/// Imports products from an uploaded CSV file.
pub fn import_products<R>(
    repo: &R,
    user: &AuthenticatedUser,
    mut form: UploadProductsForm,
) -> ServiceResult<usize>
where
    R: ProductWriter + ?Sized,
{
    ensure_any_role(user, &[])?;

    let uploads = form
        .parse(user.hub_id)
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    let mut created = 0usize;
    for upload in uploads {
        repo.create_product(&upload).map_err(ServiceError::from)?;
        created += 1;
    }

    Ok(created)
}

/// View model exposed to the products templates.
#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: i32,
    pub name: String,
    pub price: Option<i64>,
    pub price_display: Option<String>,
    pub is_archived: bool,
    pub variants: Vec<VariantView>,
    pub updated_at: chrono::NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct VariantView {
    pub id: i32,
    pub name: String,
    pub price: i64,
    pub price_display: String,
}

impl From<Variant> for VariantView {
    fn from(variant: Variant) -> Self {
        Self {
            id: variant.id,
            name: variant.name,
            price_display: format_paise(variant.price),
            price: variant.price,
        }
    }
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        let Product {
            id,
            name,
            price,
            is_archived,
            variants,
            updated_at,
            ..
        } = product;

        Self {
            id,
            name,
            price,
            price_display: price.map(format_paise),
            is_archived,
            variants: variants.into_iter().map(VariantView::from).collect(),
            updated_at,
        }
    }
}
