use std::io::{Read, Seek};

use actix_multipart::form::{MultipartForm, tempfile::TempFile};
use csv::Trim;
use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::product::{NewProduct, ProductPricing, UpdateProduct, VariantDraft};
use crate::forms::{MAX_MONEY, optional_id, optional_money, parse_money, sanitize_inline_text};

/// Maximum allowed length for product and variant names.
const NAME_MAX_LEN: u64 = 128;

pub type ProductFormResult<T> = Result<T, ProductFormError>;

/// Errors that can occur while processing product forms.
#[derive(Debug, Error)]
pub enum ProductFormError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("product name cannot be empty")]
    EmptyName,
    #[error("«{0}» cannot have both a price and variants")]
    BothPriceAndVariants(String),
    #[error("«{0}» needs either a price or at least one variant")]
    NeitherPriceNorVariants(String),
    #[error("variant {line} needs a name of at most 128 characters")]
    InvalidVariantName { line: usize },
    #[error("variant «{0}» has no price")]
    VariantMissingPrice(String),
    #[error("variant «{0}» is listed more than once")]
    DuplicateVariant(String),
    #[error("failed to parse product form: {0}")]
    Encoding(#[from] serde_qs::Error),
    #[error("row {row} has invalid price `{value}`")]
    UploadInvalidPrice { row: usize, value: String },
    #[error("row {row} is missing a product name")]
    UploadMissingName { row: usize },
    #[error("upload contains no products")]
    EmptyUpload,
    #[error("error reading csv file")]
    FileRead(#[from] std::io::Error),
    #[error("error parsing csv file: {0}")]
    Csv(#[from] csv::Error),
}

/// One variant row of the product form. Blank rows are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariantPayload {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<i32>,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "optional_money")]
    pub price: Option<i64>,
}

/// Payload of the add and edit product forms.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProductForm {
    #[validate(length(min = 1, max = NAME_MAX_LEN))]
    pub name: String,
    #[serde(default, deserialize_with = "optional_money")]
    pub price: Option<i64>,
    #[serde(default)]
    pub variants: Vec<VariantPayload>,
}

impl ProductForm {
    /// Parse the bracketed HTML form encoding (`variants[0][name]=Large`).
    pub fn from_form_body(body: &[u8]) -> ProductFormResult<Self> {
        Ok(serde_qs::Config::new(5, false).deserialize_bytes(body)?)
    }

    pub fn into_new_product(self, hub_id: i32) -> ProductFormResult<NewProduct> {
        let (name, pricing) = self.into_parts()?;
        Ok(NewProduct::new(hub_id, name, pricing))
    }

    /// Edits replace the name and the whole pricing of the product.
    pub fn into_update_product(self) -> ProductFormResult<UpdateProduct> {
        let (name, pricing) = self.into_parts()?;
        Ok(UpdateProduct::new().name(name).pricing(pricing))
    }

    fn into_parts(self) -> ProductFormResult<(String, ProductPricing)> {
        self.validate()?;

        let name = sanitize_inline_text(&self.name);
        if name.is_empty() {
            return Err(ProductFormError::EmptyName);
        }

        let mut drafts: Vec<VariantDraft> = Vec::new();
        for (index, variant) in self.variants.into_iter().enumerate() {
            let variant_name = sanitize_inline_text(&variant.name);

            if variant_name.is_empty() && variant.price.is_none() && variant.id.is_none() {
                continue;
            }

            if variant_name.is_empty() || variant_name.chars().count() > NAME_MAX_LEN as usize {
                return Err(ProductFormError::InvalidVariantName { line: index + 1 });
            }

            let price = variant
                .price
                .ok_or_else(|| ProductFormError::VariantMissingPrice(variant_name.clone()))?;

            push_variant(
                &mut drafts,
                VariantDraft {
                    id: variant.id,
                    name: variant_name,
                    price,
                },
            )?;
        }

        let pricing = resolve_pricing(&name, self.price, drafts)?;
        Ok((name, pricing))
    }
}

fn push_variant(drafts: &mut Vec<VariantDraft>, draft: VariantDraft) -> ProductFormResult<()> {
    if drafts
        .iter()
        .any(|existing| existing.name.eq_ignore_ascii_case(&draft.name))
    {
        return Err(ProductFormError::DuplicateVariant(draft.name));
    }
    drafts.push(draft);
    Ok(())
}

/// A product is priced either flat or per variant, never both and never
/// neither.
fn resolve_pricing(
    name: &str,
    price: Option<i64>,
    variants: Vec<VariantDraft>,
) -> ProductFormResult<ProductPricing> {
    match (price, variants.is_empty()) {
        (Some(_), false) => Err(ProductFormError::BothPriceAndVariants(name.to_string())),
        (None, true) => Err(ProductFormError::NeitherPriceNorVariants(name.to_string())),
        (Some(price), true) => Ok(ProductPricing::Flat(price)),
        (None, false) => Ok(ProductPricing::Variants(variants)),
    }
}

#[derive(MultipartForm)]
/// Multipart form for uploading a catalog CSV with `name,variant,price` rows.
pub struct UploadProductsForm {
    #[multipart(limit = "10MB")]
    pub csv: TempFile,
}

impl UploadProductsForm {
    /// Parse the uploaded CSV file into new products.
    pub fn parse(&mut self, hub_id: i32) -> ProductFormResult<Vec<NewProduct>> {
        self.csv.file.rewind()?;
        parse_catalog(self.csv.file.by_ref(), hub_id)
    }
}

/// Rows sharing a product name become one product. A row with an empty
/// variant column sets the flat price.
fn parse_catalog<R: Read>(reader: R, hub_id: i32) -> ProductFormResult<Vec<NewProduct>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut grouped: Vec<(String, Option<i64>, Vec<VariantDraft>)> = Vec::new();

    for (index, record) in rdr.records().enumerate() {
        let row = index + 2;
        let record = record?;

        let name = sanitize_inline_text(record.get(0).unwrap_or(""));
        if name.is_empty() {
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }
            return Err(ProductFormError::UploadMissingName { row });
        }

        let variant = sanitize_inline_text(record.get(1).unwrap_or(""));
        let raw_price = record.get(2).unwrap_or("").trim();
        let price = parse_money(raw_price)
            .filter(|price| *price <= MAX_MONEY)
            .ok_or_else(|| ProductFormError::UploadInvalidPrice {
                row,
                value: raw_price.to_string(),
            })?;

        let position = match grouped
            .iter()
            .position(|(existing, _, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(position) => position,
            None => {
                grouped.push((name, None, Vec::new()));
                grouped.len() - 1
            }
        };
        let entry = &mut grouped[position];

        if variant.is_empty() {
            if entry.1.is_some() || !entry.2.is_empty() {
                return Err(ProductFormError::BothPriceAndVariants(entry.0.clone()));
            }
            entry.1 = Some(price);
        } else {
            if entry.1.is_some() {
                return Err(ProductFormError::BothPriceAndVariants(entry.0.clone()));
            }
            push_variant(
                &mut entry.2,
                VariantDraft {
                    id: None,
                    name: variant,
                    price,
                },
            )?;
        }
    }

    if grouped.is_empty() {
        return Err(ProductFormError::EmptyUpload);
    }

    grouped
        .into_iter()
        .map(|(name, price, variants)| {
            let pricing = resolve_pricing(&name, price, variants)?;
            Ok(NewProduct::new(hub_id, name, pricing))
        })
        .collect()
}
