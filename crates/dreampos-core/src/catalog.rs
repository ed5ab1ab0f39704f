//! # Catalog
//!
//! Sellable products and their variations. Read-only input to pricing and the
//! cart; the register crate loads it from JSON.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Catalog                                                                │
//! │  └── Product  { id: "latte", base_price: 450 }                         │
//! │      ├── Variation { name: "Large", price_modifier: +80 }              │
//! │      ├── Variation { name: "Small", price_modifier: -50 }              │
//! │      └── Variation { name: "Oat milk", price_modifier: +60 }           │
//! │                                                                         │
//! │  VariationSelection = the subset the cashier picked for one line       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A selection holds at most one variation from each mutually exclusive group
//! (size, milk, ...). The UI enforces that; this module does not know the groups.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{validate_catalog, ValidationResult};

// =============================================================================
// Variation
// =============================================================================

/// A named option on a product with a signed price delta.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Variation {
    /// Unique within its product.
    pub name: String,

    /// Added to the base price when selected. May be negative.
    pub price_modifier: Money,
}

impl Variation {
    pub fn new(name: impl Into<String>, price_modifier: Money) -> Self {
        Variation {
            name: name.into(),
            price_modifier,
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Unique identifier (e.g. "latte").
    pub id: String,

    /// Display name. Translation is the UI's job.
    #[serde(default)]
    pub name: String,

    /// Price before variations, in cents.
    pub base_price: Money,

    /// Menu categories used by the product grid filters.
    #[serde(default)]
    pub categories: Vec<String>,

    /// Offered variations, in menu order.
    #[serde(default)]
    pub variations: Vec<Variation>,
}

impl Product {
    /// Creates a product named after its id, with no categories or variations.
    pub fn new(id: impl Into<String>, base_price: Money) -> Self {
        let id = id.into();
        Product {
            name: id.clone(),
            id,
            base_price,
            categories: Vec::new(),
            variations: Vec::new(),
        }
    }

    /// Builder-style variation append, handy for tests and seeding.
    pub fn with_variation(mut self, name: impl Into<String>, price_modifier: Money) -> Self {
        self.variations.push(Variation::new(name, price_modifier));
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    /// Looks up an offered variation by name.
    pub fn variation(&self, name: &str) -> Option<&Variation> {
        self.variations.iter().find(|v| v.name == name)
    }

    /// Builds a selection from variation names.
    ///
    /// Fails with `VariationNotFound` on the first name the product does not offer.
    pub fn select(&self, names: &[&str]) -> CoreResult<VariationSelection> {
        names
            .iter()
            .map(|name| {
                self.variation(name)
                    .cloned()
                    .ok_or_else(|| CoreError::VariationNotFound {
                        product_id: self.id.clone(),
                        variation: (*name).to_string(),
                    })
            })
            .collect::<CoreResult<Vec<_>>>()
            .map(VariationSelection::new)
    }
}

// =============================================================================
// Variation Selection
// =============================================================================

/// The variations chosen for one cart line.
///
/// Order of insertion is irrelevant to identity: the cart key sorts by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct VariationSelection(Vec<Variation>);

impl VariationSelection {
    pub fn new(variations: Vec<Variation>) -> Self {
        VariationSelection(variations)
    }

    /// No variations chosen.
    pub fn none() -> Self {
        VariationSelection(Vec::new())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variation> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Variation names sorted lexicographically.
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.0.iter().map(|v| v.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Sum of the selected price modifiers.
    pub fn price_delta(&self) -> Money {
        self.0.iter().map(|v| v.price_modifier).sum()
    }
}

impl From<Vec<Variation>> for VariationSelection {
    fn from(variations: Vec<Variation>) -> Self {
        VariationSelection(variations)
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// The full list of sellable products.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Creates a validated catalog.
    pub fn new(products: Vec<Product>) -> ValidationResult<Self> {
        validate_catalog(&products)?;
        Ok(Catalog { products })
    }

    /// Parses and validates a JSON array of products.
    ///
    /// ```rust
    /// use dreampos_core::catalog::Catalog;
    ///
    /// let catalog = Catalog::from_json(r#"[
    ///     {"id": "latte", "basePrice": 450,
    ///      "variations": [{"name": "Large", "priceModifier": 80}]}
    /// ]"#).unwrap();
    ///
    /// assert_eq!(catalog.find("latte").unwrap().base_price.cents(), 450);
    /// ```
    pub fn from_json(json: &str) -> ValidationResult<Self> {
        let products: Vec<Product> =
            serde_json::from_str(json).map_err(|e| ValidationError::InvalidFormat {
                field: "catalog".to_string(),
                reason: e.to_string(),
            })?;
        Catalog::new(products)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Like [`Catalog::find`], but as a `CoreError` for `?` chains.
    pub fn get(&self, id: &str) -> CoreResult<&Product> {
        self.find(id)
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))
    }

    pub fn variation(&self, product_id: &str, name: &str) -> Option<&Variation> {
        self.find(product_id).and_then(|p| p.variation(name))
    }

    /// Resolves a product and a list of variation names in one step.
    pub fn select(
        &self,
        product_id: &str,
        names: &[&str],
    ) -> CoreResult<(&Product, VariationSelection)> {
        let product = self.get(product_id)?;
        let selection = product.select(names)?;
        Ok((product, selection))
    }

    /// Products tagged with `category`, in catalog order.
    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Product> {
        self.products
            .iter()
            .filter(move |p| p.categories.iter().any(|c| c == category))
    }

    /// All categories, sorted and deduplicated.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut categories: Vec<&str> = self
            .products
            .iter()
            .flat_map(|p| p.categories.iter().map(String::as_str))
            .filter(|c| seen.insert(*c))
            .collect();
        categories.sort_unstable();
        categories
    }
}
