//! # Validation Module
//!
//! Input rules for data entering the engine from outside: catalog documents and
//! promotion tables. Cart and split mutators check their own preconditions and
//! report them as `CoreError`.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Catalog JSON ──► validate_catalog()      ← THIS MODULE                │
//! │  Promotion    ──► validate_percent_bps()  ← THIS MODULE                │
//! │  Cart edits   ──► Cart / SplitAllocator guards (CoreError)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use crate::catalog::Product;
use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a product id.
///
/// ## Rules
/// - Must not be blank
/// - At most 100 characters
///
/// ```rust
/// use dreampos_core::validation::validate_product_id;
///
/// assert!(validate_product_id("latte").is_ok());
/// assert!(validate_product_id("  ").is_err());
/// ```
pub fn validate_product_id(id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: "product id".to_string(),
        });
    }

    if id.len() > 100 {
        return Err(ValidationError::OutOfRange {
            field: "product id length".to_string(),
            min: 1,
            max: 100,
        });
    }

    Ok(())
}

/// Validates a percentage in basis points (0..=10000).
pub fn validate_percent_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "percentage".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

/// Validates a whole catalog.
///
/// ## Rules
/// - Every product id is valid and unique
/// - Variation names are non-empty and unique within their product
pub fn validate_catalog(products: &[Product]) -> ValidationResult<()> {
    let mut ids = HashSet::new();

    for product in products {
        validate_product_id(&product.id)?;

        if !ids.insert(product.id.as_str()) {
            return Err(ValidationError::Duplicate {
                field: "product id".to_string(),
                value: product.id.clone(),
            });
        }

        let mut names = HashSet::new();
        for variation in &product.variations {
            if variation.name.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: format!("variation name on {}", product.id),
                });
            }
            if !names.insert(variation.name.as_str()) {
                return Err(ValidationError::Duplicate {
                    field: format!("variation on {}", product.id),
                    value: variation.name.clone(),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    #[test]
    fn test_validate_product_id() {
        assert!(validate_product_id("iced-latte").is_ok());
        assert!(validate_product_id("").is_err());
        assert!(validate_product_id(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_percent_bps() {
        assert!(validate_percent_bps(0).is_ok());
        assert!(validate_percent_bps(5000).is_ok());
        assert!(validate_percent_bps(10_000).is_ok());
        assert!(validate_percent_bps(10_001).is_err());
    }

    #[test]
    fn test_duplicate_product_id() {
        let products = vec![
            Product::new("latte", Money::from_cents(450)),
            Product::new("latte", Money::from_cents(500)),
        ];
        let err = validate_catalog(&products).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Duplicate {
                field: "product id".to_string(),
                value: "latte".to_string(),
            }
        );
    }

    #[test]
    fn test_duplicate_variation_name() {
        let products = vec![Product::new("latte", Money::from_cents(450))
            .with_variation("Large", Money::from_cents(80))
            .with_variation("Large", Money::from_cents(90))];
        assert!(matches!(
            validate_catalog(&products),
            Err(ValidationError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_same_variation_name_on_different_products_is_fine() {
        let products = vec![
            Product::new("latte", Money::from_cents(450)).with_variation("Large", Money::from_cents(80)),
            Product::new("tea", Money::from_cents(300)).with_variation("Large", Money::from_cents(50)),
        ];
        assert!(validate_catalog(&products).is_ok());
    }
}
