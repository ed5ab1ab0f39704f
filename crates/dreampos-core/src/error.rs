//! # Error Types
//!
//! Domain error types for dreampos-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  dreampos-core errors (this file)                                      │
//! │  ├── CoreError        - Precondition failures on cart / split mutators │
//! │  └── ValidationError  - Catalog and promotion input failures           │
//! │                                                                         │
//! │  dreampos-register errors (separate crate)                             │
//! │  ├── RegisterError    - Config, catalog file, session registry         │
//! │  └── ApiError         - What the UI collaborator sees (serialized)     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → RegisterError → ApiError          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `CoreError` is a contract violation, not a transient failure. Retrying
//! the same call against the same state fails again; the caller checks the
//! guard (`any_paid`, payer range) first. A rejected mutation leaves the state
//! exactly as it was.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Cart, split and checkout precondition failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Non-positive quantity passed to `add_item`.
    #[error("Quantity must be at least 1, got {quantity}")]
    InvalidQuantity { quantity: i64 },

    /// Shared or per-payer tip edit after a payer has already paid.
    #[error("Tip cannot be changed after payment has started")]
    TipLocked,

    /// By-item reassignment after a payer has already paid.
    #[error("Item assignment is locked after payment has started")]
    AssignmentLocked,

    /// Payer index outside `1..=payer_count`.
    #[error("Payer {index} is out of range (1..={payer_count})")]
    PayerIndexOutOfRange { index: usize, payer_count: usize },

    /// Payer count change after a payer has already paid.
    #[error("Payer count cannot change after payment has started")]
    PayerCountChangeLocked,

    /// Requested payer count outside the supported range.
    #[error("Payer count {requested} must be between {min} and {max}")]
    PayerCountOutOfRange {
        requested: usize,
        min: usize,
        max: usize,
    },

    /// Payment method change for a payer who has already paid.
    #[error("Payer {index} has already paid")]
    PayerAlreadyPaid { index: usize },

    /// Split mode change, disable or restart after payment has started.
    ///
    /// ## User Workflow
    /// ```text
    /// Payer 1 pays ──► Cancel split? ──► SplitLocked
    ///                       │
    ///                       ▼
    ///            UI keeps the split panel, cancel button disabled
    /// ```
    #[error("Split bill cannot be changed after payment has started")]
    SplitLocked,

    /// Operation needs the other split state (split-only op while disabled,
    /// or single-payer checkout while split is on).
    #[error("Operation not available: split bill is {state}")]
    SplitNotActive { state: String },

    /// Cart key does not name a line in the cart.
    #[error("Cart line not found: {0}")]
    UnknownCartLine(String),

    /// Checkout attempted with nothing to pay for.
    #[error("Cart is empty")]
    EmptyCart,

    /// Product id not in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Variation name not offered by the product.
    #[error("Variation '{variation}' not found on product {product_id}")]
    VariationNotFound {
        product_id: String,
        variation: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors for catalog data and promotion tables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Duplicate value (e.g., two products with one id).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// Catalog document could not be parsed.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::PayerIndexOutOfRange {
            index: 4,
            payer_count: 3,
        };
        assert_eq!(err.to_string(), "Payer 4 is out of range (1..=3)");

        let err = CoreError::InvalidQuantity { quantity: 0 };
        assert_eq!(err.to_string(), "Quantity must be at least 1, got 0");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "product id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
