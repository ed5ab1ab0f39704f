//! # Register Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in DreamPOS                               │
//! │                                                                         │
//! │  UI collaborator              Register                                  │
//! │  ───────────────              ────────                                  │
//! │                                                                         │
//! │  mark_paid(session, 2)                                                  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  SessionRegistry::with_session_mut                               │  │
//! │  │  Result<T, RegisterError>                                        │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Unknown session? ─── RegisterError::SessionNotFound ──┐        │  │
//! │  │         │                                              │        │  │
//! │  │         ▼                                              ▼        │  │
//! │  │  Locked split? ─── CoreError::TipLocked ───────────► ApiError ─►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  e.code = "PAYMENT_LOCKED"                                              │
//! │  e.message = "Tip cannot be changed after payment has started"          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use dreampos_core::{CoreError, ValidationError};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for register operations.
pub type RegisterResult<T> = Result<T, RegisterError>;

/// Everything that can go wrong at the terminal layer.
#[derive(Debug, Error)]
pub enum RegisterError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Config values failed validation.
    #[error("Invalid register configuration: {0}")]
    InvalidConfig(String),

    /// Failed to read or parse the config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to write the config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Catalog Errors
    // =========================================================================
    /// No catalog path configured.
    #[error("No catalog file configured")]
    CatalogNotConfigured,

    /// Catalog file could not be read.
    #[error("Failed to read catalog: {0}")]
    CatalogLoadFailed(String),

    /// Catalog file read but invalid.
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(#[from] ValidationError),

    // =========================================================================
    // Session Errors
    // =========================================================================
    /// No open session with this id.
    #[error("Checkout session not found: {0}")]
    SessionNotFound(Uuid),

    /// A thread panicked while holding the session lock.
    #[error("Session registry lock poisoned")]
    LockPoisoned,

    // =========================================================================
    // Domain Errors
    // =========================================================================
    /// Rejected by the pricing / split engine.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<std::io::Error> for RegisterError {
    fn from(err: std::io::Error) -> Self {
        RegisterError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for RegisterError {
    fn from(err: toml::de::Error) -> Self {
        RegisterError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for RegisterError {
    fn from(err: toml::ser::Error) -> Self {
        RegisterError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// API Error
// =============================================================================

/// What the UI collaborator receives when a call fails.
///
/// ```json
/// {
///   "code": "PAYMENT_LOCKED",
///   "message": "Item assignment is locked after payment has started"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product, variation, cart line or session not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Mutation refused because a split payer has already paid
    PaymentLocked,

    /// Operation not valid in the current split state
    InvalidState,

    /// Cart operation failed
    CartError,

    /// Configuration or catalog file problem
    ConfigError,

    /// Internal error
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::TipLocked
            | CoreError::AssignmentLocked
            | CoreError::PayerCountChangeLocked
            | CoreError::PayerAlreadyPaid { .. }
            | CoreError::SplitLocked => ErrorCode::PaymentLocked,
            CoreError::SplitNotActive { .. } => ErrorCode::InvalidState,
            CoreError::InvalidQuantity { .. } | CoreError::EmptyCart => ErrorCode::CartError,
            CoreError::PayerIndexOutOfRange { .. }
            | CoreError::PayerCountOutOfRange { .. }
            | CoreError::Validation(_) => ErrorCode::ValidationError,
            CoreError::UnknownCartLine(_)
            | CoreError::ProductNotFound(_)
            | CoreError::VariationNotFound { .. } => ErrorCode::NotFound,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<RegisterError> for ApiError {
    fn from(err: RegisterError) -> Self {
        match err {
            RegisterError::Core(e) => e.into(),
            RegisterError::SessionNotFound(id) => {
                ApiError::not_found(format!("Checkout session not found: {}", id))
            }
            RegisterError::InvalidCatalog(e) => ApiError::validation(e.to_string()),
            RegisterError::LockPoisoned => {
                // Log the actual cause but return a generic message
                tracing::error!("Session registry lock poisoned");
                ApiError::internal("Register state unavailable")
            }
            e @ (RegisterError::InvalidConfig(_)
            | RegisterError::ConfigLoadFailed(_)
            | RegisterError::ConfigSaveFailed(_)
            | RegisterError::CatalogNotConfigured
            | RegisterError::CatalogLoadFailed(_)) => {
                ApiError::new(ErrorCode::ConfigError, e.to_string())
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
