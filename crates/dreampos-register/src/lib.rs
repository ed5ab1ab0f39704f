//! # dreampos-register: Terminal Service Layer
//!
//! The thin layer between a register's UI and the pure engine in
//! `dreampos-core`: configuration, logging, catalog loading, currency display
//! and the registry of open checkout sessions.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Register Components                                  │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Register (terminal)                         │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │          │                 │                  │               │         │
//! │          ▼                 ▼                  ▼               ▼         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  ┌────────────┐  │
//! │  │RegisterConfig│  │   Catalog    │  │SessionRegistry│ │ Currency   │  │
//! │  │ TOML + env   │  │  JSON file   │  │ Arc<Mutex<>> │  │ Formatter  │  │
//! │  └──────────────┘  └──────────────┘  └──────────────┘  └────────────┘  │
//! │                                                                         │
//! │  Failures: RegisterError internally, ApiError {code, message} outward  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod config;
pub mod currency;
pub mod error;
pub mod logging;
pub mod registry;
pub mod terminal;

pub use catalog::{load_catalog, load_catalog_file};
pub use config::RegisterConfig;
pub use currency::CurrencyFormatter;
pub use error::{ApiError, ErrorCode, RegisterError, RegisterResult};
pub use registry::SessionRegistry;
pub use terminal::Register;
