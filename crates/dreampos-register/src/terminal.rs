//! # Register Terminal
//!
//! Everything one register process needs, wired once at startup.
//!
//! ## Startup Sequence
//! ```text
//! Register::start(path)
//!   │
//!   ├── 1. RegisterConfig::load     defaults → TOML → DREAMPOS_* env
//!   ├── 2. logging::init            RUST_LOG or [logging] level
//!   ├── 3. load_catalog             only if [catalog] path is set
//!   └── 4. SessionRegistry::new     [split] default_payer_count
//! ```

use std::path::PathBuf;

use dreampos_core::{CartItemKey, Catalog, Money};
use tracing::info;
use uuid::Uuid;

use crate::catalog::load_catalog;
use crate::config::RegisterConfig;
use crate::currency::CurrencyFormatter;
use crate::error::{RegisterError, RegisterResult};
use crate::logging;
use crate::registry::SessionRegistry;

/// A configured register terminal.
#[derive(Debug, Clone)]
pub struct Register {
    config: RegisterConfig,
    currency: CurrencyFormatter,
    catalog: Catalog,
    sessions: SessionRegistry,
}

impl Register {
    /// Loads config, installs logging and reads the catalog.
    pub fn start(config_path: Option<PathBuf>) -> RegisterResult<Self> {
        let config = RegisterConfig::load(config_path)?;
        logging::init(&config.logging);
        Self::from_config(config)
    }

    /// Builds a register from an already loaded config.
    ///
    /// With no catalog path configured the register starts with an empty
    /// catalog; use [`Register::with_catalog`] to supply one.
    pub fn from_config(config: RegisterConfig) -> RegisterResult<Self> {
        config.validate()?;
        let catalog = match config.catalog.path {
            Some(_) => load_catalog(&config)?,
            None => Catalog::default(),
        };

        info!(
            terminal = %config.terminal.name,
            currency = %config.currency.code,
            products = catalog.len(),
            "Register ready"
        );

        Ok(Register {
            currency: CurrencyFormatter::new(config.currency.clone())?,
            sessions: SessionRegistry::new(config.split.default_payer_count),
            config,
            catalog,
        })
    }

    /// Replaces the catalog.
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn config(&self) -> &RegisterConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn format(&self, amount: Money) -> String {
        self.currency.format(amount)
    }

    pub fn open_session(&self) -> RegisterResult<Uuid> {
        self.sessions.open()
    }

    /// Adds a catalog product to a session's cart by id and variation names.
    pub fn add_product(
        &self,
        session: Uuid,
        product_id: &str,
        variations: &[&str],
        qty: i64,
    ) -> RegisterResult<CartItemKey> {
        let (product, selection) = self
            .catalog
            .select(product_id, variations)
            .map_err(RegisterError::from)?;
        self.sessions
            .with_session_mut(session, |s| s.add_item(product, &selection, qty))
    }

    /// Formatted total of a session's cart.
    pub fn display_total(&self, session: Uuid) -> RegisterResult<String> {
        let total = self.sessions.with_session(session, |s| s.totals().total)?;
        Ok(self.format(total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dreampos_core::{CoreError, PaymentMethod, Product};

    fn register() -> Register {
        let catalog = Catalog::new(vec![
            Product::new("latte", Money::from_cents(450))
                .with_variation("Large", Money::from_cents(80)),
            Product::new("croissant", Money::from_cents(300)),
        ])
        .unwrap();
        Register::from_config(RegisterConfig::default())
            .unwrap()
            .with_catalog(catalog)
    }

    #[test]
    fn test_add_product_by_id() {
        let register = register();
        let id = register.open_session().unwrap();

        register.add_product(id, "latte", &["Large"], 2).unwrap();
        register.add_product(id, "croissant", &[], 1).unwrap();

        assert_eq!(register.display_total(id).unwrap(), "$13.60");
    }

    #[test]
    fn test_unknown_product_or_variation() {
        let register = register();
        let id = register.open_session().unwrap();

        assert!(matches!(
            register.add_product(id, "bagel", &[], 1),
            Err(RegisterError::Core(CoreError::ProductNotFound(_)))
        ));
        assert!(matches!(
            register.add_product(id, "latte", &["Huge"], 1),
            Err(RegisterError::Core(CoreError::VariationNotFound { .. }))
        ));
    }

    #[test]
    fn test_split_checkout_through_register() {
        let register = register();
        let id = register.open_session().unwrap();
        register.add_product(id, "croissant", &[], 3).unwrap();

        let sessions = register.sessions();
        sessions.with_session_mut(id, |s| s.enable_split()).unwrap();
        sessions
            .with_session_mut(id, |s| s.set_payment_method(2, PaymentMethod::Card))
            .unwrap();
        assert!(sessions.with_session_mut(id, |s| s.mark_paid(1)).unwrap().is_none());

        let receipt = sessions
            .with_session_mut(id, |s| s.mark_paid(2))
            .unwrap()
            .unwrap();
        assert_eq!(receipt.payments.len(), 2);
        assert_eq!(register.format(receipt.total_collected), "$9.00");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = RegisterConfig::default();
        config.split.default_payer_count = 0;
        assert!(matches!(
            Register::from_config(config),
            Err(RegisterError::InvalidConfig(_))
        ));
    }
}
