//! # Currency Display
//!
//! Turns integer minor units into the string a cashier sees. Formatting only;
//! no arithmetic happens here.
//!
//! ```text
//! cents   decimals  placement  separator   →  display
//! 1234    2         prefix     "."            $12.34
//! -1234   2         prefix     "."            -$12.34
//! 1234    2         suffix     ","            12,34 €
//! 1234    0         prefix     -              ¥1234
//! ```

use dreampos_core::Money;

use crate::config::{CurrencyConfig, SymbolPlacement};
use crate::error::RegisterResult;

/// Formats `Money` according to a `[currency]` config section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyFormatter {
    config: CurrencyConfig,
}

impl CurrencyFormatter {
    /// Fails with `InvalidConfig` for more than `MAX_CURRENCY_DECIMALS`
    /// fraction digits or a missing decimal separator.
    pub fn new(config: CurrencyConfig) -> RegisterResult<Self> {
        config.validate()?;
        Ok(CurrencyFormatter { config })
    }

    pub fn code(&self) -> &str {
        &self.config.code
    }

    /// ```rust
    /// use dreampos_core::Money;
    /// use dreampos_register::config::CurrencyConfig;
    /// use dreampos_register::currency::CurrencyFormatter;
    ///
    /// let usd = CurrencyFormatter::new(CurrencyConfig::default()).unwrap();
    /// assert_eq!(usd.format(Money::from_cents(1234)), "$12.34");
    /// assert_eq!(usd.format(Money::from_cents(-5)), "-$0.05");
    /// ```
    pub fn format(&self, amount: Money) -> String {
        let cents = amount.cents();
        let sign = if cents < 0 { "-" } else { "" };
        let number = self.format_number(cents.unsigned_abs());

        match self.config.placement {
            SymbolPlacement::Prefix => format!("{}{}{}", sign, self.config.symbol, number),
            SymbolPlacement::Suffix => format!("{}{} {}", sign, number, self.config.symbol),
        }
    }

    /// Amount without symbol or sign.
    fn format_number(&self, minor_units: u64) -> String {
        let decimals = self.config.decimals as u32;
        if decimals == 0 {
            return minor_units.to_string();
        }

        let divisor = 10_u64.pow(decimals);
        format!(
            "{}{}{:0width$}",
            minor_units / divisor,
            self.config.decimal_separator,
            minor_units % divisor,
            width = decimals as usize
        )
    }
}

impl Default for CurrencyFormatter {
    fn default() -> Self {
        CurrencyFormatter {
            config: CurrencyConfig::default(),
        }
    }
}
