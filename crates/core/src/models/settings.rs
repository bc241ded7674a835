use serde::{Deserialize, Serialize};

/// Configuration passed into the tracker at construction; nothing here is
/// a process-wide singleton.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// The user's home/reporting currency (ISO code). All `*_base` values
    /// are denominated in this.
    pub base_currency: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_currency: "GBP".to_string(),
        }
    }
}

impl Settings {
    /// Currency codes must be exactly 3 ASCII letters; stored uppercased.
    pub fn with_base_currency(currency: &str) -> Result<Self, crate::errors::CoreError> {
        let trimmed = currency.trim().to_uppercase();
        if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(crate::errors::CoreError::ValidationError(format!(
                "Invalid currency code '{currency}': must be exactly 3 ASCII letters (e.g., GBP, USD, EUR)"
            )));
        }
        Ok(Self {
            base_currency: trimmed,
        })
    }
}
