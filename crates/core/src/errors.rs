use thiserror::Error;

/// Unified error type for the entire portfolio-tracker-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Ledger / Business Logic ─────────────────────────────────────
    #[error("Unknown security: '{0}' does not resolve to any listed instrument")]
    UnknownSecurity(String),

    #[error("No open position in {0}: cannot sell a security that is not held")]
    NoSuchHolding(String),

    #[error("Portfolio is empty or has zero total value")]
    EmptyPortfolio,

    #[error("Transaction validation failed: {0}")]
    ValidationError(String),

    // ── Gateways / Network ──────────────────────────────────────────
    #[error("Gateway error ({gateway}): {message}")]
    Gateway {
        gateway: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid date '{0}' passed to the exchange-rate gateway")]
    InvalidDate(String),

    #[error("Price not available for {symbol} in {currency}")]
    PriceNotAvailable {
        symbol: String,
        currency: String,
    },

    // ── Store / File ────────────────────────────────────────────────
    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("Unsupported file version: {0}")]
    UnsupportedVersion(u16),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("File I/O error: {0}")]
    FileIO(String),

    #[error("Store error: {0}")]
    Store(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<bincode::Error> for CoreError {
    fn from(e: bincode::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Sanitize error message: strip query parameters from URLs so symbol
        // and currency-pair queries don't leak into logs verbatim.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
