pub mod security;
pub mod settings;
pub mod transaction;
pub mod valuation;
