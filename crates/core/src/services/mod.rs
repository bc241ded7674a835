pub mod ledger;
pub mod valuation;
