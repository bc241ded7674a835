pub mod traits;

// Gateway implementations
pub mod frankfurter;
pub mod yahoo;
