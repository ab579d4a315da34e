// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const REQUEST_REJECTED: &str = "gateway.request.rejected";
pub const OPERATION: &str = "gateway.operation";
pub const STORE_FAILURE: &str = "store.failure";
