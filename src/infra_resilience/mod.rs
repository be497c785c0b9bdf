mod resilient_token_store;
mod store_breaker;

pub use resilient_token_store::*;
pub use store_breaker::*;
