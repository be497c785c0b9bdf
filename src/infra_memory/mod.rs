mod manual_clock;
mod token_store_memory;
mod user_repo_memory;

pub use manual_clock::*;
pub use token_store_memory::*;
pub use user_repo_memory::*;
