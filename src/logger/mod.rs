//! Process-wide `tracing` setup. Bootstraps at `info`, then
//! [`Logger::reload_from_config`] applies the `[log]` filter from settings.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
