//! Startup configuration: a TOML file selected by `--settings`, plus the
//! `JWT_SECRET_KEY` environment variable read by the server.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
