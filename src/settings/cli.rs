use super::Parser;

#[derive(Parser, Debug)]
#[command(name = "mapsns", about = "Authentication API for the map SNS backend")]
pub struct Cli {
    /// Path of the settings file; defaults to `settings/dev.toml` in debug builds.
    #[arg(long)]
    pub settings: Option<String>,
}
