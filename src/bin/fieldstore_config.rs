//! Print the resolved fieldstore configuration as JSON.
//!
//! Usage: fieldstore-config [FILE_OR_RESOURCE ...]
//! Without arguments the process-wide configuration (env + ~/.fieldstore.yaml)
//! is shown; with arguments the named files are loaded and merged in order.

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let settings = if args.is_empty() {
        fieldstore::config::get_config(false)?
    } else {
        fieldstore::config::load_files(&args)?
    };
    info!(target: "fieldstore", "resolved {} top-level settings from {} source(s)", settings.len(), args.len().max(1));
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}
