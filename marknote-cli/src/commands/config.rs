//! Config command implementation.

use anyhow::{bail, Context, Result};
use std::path::Path;

use marknote_core::Config;

/// Show or update workspace configuration.
pub fn config(work_dir: &Path, name: Option<&str>, value: Option<&str>) -> Result<()> {
    let mut config = Config::load(work_dir).context("Failed to load configuration")?;

    match (name, value) {
        (None, _) => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        (Some(name), None) => match config.get(name) {
            Some(value) => println!("{name}: {value}"),
            None => bail!("unknown config key: {name}"),
        },
        (Some(name), Some(value)) => {
            config.set(name, value)?;
            config.save()?;
            println!("Updated {name}");
        }
    }

    Ok(())
}
