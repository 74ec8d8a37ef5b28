//! Init command implementation.

use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use marknote_core::Config;

/// Initialize a new marknote workspace.
pub fn init(
    destination: Option<&Path>,
    token: Option<String>,
    endpoint: Option<String>,
) -> Result<()> {
    let root = destination.unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(root).with_context(|| format!("Failed to create {:?}", root))?;

    let mut template = Config::template();
    let token = match token {
        Some(token) => token,
        None => prompt("Developer token: ")?,
    };
    if !token.is_empty() {
        template.token = token;
    }

    let endpoint = match endpoint {
        Some(endpoint) => endpoint,
        None => prompt("Service endpoint: ")?,
    };
    if !endpoint.is_empty() {
        template.endpoint = endpoint;
    }

    let config_path = Config::init(root, template).context("Failed to initialize workspace")?;

    println!("Initialized marknote workspace at {:?}", config_path);
    println!("  - Write notes in notes/ and run `marknote publish notes/<file>.md`");
    println!("  - Adjust settings with `marknote config <name> <value>`");
    Ok(())
}

fn prompt(question: &str) -> Result<String> {
    print!("{question}");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}
