//! New-note command implementation.

use anyhow::Result;
use std::path::Path;

use marknote_core::SyncEngine;

use super::tildify;

/// Create a new local note file in the workspace.
pub async fn new_note(work_dir: &Path, title: &str) -> Result<()> {
    let engine = SyncEngine::new(work_dir);
    let path = engine.create_local_note(title).await?;
    println!("Created local note: {}", tildify(&path));
    Ok(())
}
