//! Unpublish command implementation.

use anyhow::{bail, Result};
use std::path::Path;

use marknote_core::SyncEngine;

use super::tildify;

/// Remove a published note, or every note in a directory, from the remote
/// service.
pub async fn unpublish(work_dir: &Path, target: &Path) -> Result<()> {
    let engine = SyncEngine::new(work_dir);

    if target.is_dir() {
        let results = engine.unpublish_dir(target).await?;

        let mut failures = 0;
        let mut removed = 0;
        for (path, result) in &results {
            match result {
                Ok(note_path) => {
                    removed += 1;
                    println!("Unpublished note: {}", tildify(note_path));
                }
                Err(err) => {
                    failures += 1;
                    eprintln!("Failed to unpublish {}: {err}", tildify(path));
                }
            }
        }

        println!("Unpublished {removed} note(s).");
        if failures > 0 {
            bail!("{failures} note(s) failed to unpublish");
        }
        return Ok(());
    }

    if !target.exists() {
        bail!("{:?} does not exist", target);
    }

    let note_path = engine.unpublish_note(target).await?;
    println!("Unpublished note: {}", tildify(&note_path));
    Ok(())
}
