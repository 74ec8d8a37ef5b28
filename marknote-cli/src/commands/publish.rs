//! Publish command implementation.

use anyhow::{bail, Result};
use std::path::Path;

use marknote_core::SyncEngine;

use super::tildify;

/// Publish a note file, or every note in a directory.
pub async fn publish(work_dir: &Path, target: &Path) -> Result<()> {
    let engine = SyncEngine::new(work_dir);

    if target.is_dir() {
        let results = engine.publish_dir(target).await?;

        let mut failures = 0;
        let mut published = 0;
        for (path, result) in &results {
            match result {
                Ok(note) => {
                    published += 1;
                    println!("Published note: {}", tildify(&note.absolute_path));
                }
                Err(err) => {
                    failures += 1;
                    eprintln!("Failed to publish {}: {err}", tildify(path));
                }
            }
        }

        println!("Published {published} note(s).");
        if failures > 0 {
            bail!("{failures} note(s) failed to publish");
        }
        return Ok(());
    }

    if !target.exists() {
        bail!("{:?} does not exist", target);
    }

    let note = engine.publish_note(target).await?;
    println!("Published note: {}", tildify(&note.absolute_path));
    Ok(())
}
