//! The remote surface the sync engine programs against.

use async_trait::async_trait;

use crate::error::ClientError;
use crate::models::{Note, Notebook, RemoteNote};

/// Minimal note-service API consumed by the sync engine.
///
/// Implementations must be cheap to share behind an `Arc`; the engine holds
/// one instance for its whole lifetime and calls it from concurrent
/// per-file tasks.
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn list_notebooks(&self) -> Result<Vec<Notebook>, ClientError>;

    async fn create_notebook(&self, name: &str) -> Result<Notebook, ClientError>;

    async fn create_note(&self, note: &Note) -> Result<RemoteNote, ClientError>;

    /// Update the note addressed by `note.guid`.
    ///
    /// Fails with `ObjectNotFound` when the guid no longer refers to a live
    /// note; the engine's stale-guid recovery depends on that tag.
    async fn update_note(&self, note: &Note) -> Result<RemoteNote, ClientError>;

    /// Permanently delete a note, returning the service's expunge count.
    async fn expunge_note(&self, guid: &str) -> Result<u64, ClientError>;
}
