//! The sync engine: create-or-update reconciliation between local markdown
//! files and the remote note service.
//!
//! One engine per workspace. It owns the config, the remote client, and the
//! mapping store as fields; the latter two are created lazily on first use.
//! Directory operations fan out per file, but every store mutation is
//! serialized through one async mutex; the store's load/mutate/save cycle
//! is not safe under concurrent saves.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use once_cell::sync::OnceCell;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use marknote_client::{
    ClientError, HttpNoteStore, Note, NoteAttributes, NoteStore, Notebook, RemoteNote,
};

use crate::assets::{self, AssetContext, AssetError};
use crate::config::{Config, ConfigError, APP_NAME};
use crate::enml;
use crate::fsutil;
use crate::markdown::{MarkdownProcessor, RenderError, RenderOptions};
use crate::metadata::{self, NoteMetadata};
use crate::store::{MappingStore, StoreError};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("{path:?} does not exist")]
    NoteNotFound { path: PathBuf },

    #[error("{path:?} is not a published note")]
    NotPublished { path: PathBuf },

    #[error("failed to access {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Remote(#[from] ClientError),
}

/// A successfully published note, as reported back to the caller.
#[derive(Debug, Clone)]
pub struct PublishedNote {
    pub guid: String,
    pub title: String,
    pub absolute_path: PathBuf,
}

pub struct SyncEngine {
    work_dir: PathBuf,
    processor: MarkdownProcessor,
    config: OnceCell<Config>,
    client: OnceCell<Arc<dyn NoteStore>>,
    store: OnceCell<Mutex<MappingStore>>,
    notebook_lock: Mutex<()>,
}

impl SyncEngine {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            processor: MarkdownProcessor::new(),
            config: OnceCell::new(),
            client: OnceCell::new(),
            store: OnceCell::new(),
            notebook_lock: Mutex::new(()),
        }
    }

    /// Engine with an injected client; config discovery and the mapping
    /// store still come from `work_dir`.
    pub fn with_client(work_dir: impl Into<PathBuf>, client: Arc<dyn NoteStore>) -> Self {
        let engine = Self::new(work_dir);
        let _ = engine.client.set(client);
        engine
    }

    fn config(&self) -> Result<&Config, SyncError> {
        self.config
            .get_or_try_init(|| Config::load(&self.work_dir))
            .map_err(Into::into)
    }

    fn client(&self) -> Result<&Arc<dyn NoteStore>, SyncError> {
        self.client.get_or_try_init(|| {
            let config = self.config()?;
            let client = HttpNoteStore::new(&config.endpoint, &config.token)?;
            Ok::<_, SyncError>(Arc::new(client) as Arc<dyn NoteStore>)
        })
    }

    fn store(&self) -> Result<&Mutex<MappingStore>, SyncError> {
        self.store.get_or_try_init(|| {
            let config = self.config()?;
            Ok::<_, SyncError>(Mutex::new(MappingStore::open(config.db_path())?))
        })
    }

    /// Create `notes/<sanitized-title>.md` with a heading stub, appending a
    /// numeric suffix when the name is taken.
    pub async fn create_local_note(&self, title: &str) -> Result<PathBuf, SyncError> {
        let config = self.config()?;
        let notes_dir = config.notes_dir();
        tokio::fs::create_dir_all(&notes_dir)
            .await
            .map_err(|source| SyncError::Io {
                path: notes_dir.clone(),
                source,
            })?;

        let filename = fsutil::sanitize_title(title);
        let note_path = fsutil::unique_path(&notes_dir.join(format!("{filename}.md"))).map_err(
            |source| SyncError::Io {
                path: notes_dir.clone(),
                source,
            },
        )?;

        tokio::fs::write(&note_path, format!("# {title}\n"))
            .await
            .map_err(|source| SyncError::Io {
                path: note_path.clone(),
                source,
            })?;

        info!(path = ?note_path, "created local note");
        Ok(note_path)
    }

    /// Publish one file: render, resolve metadata, and reconcile against
    /// the remote service.
    pub async fn publish_note(&self, note_path: &Path) -> Result<PublishedNote, SyncError> {
        let content = match tokio::fs::read_to_string(note_path).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(SyncError::NoteNotFound {
                    path: note_path.to_path_buf(),
                })
            }
            Err(source) => {
                return Err(SyncError::Io {
                    path: note_path.to_path_buf(),
                    source,
                })
            }
        };

        self.save_note(note_path, &content).await
    }

    /// Publish every `.md` file directly inside `dir`, concurrently.
    ///
    /// Results are per-file; one failure never blocks or rolls back the
    /// others.
    pub async fn publish_dir(
        &self,
        dir: &Path,
    ) -> Result<Vec<(PathBuf, Result<PublishedNote, SyncError>)>, SyncError> {
        let files = markdown_files(dir)?;
        let results = join_all(files.iter().map(|file| self.publish_note(file))).await;
        Ok(files.into_iter().zip(results).collect())
    }

    /// Remove a published note from the remote service and drop its
    /// mapping record.
    pub async fn unpublish_note(&self, note_path: &Path) -> Result<PathBuf, SyncError> {
        let config = self.config()?;
        let (absolute_path, relative_path) = self.note_path_info(note_path)?;
        let store = self.store()?;

        let guid = {
            let store = store.lock().await;
            store.find_by_path(&relative_path).map(|r| r.guid.clone())
        }
        .ok_or_else(|| SyncError::NotPublished {
            path: note_path.to_path_buf(),
        })?;

        match self.client()?.expunge_note(&guid).await {
            Ok(count) => debug!(%guid, count, "expunged remote note"),
            Err(err) if err.is_not_found() && config.force_unpublish => {
                debug!(%guid, "remote note already gone; removing mapping anyway");
            }
            Err(err) => return Err(err.into()),
        }

        {
            let mut store = store.lock().await;
            store.remove(&relative_path);
            store.save()?;
        }

        info!(path = %relative_path, "unpublished note");
        Ok(absolute_path)
    }

    /// Unpublish every `.md` file directly inside `dir`, concurrently.
    pub async fn unpublish_dir(
        &self,
        dir: &Path,
    ) -> Result<Vec<(PathBuf, Result<PathBuf, SyncError>)>, SyncError> {
        let files = markdown_files(dir)?;
        let results = join_all(files.iter().map(|file| self.unpublish_note(file))).await;
        Ok(files.into_iter().zip(results).collect())
    }

    async fn save_note(
        &self,
        note_path: &Path,
        content: &str,
    ) -> Result<PublishedNote, SyncError> {
        let config = self.config()?;
        let (absolute_path, relative_path) = self.note_path_info(note_path)?;

        let opts = RenderOptions {
            highlight_theme: config.highlight.clone(),
        };
        let events = self.processor.render(content, &opts)?;
        let meta = metadata::extract_metadata(&events);
        debug!(
            title = %meta.title,
            notebook = ?meta.notebook_name,
            tags = ?meta.tag_names,
            "extracted note metadata"
        );

        let note = self.build_note(&meta, &events, config).await?;
        self.reconcile(note, absolute_path, relative_path).await
    }

    /// Assemble the full note value: markup body, resources, notebook and
    /// tags.
    async fn build_note(
        &self,
        meta: &NoteMetadata,
        events: &[pulldown_cmark::Event<'static>],
        config: &Config,
    ) -> Result<Note, SyncError> {
        let mut builder = Note::builder(&meta.title).attributes(NoteAttributes::for_app(APP_NAME));

        if let Some(tags) = meta.tag_names.clone().filter(|tags| !tags.is_empty()) {
            builder = builder.tag_names(tags);
        }
        if let Some(name) = &meta.notebook_name {
            let notebook = self.resolve_notebook(name).await?;
            builder = builder.notebook_guid(notebook.guid);
        }

        let ctx = AssetContext {
            notes_dir: config.notes_dir(),
            mermaid_command: config.mermaid.clone(),
        };

        let body = MarkdownProcessor::to_html(events);
        let body = assets::render_diagrams(&body, &ctx).await?;
        let body = assets::render_math(&body, &ctx)?;
        let body = enml::apply_theme(&body);
        let (body, resources) = assets::attach_images(&body, &ctx)?;

        Ok(builder
            .content(enml::wrap_document(&body))
            .resources(resources)
            .build())
    }

    /// Create-or-update against the mapping store, with the one-shot
    /// stale-guid fallback: an update rejected with `ObjectNotFound` falls
    /// back to a create and overwrites the record's guid in place.
    async fn reconcile(
        &self,
        note: Note,
        absolute_path: PathBuf,
        relative_path: String,
    ) -> Result<PublishedNote, SyncError> {
        let client = self.client()?;
        let store = self.store()?;

        let existing_guid = {
            let store = store.lock().await;
            store.find_by_path(&relative_path).map(|r| r.guid.clone())
        };

        let mut stale_guid = false;
        if let Some(guid) = existing_guid {
            let update = note.clone().with_guid(guid.as_str());
            match client.update_note(&update).await {
                Ok(remote) => {
                    info!(path = %relative_path, guid = %remote.guid, "updated note");
                    return Ok(published(remote, absolute_path));
                }
                Err(err) if err.is_not_found() => {
                    debug!(path = %relative_path, %guid, "remote note vanished; recreating");
                    stale_guid = true;
                }
                Err(err) => return Err(err.into()),
            }
        }

        let created = client.create_note(&note).await?;
        {
            let mut store = store.lock().await;
            if stale_guid {
                store.update_guid(&relative_path, &created.guid);
            } else {
                store.insert(&created.guid, &relative_path)?;
            }
            store.save()?;
        }

        info!(path = %relative_path, guid = %created.guid, "created note");
        Ok(published(created, absolute_path))
    }

    /// Look up a notebook by exact name, creating it on demand.
    ///
    /// Serialized so concurrent first-time publishes cannot both miss the
    /// existence check and create duplicates.
    async fn resolve_notebook(&self, name: &str) -> Result<Notebook, SyncError> {
        let client = self.client()?;
        let _guard = self.notebook_lock.lock().await;

        let notebooks = client.list_notebooks().await?;
        if let Some(existing) = notebooks.into_iter().find(|nb| nb.name == name) {
            return Ok(existing);
        }

        debug!(%name, "creating notebook");
        Ok(client.create_notebook(name).await?)
    }

    /// Absolute path plus workspace-relative path (forward slashes) for a
    /// note file.
    fn note_path_info(&self, note_path: &Path) -> Result<(PathBuf, String), SyncError> {
        let config = self.config()?;

        let absolute = if note_path.is_absolute() {
            note_path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|source| SyncError::Io {
                    path: note_path.to_path_buf(),
                    source,
                })?
                .join(note_path)
        };
        let absolute = fsutil::normalize(&absolute);

        let relative = fsutil::relative_to(config.config_dir(), &absolute);
        let relative = relative.to_string_lossy().replace('\\', "/");

        debug!(absolute = ?absolute, relative = %relative, "resolved note path");
        Ok((absolute, relative))
    }
}

fn published(remote: RemoteNote, absolute_path: PathBuf) -> PublishedNote {
    PublishedNote {
        guid: remote.guid,
        title: remote.title,
        absolute_path,
    }
}

/// The `.md` files directly inside `dir`, sorted for stable batch output.
fn markdown_files(dir: &Path) -> Result<Vec<PathBuf>, SyncError> {
    let entries = std::fs::read_dir(dir).map_err(|source| SyncError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| SyncError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some("md") {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn markdown_files_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.md"), "x").unwrap();
        std::fs::write(dir.path().join("a.md"), "x").unwrap();
        std::fs::write(dir.path().join("c.txt"), "x").unwrap();
        std::fs::create_dir(dir.path().join("sub.md")).unwrap();

        let files = markdown_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.md", "b.md"]);
    }
}
