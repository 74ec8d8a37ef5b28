//! # marknote-core
//!
//! Core library for the marknote sync tool.
//!
//! This crate turns a local Markdown file into the note service's strict
//! XML markup (rendering, metadata extraction, style inlining, embedded
//! media) and reconciles it against the remote service through the sync
//! engine, tracking the file-to-guid mapping in a local store.

pub mod assets;
pub mod config;
pub mod engine;
pub mod enml;
pub mod fsutil;
pub mod markdown;
pub mod metadata;
pub mod store;

pub use config::{Config, ConfigError, APP_NAME};
pub use engine::{PublishedNote, SyncEngine, SyncError};
pub use markdown::{MarkdownProcessor, RenderError, RenderOptions};
pub use metadata::{extract_metadata, NoteMetadata};
pub use store::{MappingStore, NoteRecord, StoreError};
