//! # marknote-client
//!
//! Typed client for the remote note service consumed by the sync engine.
//!
//! The service is treated as an opaque RPC surface: five calls, tagged
//! errors. [`NoteStore`] is the trait the engine programs against;
//! [`HttpNoteStore`] is the production implementation.

pub mod api;
pub mod error;
pub mod http;
pub mod models;

pub use api::NoteStore;
pub use error::{ClientError, ErrorCode};
pub use http::HttpNoteStore;
pub use models::{Note, NoteAttributes, NoteBuilder, Notebook, RemoteNote, Resource};
