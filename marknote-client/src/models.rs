//! Value structs exchanged with the note service.
//!
//! Notes are built fully before being handed to the client; the builder is
//! the only way to construct one.

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

/// Application attributes stamped on every published note.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NoteAttributes {
    pub source: String,
    pub source_application: String,
    /// Marks the note as owned by this tool; the service renders it
    /// read-only in its editors.
    pub content_class: String,
}

impl NoteAttributes {
    pub fn for_app(app: &str) -> Self {
        Self {
            source: app.to_string(),
            source_application: app.to_string(),
            content_class: app.to_string(),
        }
    }
}

/// A binary attachment embedded in a note body.
///
/// Identity is content-addressed: the hex MD5 of the body is both the
/// integrity hash the service verifies and the reference the markup's
/// embedded-media elements point at.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub mime: String,
    pub body: Vec<u8>,
    pub body_hash: String,
    pub size: u64,
}

impl Resource {
    pub fn new(mime: impl Into<String>, body: Vec<u8>) -> Self {
        let mut hasher = Md5::new();
        hasher.update(&body);
        let body_hash = format!("{:x}", hasher.finalize());
        let size = body.len() as u64;

        Self {
            mime: mime.into(),
            body,
            body_hash,
            size,
        }
    }
}

/// A notebook as listed or created remotely.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notebook {
    pub guid: String,
    pub name: String,
}

/// A note as sent to the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Absent on create; required on update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,

    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notebook_guid: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_names: Option<Vec<String>>,

    /// The full markup document body.
    pub content: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,

    pub attributes: NoteAttributes,
}

impl Note {
    pub fn builder(title: impl Into<String>) -> NoteBuilder {
        NoteBuilder {
            title: title.into(),
            notebook_guid: None,
            tag_names: None,
            content: String::new(),
            resources: Vec::new(),
            attributes: NoteAttributes::default(),
        }
    }

    /// The same note addressed at an existing remote guid.
    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        self.guid = Some(guid.into());
        self
    }
}

/// Builder for [`Note`].
#[derive(Debug, Clone)]
pub struct NoteBuilder {
    title: String,
    notebook_guid: Option<String>,
    tag_names: Option<Vec<String>>,
    content: String,
    resources: Vec<Resource>,
    attributes: NoteAttributes,
}

impl NoteBuilder {
    pub fn notebook_guid(mut self, guid: impl Into<String>) -> Self {
        self.notebook_guid = Some(guid.into());
        self
    }

    pub fn tag_names(mut self, tags: Vec<String>) -> Self {
        self.tag_names = Some(tags);
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn resources(mut self, resources: Vec<Resource>) -> Self {
        self.resources = resources;
        self
    }

    pub fn attributes(mut self, attributes: NoteAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn build(self) -> Note {
        Note {
            guid: None,
            title: self.title,
            notebook_guid: self.notebook_guid,
            tag_names: self.tag_names,
            content: self.content,
            resources: self.resources,
            attributes: self.attributes,
        }
    }
}

/// A note as the service reports it back after create/update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteNote {
    pub guid: String,
    pub title: String,

    #[serde(default)]
    pub update_sequence_num: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_is_content_addressed() {
        let resource = Resource::new("image/png", b"hello".to_vec());
        // Independently computed: md5("hello")
        assert_eq!(resource.body_hash, "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(resource.size, 5);
        assert_eq!(resource.mime, "image/png");
    }

    #[test]
    fn builder_produces_guidless_note() {
        let note = Note::builder("Weekly report")
            .notebook_guid("nb-1")
            .tag_names(vec!["work".into()])
            .content("<en-note/>")
            .attributes(NoteAttributes::for_app("marknote"))
            .build();

        assert_eq!(note.guid, None);
        assert_eq!(note.title, "Weekly report");
        assert_eq!(note.notebook_guid.as_deref(), Some("nb-1"));
        assert_eq!(note.attributes.source, "marknote");

        let updated = note.with_guid("abc");
        assert_eq!(updated.guid.as_deref(), Some("abc"));
    }
}
