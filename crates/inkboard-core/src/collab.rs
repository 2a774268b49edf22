//! Boundaries to collaborators outside the engine.
//!
//! Uploads, card content and rich-text rendering live in the host
//! application; the engine only sees these traits.

use crate::storage::BoxFuture;
use serde_json::Value;
use thiserror::Error;

/// Errors reported by collaborators.
#[derive(Debug, Error)]
pub enum CollabError {
    #[error("Upload failed: {0}")]
    Upload(String),
    #[error("Unknown card: {0}")]
    UnknownCard(String),
    #[error("Collaborator error: {0}")]
    Other(String),
}

/// Bytes pasted or dropped onto the board.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ResourceFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }

    pub fn is_video(&self) -> bool {
        self.mime.starts_with("video/")
    }
}

/// Turns uploaded bytes into a URL elements can reference.
pub trait ResourceUploader {
    fn upload_resource(&self, file: &ResourceFile) -> BoxFuture<'_, Result<String, CollabError>>;
}

/// Source of card content.
pub trait CardStore {
    fn get_card_by_id(&self, id: &str) -> Option<Value>;
    fn update_card(&self, id: &str, content: Value) -> Result<(), CollabError>;
}

/// Renders an editor document to markup.
pub trait ContentRenderer {
    fn render(&self, content: &Value, readonly: bool) -> String;
}
