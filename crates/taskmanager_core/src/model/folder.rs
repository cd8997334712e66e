//! Folder domain model.

use crate::model::task::ValidationError;
use serde::{Deserialize, Serialize};

/// Store-assigned folder identifier. `0` means "not persisted yet".
pub type FolderId = i64;

/// One row of the `folders` table; groups tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    /// Packed ARGB color chosen in the UI, if any.
    pub color: Option<i32>,
}

impl Folder {
    /// Creates an unsaved folder without a color.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            color: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankText("name"));
        }
        Ok(())
    }
}
