//! The persisted project shape: `{ pages, config }` as JSON.

use crate::error::CoreError;
use crate::id::PageId;
use crate::model::{CanvasConfig, Page, SCHEMA_VERSION, page_title};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDocument {
    pub pages: Vec<Page>,
    #[serde(default)]
    pub config: CanvasConfig,
}

impl Default for ProjectDocument {
    /// A single blank page.
    fn default() -> Self {
        Self {
            pages: vec![Page::new(PageId::generate(), page_title(1))],
            config: CanvasConfig::default(),
        }
    }
}

impl ProjectDocument {
    pub fn to_json(&self) -> Result<serde_json::Value, CoreError> {
        let mut doc = self.clone();
        doc.config.version = SCHEMA_VERSION;
        Ok(serde_json::to_value(&doc)?)
    }

    pub fn to_json_string(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(&self.to_json()?)?)
    }

    /// Decode a stored project.
    ///
    /// Unknown fields are ignored and missing ones take their defaults, so
    /// older projects load as-is. Projects written by a newer schema load
    /// best-effort with a warning.
    pub fn from_json(value: serde_json::Value) -> Result<Self, CoreError> {
        let doc: ProjectDocument = serde_json::from_value(value)?;
        if doc.config.version > SCHEMA_VERSION {
            log::warn!(
                "project schema v{} is newer than supported v{}; loading best-effort",
                doc.config.version,
                SCHEMA_VERSION
            );
        }
        Ok(doc)
    }

    pub fn from_json_str(s: &str) -> Result<Self, CoreError> {
        Self::from_json(serde_json::from_str(s)?)
    }

    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }
}
