//! # Documents
//!
//! Persist one or more models to a single JSON file.
//!
//! ```json
//! {
//!   "header": { "applicationType": "arbor", "version": "1", "savedAt": "2024-05-01T10:00:00+00:00" },
//!   "models": [ { "name": "Model", "attributes": { "type": "SampleModel" }, "children": [ ... ] } ]
//! }
//! ```
//!
//! Loading is all or nothing: every model in the file is converted and
//! checked before the first one is replaced.

use crate::converter::{ConverterMode, ItemConverter, StructuredNode};
use crate::error::{StoreError, StoreResult};
use crate::model::Model;
use arbor_common::{FileSystem, RealFileSystem};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

pub const DOCUMENT_VERSION: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentHeader {
    pub application_type: String,
    pub version: String,
    pub saved_at: String,
}

impl DocumentHeader {
    pub fn saved_at(&self) -> StoreResult<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.saved_at)
            .map_err(|err| StoreError::malformed(format!("invalid savedAt '{}': {}", self.saved_at, err)))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct DocumentFile {
    header: DocumentHeader,
    models: Vec<StructuredNode>,
}

/// Models saved and loaded together
pub struct ModelDocument<'a, F: FileSystem = RealFileSystem> {
    application_type: String,
    models: Vec<&'a mut Model>,
    fs: F,
}

impl<'a> ModelDocument<'a, RealFileSystem> {
    pub fn new(application_type: impl Into<String>, models: Vec<&'a mut Model>) -> Self {
        Self::with_file_system(application_type, models, RealFileSystem)
    }
}

impl<'a, F: FileSystem> ModelDocument<'a, F> {
    pub fn with_file_system(application_type: impl Into<String>, models: Vec<&'a mut Model>, fs: F) -> Self {
        Self {
            application_type: application_type.into(),
            models,
            fs,
        }
    }

    pub fn application_type(&self) -> &str {
        &self.application_type
    }

    pub fn file_system(&self) -> &F {
        &self.fs
    }

    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.iter().map(|model| &**model)
    }

    /// Whether any model changed since the last save or load
    pub fn is_modified(&self) -> bool {
        self.models
            .iter()
            .any(|model| model.command_stack().is_some_and(|stack| !stack.is_clean()))
    }

    pub fn save(&mut self, path: impl AsRef<Path>) -> StoreResult<()> {
        let path = path.as_ref();
        let mut models = Vec::with_capacity(self.models.len());
        for model in &self.models {
            let converter = ItemConverter::new(model.factory(), ConverterMode::Clone);
            models.push(converter.model_to_structured(model)?);
        }
        let file = DocumentFile {
            header: DocumentHeader {
                application_type: self.application_type.clone(),
                version: DOCUMENT_VERSION.to_string(),
                saved_at: Utc::now().to_rfc3339(),
            },
            models,
        };
        let json = serde_json::to_string_pretty(&file)?;
        self.fs.write(path, &json)?;

        for model in self.models.iter_mut() {
            model.set_clean()?;
        }
        info!(path = %path.display(), models = self.models.len(), "document saved");
        Ok(())
    }

    /// Replace every model's tree with the one stored at `path`
    pub fn load(&mut self, path: impl AsRef<Path>) -> StoreResult<DocumentHeader> {
        let path = path.as_ref();
        let content = self.fs.read_to_string(path)?;
        let file: DocumentFile = serde_json::from_str(&content)?;

        if file.header.application_type != self.application_type {
            return Err(StoreError::ApplicationMismatch {
                expected: self.application_type.clone(),
                found: file.header.application_type,
            });
        }
        if file.header.version != DOCUMENT_VERSION {
            return Err(StoreError::malformed(format!(
                "unsupported document version '{}'",
                file.header.version
            )));
        }
        file.header.saved_at()?;
        if file.models.len() != self.models.len() {
            return Err(StoreError::ModelCountMismatch {
                expected: self.models.len(),
                found: file.models.len(),
            });
        }

        let mut roots = Vec::with_capacity(file.models.len());
        for (model, node) in self.models.iter().zip(&file.models) {
            let converter = ItemConverter::new(model.factory(), ConverterMode::Clone);
            let (model_type, root) = converter.model_from_structured(node)?;
            if model_type != model.model_type() {
                return Err(StoreError::ModelTypeMismatch {
                    expected: model.model_type().to_string(),
                    found: model_type,
                });
            }
            model.tree().validate_root(&root)?;
            roots.push(root);
        }
        for (model, root) in self.models.iter_mut().zip(roots) {
            model.replace_root(root)?;
            model.set_clean()?;
            debug!(model_type = %model.model_type(), items = model.len(), "model loaded");
        }
        info!(path = %path.display(), saved_at = %file.header.saved_at, "document loaded");
        Ok(file.header)
    }
}
