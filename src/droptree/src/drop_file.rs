//! Drop file documents
//!
//! A drop file is a JSON object whose `Container` key holds the root of the
//! drop tree. Other top-level keys are preserved as-is.

use crate::container::{Container, Extra, MalformedTreeError};
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DropFileError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("top-level value is not a JSON object")]
    NotAnObject,

    #[error(transparent)]
    Malformed(#[from] MalformedTreeError),
}

impl DropFileError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        DropFileError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Parsed drop file
#[derive(Debug, Clone, PartialEq)]
pub struct DropFile {
    /// `None` when the document has no `Container` key
    pub container: Option<Container>,
    /// Top-level keys other than `Container`
    pub extra: Extra,
}

impl DropFile {
    pub fn new(container: Container) -> Self {
        Self {
            container: Some(container),
            extra: Extra::new(),
        }
    }

    pub fn from_value(value: &Value) -> Result<Self, DropFileError> {
        let obj = value.as_object().ok_or(DropFileError::NotAnObject)?;

        let container = match obj.get("Container") {
            None | Some(Value::Null) => None,
            Some(root) => Some(Container::from_value(root)?),
        };

        let extra = obj
            .iter()
            .filter(|(key, _)| key.as_str() != "Container")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Self { container, extra })
    }

    pub fn from_json(json: &str) -> Result<Self, DropFileError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        if let Some(container) = &self.container {
            obj.insert("Container".into(), container.to_value());
        }
        for (key, value) in &self.extra {
            obj.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Value::Object(obj)
    }

    /// Pretty JSON with 2-space indentation, non-ASCII written as-is
    pub fn to_json(&self) -> Result<String, DropFileError> {
        Ok(serde_json::to_string_pretty(&self.to_value())?)
    }

    pub fn load(path: &Path) -> Result<Self, DropFileError> {
        let json = fs::read_to_string(path).map_err(|e| DropFileError::io(path, e))?;
        Self::from_json(&json)
    }

    /// Write next to `path` and rename over it, so readers never see a
    /// partial file
    pub fn save_atomic(&self, path: &Path) -> Result<(), DropFileError> {
        let json = self.to_json()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| DropFileError::io(dir, e))?;
        temp.write_all(json.as_bytes())
            .map_err(|e| DropFileError::io(temp.path(), e))?;
        temp.persist(path)
            .map_err(|e| DropFileError::io(path, e.error))?;

        Ok(())
    }
}
