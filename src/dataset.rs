//! Conversion dataset module
//!
//! Loads the conversion document once at startup and keeps it resident:
//! - Path resolution over an ordered candidate list
//! - JSON parsing with top-level shape recognition
//! - A pre-serialized response body shared by every request

use crate::logger;
use hyper::body::Bytes;
use serde_json::{Map, Value};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure to produce a dataset. Every variant is fatal at startup.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("conversion data not found (looked in: {})", display_paths(.candidates))]
    NotFound { candidates: Vec<PathBuf> },

    #[error("failed to read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Unparseable {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}: field `{field}` must be {expected}", .path.display())]
    Shape {
        path: PathBuf,
        field: &'static str,
        expected: &'static str,
    },
}

/// JSON type expected for a recognized top-level field
#[derive(Debug, Clone, Copy)]
enum FieldShape {
    String,
    Object,
    Array,
}

impl FieldShape {
    const fn describe(self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::Object => "an object",
            Self::Array => "an array",
        }
    }

    fn matches(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Null)
                | (Self::String, Value::String(_))
                | (Self::Object, Value::Object(_))
                | (Self::Array, Value::Array(_))
        )
    }
}

const RECOGNIZED_FIELDS: [(&str, FieldShape); 5] = [
    ("lastUpdated", FieldShape::String),
    ("dataSource", FieldShape::String),
    ("config", FieldShape::Object),
    ("programs", FieldShape::Object),
    ("conversions", FieldShape::Array),
];

/// The loaded conversion document
///
/// Values below the top level are never interpreted. Unknown top-level keys
/// are kept, and object key order survives re-serialization.
#[derive(Debug, Clone)]
pub struct Dataset {
    source: PathBuf,
    document: Map<String, Value>,
    body: Bytes,
}

impl Dataset {
    /// Parse a dataset from raw file contents
    pub fn from_slice(source: impl Into<PathBuf>, contents: &[u8]) -> Result<Self, DatasetError> {
        let path = source.into();
        let document: Map<String, Value> =
            serde_json::from_slice(contents).map_err(|source| DatasetError::Unparseable {
                path: path.clone(),
                source,
            })?;

        for (field, shape) in RECOGNIZED_FIELDS {
            if let Some(value) = document.get(field) {
                if !shape.matches(value) {
                    return Err(DatasetError::Shape {
                        path,
                        field,
                        expected: shape.describe(),
                    });
                }
            }
        }

        let body = serde_json::to_vec(&document).map_err(|source| DatasetError::Unparseable {
            path: path.clone(),
            source,
        })?;

        Ok(Self {
            source: path,
            document,
            body: Bytes::from(body),
        })
    }

    /// File the dataset was read from
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn last_updated(&self) -> Option<&str> {
        self.document.get("lastUpdated").and_then(Value::as_str)
    }

    /// Number of entries in `programs`
    pub fn program_count(&self) -> usize {
        self.document
            .get("programs")
            .and_then(Value::as_object)
            .map_or(0, Map::len)
    }

    /// Number of records in `conversions`
    pub fn conversion_count(&self) -> usize {
        self.document
            .get("conversions")
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    /// Serialized JSON body; cloning only bumps a reference count
    pub fn body(&self) -> Bytes {
        self.body.clone()
    }
}

/// Return the first candidate that exists on disk
///
/// Only a candidate that is definitely absent falls through to the next one.
/// A candidate that cannot be checked is reported as unreadable.
pub fn resolve_path<P: AsRef<Path>>(candidates: &[P]) -> Result<PathBuf, DatasetError> {
    for path in candidates.iter().map(AsRef::as_ref) {
        match path.try_exists() {
            Ok(true) => return Ok(path.to_path_buf()),
            Ok(false) => {}
            Err(source) => {
                return Err(DatasetError::Unreadable {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }
    Err(DatasetError::NotFound {
        candidates: candidates.iter().map(|p| p.as_ref().to_path_buf()).collect(),
    })
}

/// Resolve, read and parse the dataset
///
/// The file is read in one call and its handle released before returning.
pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Dataset, DatasetError> {
    let path = resolve_path(candidates)?;
    let contents = std::fs::read(&path).map_err(|source| DatasetError::Unreadable {
        path: path.clone(),
        source,
    })?;
    let dataset = Dataset::from_slice(path, &contents)?;

    logger::log_dataset_loaded(&dataset);
    Ok(dataset)
}

fn display_paths(paths: &[PathBuf]) -> String {
    let mut out = String::new();
    for (i, path) in paths.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{}", path.display());
    }
    out
}
