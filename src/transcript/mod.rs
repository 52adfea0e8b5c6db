//! Typed transcript records.
//!
//! A record is exactly one of two shapes, told apart by the identifying field
//! it carries: `voiceline_id` for voicelines, `file` for simple files. Fields
//! this crate does not know about are carried through untouched so a rewrite
//! never drops data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown record structure: expected a `voiceline_id` or `file` field")]
    UnknownShape,
    #[error("malformed {kind} record: {source}")]
    Shape {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RecordError {
    fn persist(path: &Path, source: impl Into<std::io::Error>) -> Self {
        RecordError::Persist {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voiceline {
    pub voiceline_id: String,
    pub timestamp: String,
    pub segments: Vec<VoicelineSegment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoicelineSegment {
    pub start: Number,
    pub end: Number,
    pub text: String,
    pub part: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleFile {
    pub file: String,
    pub segments: Vec<Segment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Number,
    pub end: Number,
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TranscriptRecord {
    Voiceline(Voiceline),
    SimpleFile(SimpleFile),
}

impl TranscriptRecord {
    /// Classify a parsed JSON value by its discriminant field.
    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        let Value::Object(object) = &value else {
            return Err(RecordError::UnknownShape);
        };

        if object.contains_key("voiceline_id") {
            serde_json::from_value(value)
                .map(TranscriptRecord::Voiceline)
                .map_err(|source| RecordError::Shape {
                    kind: "voiceline",
                    source,
                })
        } else if object.contains_key("file") {
            serde_json::from_value(value)
                .map(TranscriptRecord::SimpleFile)
                .map_err(|source| RecordError::Shape {
                    kind: "simple file",
                    source,
                })
        } else {
            Err(RecordError::UnknownShape)
        }
    }

    pub fn from_json_str(content: &str, path: &Path) -> Result<Self, RecordError> {
        let value = serde_json::from_str(content).map_err(|source| RecordError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_value(value)
    }

    pub fn load(path: &Path) -> Result<Self, RecordError> {
        let content = std::fs::read_to_string(path).map_err(|source| RecordError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content, path)
    }

    /// Pretty JSON with a trailing newline; non-ASCII is written literally.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        Ok(content)
    }

    /// Replace the file at `path` with this record.
    ///
    /// The content goes to a temp file in the same directory which is then
    /// renamed over the target, so readers see either the old or the new file.
    pub fn persist(&self, path: &Path) -> Result<(), RecordError> {
        let content = self
            .to_json_string()
            .map_err(|err| RecordError::persist(path, err))?;

        let dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut staged =
            NamedTempFile::new_in(dir).map_err(|err| RecordError::persist(path, err))?;
        staged
            .write_all(content.as_bytes())
            .and_then(|_| staged.as_file().sync_all())
            .map_err(|err| RecordError::persist(path, err))?;
        // The staged file starts owner-only; keep the target's mode across the rename.
        match std::fs::metadata(path) {
            Ok(metadata) => staged
                .as_file()
                .set_permissions(metadata.permissions())
                .map_err(|err| RecordError::persist(path, err))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(RecordError::persist(path, err)),
        }
        staged
            .persist(path)
            .map_err(|err| RecordError::persist(path, err.error))?;

        debug!("Wrote {:?} ({} bytes)", path, content.len());
        Ok(())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TranscriptRecord::Voiceline(_) => "voiceline",
            TranscriptRecord::SimpleFile(_) => "simple file",
        }
    }

    pub fn segment_count(&self) -> usize {
        match self {
            TranscriptRecord::Voiceline(record) => record.segments.len(),
            TranscriptRecord::SimpleFile(record) => record.segments.len(),
        }
    }

    pub fn texts(&self) -> Vec<&str> {
        match self {
            TranscriptRecord::Voiceline(record) => {
                record.segments.iter().map(|s| s.text.as_str()).collect()
            }
            TranscriptRecord::SimpleFile(record) => {
                record.segments.iter().map(|s| s.text.as_str()).collect()
            }
        }
    }

    /// Mutable access to every segment text, in segment order.
    pub fn texts_mut(&mut self) -> Vec<&mut String> {
        match self {
            TranscriptRecord::Voiceline(record) => {
                record.segments.iter_mut().map(|s| &mut s.text).collect()
            }
            TranscriptRecord::SimpleFile(record) => {
                record.segments.iter_mut().map(|s| &mut s.text).collect()
            }
        }
    }
}
