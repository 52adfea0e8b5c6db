//! Schema validation for transcript JSON files.
//!
//! Validation is read-only and independent of correction. It works on raw
//! `serde_json::Value`s so that it can describe exactly what is wrong with a
//! file the typed model refuses to load. Only the first violation is reported.

use anyhow::{bail, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::batch::discover_json_files;

/// Result of validating one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub valid: bool,
    pub message: String,
}

impl Validation {
    fn ok(message: &str) -> Self {
        Self {
            valid: true,
            message: message.to_string(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

/// Required segment field and the type check applied to it.
struct FieldCheck {
    name: &'static str,
    check: fn(&Value) -> bool,
    expected: &'static str,
}

const START: FieldCheck = FieldCheck {
    name: "start",
    check: Value::is_number,
    expected: "a number",
};
const END: FieldCheck = FieldCheck {
    name: "end",
    check: Value::is_number,
    expected: "a number",
};
const TEXT: FieldCheck = FieldCheck {
    name: "text",
    check: Value::is_string,
    expected: "a string",
};
const PART: FieldCheck = FieldCheck {
    name: "part",
    check: is_integer,
    expected: "an integer",
};

const VOICELINE_SEGMENT: &[FieldCheck] = &[START, END, TEXT, PART];
const SIMPLE_SEGMENT: &[FieldCheck] = &[START, END, TEXT];

fn is_integer(value: &Value) -> bool {
    value.is_i64() || value.is_u64()
}

pub fn validate(record: &Value) -> Validation {
    let Some(object) = record.as_object() else {
        return Validation::fail("JSON root must be an object");
    };

    if object.contains_key("voiceline_id") {
        validate_voiceline(object)
    } else if object.contains_key("file") {
        validate_simple_file(object)
    } else {
        Validation::fail("Unknown JSON structure - does not match any expected format")
    }
}

fn validate_voiceline(object: &Map<String, Value>) -> Validation {
    let result = require_string(object, "voiceline_id")
        .and_then(|_| require_string(object, "timestamp"))
        .and_then(|_| validate_segments(object, VOICELINE_SEGMENT));

    match result {
        Ok(()) => Validation::ok("Valid voiceline structure"),
        Err(message) => Validation::fail(message),
    }
}

fn validate_simple_file(object: &Map<String, Value>) -> Validation {
    let result = require_string(object, "file")
        .and_then(|_| validate_segments(object, SIMPLE_SEGMENT));

    match result {
        Ok(()) => Validation::ok("Valid simple file structure"),
        Err(message) => Validation::fail(message),
    }
}

fn require_string(object: &Map<String, Value>, field: &str) -> Result<(), String> {
    match object.get(field) {
        None => Err(format!("Missing '{field}' field")),
        Some(value) if !value.is_string() => Err(format!("'{field}' must be a string")),
        Some(_) => Ok(()),
    }
}

fn validate_segments(object: &Map<String, Value>, fields: &[FieldCheck]) -> Result<(), String> {
    let segments = match object.get("segments") {
        None => return Err("Missing 'segments' field".to_string()),
        Some(Value::Array(segments)) => segments,
        Some(_) => return Err("'segments' must be a list".to_string()),
    };

    for (idx, segment) in segments.iter().enumerate() {
        let Some(segment) = segment.as_object() else {
            return Err(format!("Segment {idx} must be a dictionary"));
        };

        // Presence of every field is checked before any type.
        if let Some(missing) = fields.iter().find(|f| !segment.contains_key(f.name)) {
            return Err(format!(
                "Segment {idx} missing required field '{}'",
                missing.name
            ));
        }

        for field in fields {
            if !(field.check)(&segment[field.name]) {
                return Err(format!(
                    "Segment {idx} '{}' must be {}",
                    field.name, field.expected
                ));
            }
        }
    }

    Ok(())
}

/// Read, parse and validate one file.
pub fn validate_file(path: &Path) -> Validation {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => return Validation::fail(format!("Error reading file: {err}")),
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(value) => validate(&value),
        Err(err) => Validation::fail(format!("Invalid JSON: {err}")),
    }
}

/// One invalid file in a directory pass.
#[derive(Debug, Clone, Serialize)]
pub struct InvalidFile {
    pub path: PathBuf,
    pub message: String,
}

impl InvalidFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub valid: usize,
    pub errors: Vec<InvalidFile>,
}

impl ValidationSummary {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate every `*.json` file directly inside `dir`.
pub fn validate_directory(dir: &Path) -> Result<ValidationSummary> {
    if !dir.is_dir() {
        bail!("Directory {:?} does not exist", dir);
    }

    let files = discover_json_files(dir)?;
    info!("Validating {} JSON files in {:?}", files.len(), dir);

    let mut summary = ValidationSummary {
        total: files.len(),
        ..Default::default()
    };

    for path in files {
        let validation = validate_file(&path);
        debug!("{:?}: {}", path, validation.message);
        if validation.valid {
            summary.valid += 1;
        } else {
            summary.errors.push(InvalidFile {
                path,
                message: validation.message,
            });
        }
    }

    Ok(summary)
}
