// src/workflow/manifest.rs

use serde_json::Value;
use thiserror::Error;

/// Artifact list written by a remote script.
///
/// Accepted shapes:
///
/// ```json
/// {"files": "/tmp/out/frame.png"}
/// {"files": ["/tmp/out/a.png", "/tmp/out/b.png"]}
/// {"files": null}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Manifest {
    /// Remote paths, in manifest order. A bare string is normalized into a
    /// one-element list; empty strings are dropped.
    pub files: Vec<String>,
}

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("manifest must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("`files` must be a path or a list of paths, got {0}")]
    BadFiles(&'static str),

    #[error("`files[{0}]` must be a path, got {1}")]
    BadEntry(usize, &'static str),
}

/// Parse and validate manifest text.
pub fn parse_manifest(text: &str) -> Result<Manifest, ManifestError> {
    let value: Value = serde_json::from_str(text)?;
    let object = match &value {
        Value::Object(map) => map,
        other => return Err(ManifestError::NotAnObject(kind(other))),
    };

    let files = match object.get("files") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(path)) => vec![path.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(path) => Ok(path.clone()),
                other => Err(ManifestError::BadEntry(i, kind(other))),
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => return Err(ManifestError::BadFiles(kind(other))),
    };

    Ok(Manifest {
        files: files.into_iter().filter(|p| !p.is_empty()).collect(),
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
