use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// A validated blob location: a flat directory plus a flat filename.
///
/// Keys render as `{dir}/{name}` and never contain traversal segments, so a
/// key can be joined onto a storage root without escaping it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BlobKey {
    dir: String,
    name: String,
}

impl BlobKey {
    /// Build a key from a directory and a filename, validating both.
    pub fn new(dir: impl Into<String>, name: impl Into<String>) -> Result<Self, StorageError> {
        let dir = dir.into();
        let name = name.into();
        validate_dir(&dir)?;
        validate_name(&name)?;
        Ok(Self { dir, name })
    }

    /// Parse a `{dir}/{name}` string.
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        let (dir, name) = s
            .split_once('/')
            .ok_or_else(|| StorageError::InvalidKey(format!("missing directory in '{s}'")))?;
        Self::new(dir, name)
    }

    /// Directory component (e.g. `blogs`).
    pub fn dir(&self) -> &str {
        &self.dir
    }

    /// Filename component.
    pub fn name(&self) -> &str {
        &self.name
    }
}

fn validate_dir(dir: &str) -> Result<(), StorageError> {
    if dir.is_empty() {
        return Err(StorageError::InvalidKey("directory cannot be empty".into()));
    }
    if !dir
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        return Err(StorageError::InvalidKey(format!(
            "directory '{dir}' must be lowercase alphanumeric"
        )));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), StorageError> {
    if name.trim().is_empty() {
        return Err(StorageError::InvalidKey("filename cannot be empty".into()));
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(StorageError::InvalidKey(
            "filename must not contain control characters".into(),
        ));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(StorageError::InvalidKey(
            "filename must not contain path separators".into(),
        ));
    }
    if name.starts_with('.') {
        return Err(StorageError::InvalidKey(
            "filename must not start with '.'".into(),
        ));
    }
    Ok(())
}

impl fmt::Debug for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobKey({}/{})", self.dir, self.name)
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.dir, self.name)
    }
}

impl Serialize for BlobKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BlobKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
