use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Multipart};
use common::storage::{BlobKey, BlobStore};
use uuid::Uuid;

use crate::cascade::remove_blob;
use crate::config::StorageConfig;
use crate::error::AppError;
use crate::utils::filename::validate_image_filename;

/// Upper bound on files accepted in one multipart request.
pub const MAX_FILES_PER_REQUEST: usize = 20;

/// Body limit for multipart routes: every file at its maximum plus slack for
/// the text fields.
pub fn upload_body_limit(storage: &StorageConfig) -> DefaultBodyLimit {
    let per_file = usize::try_from(storage.max_image_size).unwrap_or(usize::MAX);
    DefaultBodyLimit::max(
        per_file
            .saturating_mul(MAX_FILES_PER_REQUEST)
            .saturating_add(1024 * 1024),
    )
}

/// One file part of a multipart request.
#[derive(Debug)]
pub struct FilePart {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// A buffered multipart form. Repeated file fields (`images`, `images[]`)
/// are collected under the bare name.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, Vec<FilePart>>,
}

impl MultipartForm {
    pub async fn parse(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = MultipartForm::default();
        let mut file_count = 0usize;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?
        {
            let name = field
                .name()
                .unwrap_or_default()
                .trim_end_matches("[]")
                .to_string();

            if let Some(file_name) = field.file_name().map(str::to_owned) {
                file_count += 1;
                if file_count > MAX_FILES_PER_REQUEST {
                    return Err(AppError::Validation(format!(
                        "At most {MAX_FILES_PER_REQUEST} files per request"
                    )));
                }
                let content_type = field.content_type().map(str::to_owned);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?;
                form.files.entry(name).or_default().push(FilePart {
                    file_name,
                    content_type,
                    data,
                });
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// A required, non-blank text field, trimmed.
    pub fn text(&self, name: &str) -> Result<String, AppError> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| AppError::Validation(format!("{name} is required")))
    }

    /// All files sent under `name`; at least one is required.
    pub fn take_files(&mut self, name: &str) -> Result<Vec<FilePart>, AppError> {
        match self.files.remove(name) {
            Some(files) if !files.is_empty() => Ok(files),
            _ => Err(AppError::Validation(format!("{name} is required"))),
        }
    }

    /// Exactly one file sent under `name`.
    pub fn take_file(&mut self, name: &str) -> Result<FilePart, AppError> {
        let mut files = self.take_files(name)?;
        if files.len() > 1 {
            return Err(AppError::Validation(format!("Only one {name} is allowed")));
        }
        Ok(files.remove(0))
    }
}

/// An image that has been written to the blob store.
#[derive(Debug, Clone)]
pub struct StoredImage {
    /// Client filename, kept as `image_name`.
    pub original_name: String,
    pub key: BlobKey,
    pub url: String,
}

/// Validate a file part as an allowed image before anything is stored.
pub fn check_image(part: &FilePart) -> Result<(), AppError> {
    validate_image_filename(&part.file_name)
        .map_err(|e| AppError::Validation(e.message().into()))?;
    if let Some(declared) = part.content_type.as_deref()
        && !declared.trim().to_ascii_lowercase().starts_with("image/")
    {
        return Err(AppError::Validation(format!(
            "{} is not an image ({declared})",
            part.file_name.trim()
        )));
    }
    Ok(())
}

/// Blob key for a fresh upload: `{dir}/{uuidv7}_{name}`. Anything outside
/// the URL-unreserved set is folded to `_`, so the public URL resolves to
/// the blob without escaping.
pub fn unique_key(dir: &str, original_name: &str) -> Result<BlobKey, AppError> {
    let flat = url_safe_name(original_name);
    let name = format!("{}_{flat}", Uuid::now_v7().simple());
    Ok(BlobKey::new(dir, name)?)
}

fn url_safe_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        let safe = c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~');
        let c = if safe { c } else { '_' };
        // collapse runs such as "a  #b" into a single separator
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out
}

pub fn public_url(storage: &StorageConfig, key: &BlobKey) -> String {
    format!(
        "{}/{}/{}",
        storage.public_base_url.trim_end_matches('/'),
        key.dir(),
        key.name()
    )
}

/// Validate and store a batch of images under `dir`. Either all of them are
/// stored or none remain.
pub async fn store_images(
    blobs: &dyn BlobStore,
    storage: &StorageConfig,
    dir: &str,
    parts: &[FilePart],
) -> Result<Vec<StoredImage>, AppError> {
    for part in parts {
        check_image(part)?;
    }

    let mut stored = Vec::with_capacity(parts.len());
    for part in parts {
        match store_one(blobs, storage, dir, part).await {
            Ok(image) => stored.push(image),
            Err(e) => {
                discard(blobs, &stored).await;
                return Err(e);
            }
        }
    }
    Ok(stored)
}

pub async fn store_image(
    blobs: &dyn BlobStore,
    storage: &StorageConfig,
    dir: &str,
    part: &FilePart,
) -> Result<StoredImage, AppError> {
    check_image(part)?;
    store_one(blobs, storage, dir, part).await
}

async fn store_one(
    blobs: &dyn BlobStore,
    storage: &StorageConfig,
    dir: &str,
    part: &FilePart,
) -> Result<StoredImage, AppError> {
    let original_name = part.file_name.trim().to_string();
    let key = unique_key(dir, &original_name)?;
    blobs.put(&key, &part.data).await?;
    Ok(StoredImage {
        url: public_url(storage, &key),
        original_name,
        key,
    })
}

/// Best-effort removal of blobs whose rows never got committed.
pub async fn discard(blobs: &dyn BlobStore, images: &[StoredImage]) {
    for image in images {
        remove_blob(blobs, image.key.dir(), &image.url).await;
    }
}
