//! Input acquisition.
//!
//! Drops (a path or `file://` URI pasted by the terminal) and picks (a path
//! typed into the prompt) both normalize into a [`FileCandidate`], which is the
//! only thing the controller accepts.

use crate::error::AcquireError;
use crate::model::SourceFile;
use bytes::Bytes;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileCandidate {
    /// Text delivered by a drag-and-drop onto the terminal.
    Dropped(String),
    /// Text entered in the file prompt; empty means the prompt was cancelled.
    Picked(String),
}

impl FileCandidate {
    pub fn resolve(&self) -> Option<PathBuf> {
        match self {
            FileCandidate::Dropped(text) => parse_dropped(text),
            FileCandidate::Picked(text) => parse_picked(text),
        }
    }
}

fn parse_dropped(text: &str) -> Option<PathBuf> {
    // Multi-file drops arrive newline separated; only the first file is used.
    let first = text.lines().map(str::trim).find(|l| !l.is_empty())?;
    let unquoted = strip_quotes(first);
    if unquoted.starts_with("file://") {
        return url::Url::parse(unquoted)
            .ok()
            .and_then(|u| u.to_file_path().ok());
    }
    let unescaped = unquoted.replace("\\ ", " ");
    if unescaped.is_empty() {
        None
    } else {
        Some(PathBuf::from(unescaped))
    }
}

fn parse_picked(text: &str) -> Option<PathBuf> {
    let trimmed = strip_quotes(text.trim());
    if trimmed.is_empty() {
        return None;
    }
    if let Some(rest) = trimmed.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return Some(home.join(rest));
        }
    }
    Some(PathBuf::from(trimmed))
}

fn strip_quotes(s: &str) -> &str {
    for q in ['\'', '"'] {
        if let Some(inner) = s.strip_prefix(q).and_then(|r| r.strip_suffix(q)) {
            return inner;
        }
    }
    s
}

/// Guess the declared media type from the file extension.
pub fn media_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Advisory only; non-image files are still accepted.
pub fn looks_like_image(path: &Path) -> bool {
    media_type_for(path).starts_with("image/")
}

/// Single entry point for both input surfaces.
pub async fn acquire(candidate: &FileCandidate) -> Result<SourceFile, AcquireError> {
    let path = candidate.resolve().ok_or(AcquireError::Empty)?;
    load_source_file(&path).await
}

pub async fn load_source_file(path: &Path) -> Result<SourceFile, AcquireError> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|source| AcquireError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    if !meta.is_file() {
        return Err(AcquireError::NotAFile {
            path: path.to_path_buf(),
        });
    }
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| AcquireError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(SourceFile {
        name,
        path: path.to_path_buf(),
        media_type: media_type_for(path),
        bytes: Bytes::from(bytes),
    })
}
