//! Static file collaborators.
//!
//! # Responsibilities
//! - Resolve a request path to a file under a root directory
//! - Guess a content type from the file extension
//!
//! # Design Decisions
//! - Queried only for GET and HEAD, and only when no route matched
//! - `.` and `..` segments are rejected, so lookups never leave the root
//! - A directory path serves its `index.html`
//! - Read errors other than "not found" are logged and treated as a miss

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A file found by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFile {
    pub content: Vec<u8>,
    pub content_type: &'static str,
}

/// Something that can serve files for unmatched paths.
pub trait StaticFiles: Send + Sync + fmt::Debug {
    fn lookup(&self, path: &str) -> Option<StaticFile>;
}

/// Serves files from a directory on disk.
#[derive(Debug, Clone)]
pub struct StaticDirectory {
    root: PathBuf,
}

impl StaticDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let mut resolved = self.root.clone();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." || segment.contains('\\') {
                return None;
            }
            resolved.push(segment);
        }
        if resolved.is_dir() {
            resolved.push("index.html");
        }
        Some(resolved)
    }
}

impl StaticFiles for StaticDirectory {
    fn lookup(&self, path: &str) -> Option<StaticFile> {
        let file = self.resolve(path)?;
        match std::fs::read(&file) {
            Ok(content) => {
                tracing::debug!(file = %file.display(), "Serving static file");
                Some(StaticFile {
                    content,
                    content_type: content_type_for(&file),
                })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::debug!(file = %file.display(), error = %e, "Static file unreadable");
                None
            }
        }
    }
}

/// Content type for a file, from its extension.
pub fn content_type_for(file: &Path) -> &'static str {
    let ext = file
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        "xml" => "application/xml",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "wasm" => "application/wasm",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}
