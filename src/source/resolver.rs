//! Turning tool-call sources into PDF bytes

use crate::error::{Error, Result};
use crate::source::DocumentCache;
use base64::Engine;
use std::path::Path;

/// File name used for documents that arrive without one
pub const UNNAMED_DOCUMENT: &str = "document.pdf";

/// PDF bytes together with where they came from
#[derive(Debug, Clone)]
pub struct ResolvedPdf {
    pub data: Vec<u8>,
    /// Label for tool responses
    pub source_name: String,
    /// Base file name, used to name derived documents
    pub file_name: String,
}

fn check_header(data: &[u8], what: &str) -> Result<()> {
    if data.is_empty() {
        return Err(Error::InvalidInput {
            reason: format!("{} is empty", what),
        });
    }
    if !data.starts_with(b"%PDF") {
        return Err(Error::Document {
            reason: format!("{} is not a PDF file", what),
        });
    }
    Ok(())
}

/// Read a PDF from disk
pub fn resolve_path<P: AsRef<Path>>(path: P) -> Result<ResolvedPdf> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::PdfNotFound {
            path: path.display().to_string(),
        });
    }

    let data = std::fs::read(path)?;
    check_header(&data, "File")?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| UNNAMED_DOCUMENT.to_string());
    Ok(ResolvedPdf {
        data,
        source_name: path.display().to_string(),
        file_name,
    })
}

/// Decode an inline base64 PDF
pub fn resolve_base64(encoded: &str) -> Result<ResolvedPdf> {
    let data = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
    check_header(&data, "Decoded data")?;

    Ok(ResolvedPdf {
        data,
        source_name: "<base64>".to_string(),
        file_name: UNNAMED_DOCUMENT.to_string(),
    })
}

/// Look up a document stored by an earlier tool call
pub fn resolve_cache(key: &str, cache: &DocumentCache) -> Result<ResolvedPdf> {
    let cached = cache.get(key).ok_or_else(|| Error::CacheKeyNotFound {
        key: key.to_string(),
    })?;

    Ok(ResolvedPdf {
        data: cached.data,
        source_name: format!("<cache:{}>", key),
        file_name: cached.file_name,
    })
}
