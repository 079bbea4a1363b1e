//! Error types for the PDF forms MCP server

use thiserror::Error;

/// Result type alias for the PDF forms MCP server
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the PDF forms MCP server
#[derive(Error, Debug)]
pub enum Error {
    /// Empty source bytes or malformed request parameters
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Unparsable or structurally invalid PDF
    #[error("Invalid PDF document: {reason}")]
    Document { reason: String },

    /// A page could not be rasterized
    #[error("Failed to render page {page}: {reason}")]
    Render { page: u32, reason: String },

    /// A rendered page could not be encoded or archived
    #[error("Failed to encode images: {reason}")]
    Encoding { reason: String },

    /// An existing archive could not be read
    #[error("Invalid archive: {reason}")]
    Archive { reason: String },

    /// PDFium could not be bound or initialized
    #[error("PDFium error: {reason}")]
    Pdfium { reason: String },

    /// PDF file not found
    #[error("PDF not found: {path}")]
    PdfNotFound { path: String },

    /// Page out of bounds
    #[error("Page {page} out of bounds (total: {total})")]
    PageOutOfBounds { page: u32, total: u32 },

    /// Cache key not found
    #[error("Cache key not found: {key}")]
    CacheKeyNotFound { key: String },

    /// Path access denied (outside allowed resource directories)
    #[error("Path access denied: {path}")]
    PathAccessDenied { path: String },

    /// Requested resolution above the configured maximum
    #[error("DPI {dpi} exceeds maximum {max}")]
    DpiOutOfRange { dpi: i32, max: u32 },

    /// Base64 decode error
    #[error("Invalid base64 data: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::Document {
            reason: err.to_string(),
        }
    }
}

impl Error {
    /// Wrap a zip failure raised while writing an archive
    pub fn archive_write(err: zip::result::ZipError) -> Self {
        Error::Encoding {
            reason: format!("archive write failed: {}", err),
        }
    }

    /// Wrap a zip failure raised while reading an archive
    pub fn archive_read(err: zip::result::ZipError) -> Self {
        Error::Archive {
            reason: err.to_string(),
        }
    }
}

impl Error {
    /// Return a sanitized error message safe to send to clients.
    /// Internal details (paths, library errors) are omitted.
    /// Full details should be logged via tracing before calling this.
    pub fn client_message(&self) -> String {
        match self {
            Error::InvalidInput { reason } => format!("Invalid input: {}", reason),
            Error::Document { .. } => "Invalid PDF document".to_string(),
            Error::Render { page, .. } => format!("Failed to render page {}", page),
            Error::Encoding { .. } => "Image encoding failed".to_string(),
            Error::Archive { .. } => "Invalid archive".to_string(),
            Error::Pdfium { .. } => "PDF rendering engine unavailable".to_string(),
            Error::PdfNotFound { .. } => "PDF not found".to_string(),
            Error::PageOutOfBounds { page, total } => {
                format!("Page {} out of bounds (total: {})", page, total)
            }
            Error::CacheKeyNotFound { .. } => "Cache key not found".to_string(),
            Error::PathAccessDenied { .. } => "Access denied".to_string(),
            Error::DpiOutOfRange { max, .. } => format!("DPI must not exceed {}", max),
            Error::Base64Decode(_) => "Invalid base64 data".to_string(),
            Error::Io(_) => "I/O error".to_string(),
            Error::Serialization(_) => "Serialization error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_hides_internal_detail() {
        let err = Error::Document {
            reason: "xref table at offset 1234 is corrupt".to_string(),
        };
        assert_eq!(err.client_message(), "Invalid PDF document");

        let err = Error::PathAccessDenied {
            path: "/etc/passwd".to_string(),
        };
        assert!(!err.client_message().contains("/etc"));
    }

    #[test]
    fn test_zip_read_and_write_failures_are_distinct() {
        let read = Error::archive_read(zip::result::ZipError::FileNotFound);
        assert!(matches!(read, Error::Archive { .. }));
        assert_eq!(read.client_message(), "Invalid archive");

        let write = Error::archive_write(zip::result::ZipError::InvalidArchive("truncated".into()));
        assert!(matches!(write, Error::Encoding { .. }));
    }

    #[test]
    fn test_render_error_display_includes_cause() {
        let err = Error::Render {
            page: 3,
            reason: "bitmap allocation failed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to render page 3: bitmap allocation failed"
        );
    }
}
