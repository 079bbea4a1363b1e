//! Service configuration
//!
//! All media types, default names and rendering defaults live in one
//! immutable record that is handed to the boundary operations.

/// Default rasterization resolution used when a caller passes `dpi <= 0`
pub const DEFAULT_DPI: u32 = 150;

/// Default image format for archive entries
pub const DEFAULT_IMAGE_FORMAT: &str = "png";

/// Image extensions offered to callers choosing an output format
pub const SUPPORTED_IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Configuration for the PDF boundary operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Resolution used when the requested DPI is zero or negative
    pub default_dpi: u32,
    /// Image format used when the requested format is blank
    pub default_image_format: String,
    /// File name for image archives
    pub archive_name: String,
    /// Content type for image archives
    pub archive_content_type: String,
    /// Content type for filled PDFs
    pub pdf_content_type: String,
    /// Prefix prepended to the original file name of a filled PDF
    pub filled_name_prefix: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_dpi: DEFAULT_DPI,
            default_image_format: DEFAULT_IMAGE_FORMAT.to_string(),
            archive_name: "pdf_images.zip".to_string(),
            archive_content_type: "application/zip".to_string(),
            pdf_content_type: "application/pdf".to_string(),
            filled_name_prefix: "filled-".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Download name for a filled copy of `original_name`
    pub fn filled_name(&self, original_name: &str) -> String {
        format!("{}{}", self.filled_name_prefix, original_name)
    }

    /// Resolve a caller-supplied DPI, replacing non-positive values
    pub fn effective_dpi(&self, dpi: i32) -> u32 {
        if dpi <= 0 {
            self.default_dpi
        } else {
            dpi as u32
        }
    }

    /// Resolve a caller-supplied image format: trimmed, lowercased, never blank
    pub fn effective_format(&self, format: Option<&str>) -> String {
        normalize_format(format, &self.default_image_format)
    }
}

/// Trim and lowercase a requested image format, using `default` when blank
pub fn normalize_format(format: Option<&str>, default: &str) -> String {
    match format.map(str::trim) {
        Some(f) if !f.is_empty() => f.to_ascii_lowercase(),
        _ => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_config_default() {
        let config = ServiceConfig::default();
        assert_eq!(config.default_dpi, 150);
        assert_eq!(config.default_image_format, "png");
        assert_eq!(config.archive_name, "pdf_images.zip");
        assert_eq!(config.archive_content_type, "application/zip");
        assert_eq!(config.pdf_content_type, "application/pdf");
    }

    #[test]
    fn test_filled_name() {
        let config = ServiceConfig::default();
        assert_eq!(config.filled_name("form.pdf"), "filled-form.pdf");
    }

    #[test]
    fn test_effective_dpi() {
        let config = ServiceConfig::default();
        assert_eq!(config.effective_dpi(0), 150);
        assert_eq!(config.effective_dpi(-1), 150);
        assert_eq!(config.effective_dpi(300), 300);
    }

    #[test]
    fn test_effective_format() {
        let config = ServiceConfig::default();
        assert_eq!(config.effective_format(None), "png");
        assert_eq!(config.effective_format(Some("   ")), "png");
        assert_eq!(config.effective_format(Some(" JPG ")), "jpg");

        let config = ServiceConfig {
            default_image_format: "jpeg".to_string(),
            ..ServiceConfig::default()
        };
        assert_eq!(config.effective_format(Some("")), "jpeg");
        assert_eq!(config.effective_format(Some("PNG")), "png");
    }

    #[test]
    fn test_normalize_format_is_idempotent() {
        for format in [None, Some(""), Some("  "), Some(" JPEG "), Some("png")] {
            let once = normalize_format(format, DEFAULT_IMAGE_FORMAT);
            assert_eq!(normalize_format(Some(&once), DEFAULT_IMAGE_FORMAT), once);
        }
    }
}
