//! Boundary operations over raw PDF bytes

use crate::config::ServiceConfig;
use crate::error::Result;
use crate::form::{self, FillReport, FormDocument, FormSnapshot};
use crate::render::{self, PdfiumRasterizer, Rasterizer, RenderedPage};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Bytes ready to be handed to a caller as a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A filled PDF and what the fill pass did
#[derive(Debug, Clone)]
pub struct FilledPdf {
    pub data: Vec<u8>,
    pub report: FillReport,
}

/// The three PDF operations: image archives, form introspection and form filling
#[derive(Clone)]
pub struct PdfService {
    config: ServiceConfig,
    rasterizer: Arc<dyn Rasterizer>,
}

impl Default for PdfService {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PdfService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PdfService {
    pub fn new() -> Self {
        Self::with_config(ServiceConfig::default())
    }

    pub fn with_config(config: ServiceConfig) -> Self {
        Self {
            config,
            rasterizer: Arc::new(PdfiumRasterizer),
        }
    }

    /// Replace the page rasterizer
    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Rasterize every page; `dpi <= 0` uses the configured default
    pub fn render_pages(&self, pdf: &[u8], dpi: i32) -> Result<Vec<RenderedPage>> {
        let dpi = self.config.effective_dpi(dpi);
        render::render(self.rasterizer.as_ref(), pdf, dpi as i32)
    }

    /// Render every page and pack the images into a zip archive
    pub fn try_convert_to_image_archive(
        &self,
        pdf: &[u8],
        format: Option<&str>,
        dpi: i32,
    ) -> Result<Vec<u8>> {
        let started = Instant::now();
        let format = self.config.effective_format(format);

        let pages = self.render_pages(pdf, dpi)?;
        let archive = render::assemble(&pages, Some(&format))?;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let per_page_ms = if pages.is_empty() {
            0
        } else {
            elapsed_ms / pages.len() as u64
        };
        tracing::info!(
            pages = pages.len(),
            dpi = self.config.effective_dpi(dpi),
            format = %format,
            elapsed_ms,
            per_page_ms,
            "converted PDF to image archive"
        );
        Ok(archive)
    }

    /// Like [`try_convert_to_image_archive`](Self::try_convert_to_image_archive),
    /// but any failure yields an empty byte vector
    pub fn convert_to_image_archive(&self, pdf: &[u8], format: Option<&str>, dpi: i32) -> Vec<u8> {
        self.try_convert_to_image_archive(pdf, format, dpi)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "image archive conversion failed");
                Vec::new()
            })
    }

    /// Image archive wrapped with its download name and content type
    pub fn image_archive_download(
        &self,
        pdf: &[u8],
        format: Option<&str>,
        dpi: i32,
    ) -> Result<Download> {
        Ok(Download {
            file_name: self.config.archive_name.clone(),
            content_type: self.config.archive_content_type.clone(),
            data: self.try_convert_to_image_archive(pdf, format, dpi)?,
        })
    }

    /// Describe the document's form fields
    pub fn introspect(&self, pdf: &[u8]) -> Result<FormSnapshot> {
        let doc = FormDocument::load(pdf)?;
        form::introspect(&doc)
    }

    /// Apply `edits` and serialize the result
    pub fn fill_and_serialize(
        &self,
        pdf: &[u8],
        edits: &HashMap<String, String>,
    ) -> Result<FilledPdf> {
        let mut doc = FormDocument::load(pdf)?;
        let report = form::fill(&mut doc, edits)?;
        let data = doc.save_to_bytes()?;
        Ok(FilledPdf { data, report })
    }

    /// Fill and name the result after `original_name`
    pub fn filled_download(
        &self,
        pdf: &[u8],
        edits: &HashMap<String, String>,
        original_name: &str,
    ) -> Result<(Download, FillReport)> {
        let filled = self.fill_and_serialize(pdf, edits)?;
        let download = Download {
            file_name: self.config.filled_name(original_name),
            content_type: self.config.pdf_content_type.clone(),
            data: filled.data,
        };
        Ok((download, filled.report))
    }
}
