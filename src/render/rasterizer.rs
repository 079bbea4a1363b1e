//! Page rasterization using PDFium

use crate::config::DEFAULT_DPI;
use crate::error::{Error, Result};
use image::DynamicImage;
use pdfium_render::prelude::*;

/// PDF user space units per inch
pub const POINTS_PER_INCH: f32 = 72.0;

/// One rendered page
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Page index (0-based)
    pub index: usize,
    pub image: DynamicImage,
}

impl RenderedPage {
    pub fn new(index: usize, image: DynamicImage) -> Self {
        Self { index, image }
    }

    /// Page number (1-indexed)
    pub fn page_number(&self) -> u32 {
        self.index as u32 + 1
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Renders every page of a PDF to a bitmap
pub trait Rasterizer: Send + Sync {
    /// Render all pages of `pdf` at `dpi`, one bitmap per page in page order.
    /// Either every page is returned or the call fails.
    fn rasterize(&self, pdf: &[u8], dpi: u32) -> Result<Vec<RenderedPage>>;
}

/// Render `pdf` and check that the result is complete and ordered.
///
/// A non-positive `dpi` renders at [`DEFAULT_DPI`].
pub fn render(rasterizer: &dyn Rasterizer, pdf: &[u8], dpi: i32) -> Result<Vec<RenderedPage>> {
    if pdf.is_empty() {
        return Err(Error::InvalidInput {
            reason: "PDF data is empty".to_string(),
        });
    }
    let dpi = if dpi <= 0 { DEFAULT_DPI } else { dpi as u32 };

    let mut pages = rasterizer.rasterize(pdf, dpi)?;
    pages.sort_by_key(|page| page.index);
    if let Some((position, page)) = pages
        .iter()
        .enumerate()
        .find(|(position, page)| page.index != *position)
    {
        return Err(Error::Render {
            page: position as u32 + 1,
            reason: format!("renderer returned page index {} out of sequence", page.index),
        });
    }
    Ok(pages)
}

/// Scale factor PDFium needs to render at `dpi`
pub fn scale_for_dpi(dpi: u32) -> f32 {
    dpi as f32 / POINTS_PER_INCH
}

/// Get PDFium instance (creates new instance each time - PDFium is not thread-safe)
fn create_pdfium() -> Result<Pdfium> {
    // Try to bind to system library or use static linking
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                "/opt/pdfium/lib",
            ))
        })
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| Error::Pdfium {
            reason: format!("Failed to initialize PDFium: {}", e),
        })?;

    Ok(Pdfium::new(bindings))
}

/// Rasterizer backed by the PDFium shared library.
///
/// Pages of one document are rendered one after another on the calling
/// thread; PDFium does not allow concurrent use of a document.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfiumRasterizer;

impl PdfiumRasterizer {
    /// Whether the PDFium library can be bound in this process
    pub fn is_available() -> bool {
        create_pdfium().is_ok()
    }
}

impl Rasterizer for PdfiumRasterizer {
    fn rasterize(&self, pdf: &[u8], dpi: u32) -> Result<Vec<RenderedPage>> {
        let pdfium = create_pdfium()?;
        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|e| Error::Document {
                reason: format!("{}", e),
            })?;

        let config = PdfRenderConfig::new()
            .scale_page_by_factor(scale_for_dpi(dpi))
            .render_form_data(true)
            .render_annotations(true);

        let pages = document.pages();
        let mut rendered = Vec::with_capacity(pages.len() as usize);
        for (index, page) in pages.iter().enumerate() {
            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| Error::Render {
                    page: index as u32 + 1,
                    reason: format!("{}", e),
                })?;
            rendered.push(RenderedPage::new(index, bitmap.as_image()));
        }

        tracing::debug!(pages = rendered.len(), dpi, "document rasterized");
        Ok(rendered)
    }
}
