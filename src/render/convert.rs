//! Fluent conversion of a PDF into page images

use super::archive::{self, encode_image, image_format_for};
use super::rasterizer::{self, PdfiumRasterizer, Rasterizer, RenderedPage, POINTS_PER_INCH};
use crate::error::{Error, Result};
use image::DynamicImage;
use rayon::prelude::*;
use std::io::Read;
use std::path::Path;

/// A PDF waiting to be rasterized
///
/// ```no_run
/// use pdf_forms_mcp::render::DocumentConverter;
///
/// let images = DocumentConverter::from_path("form.pdf")?.to_images_with_scale(2.0)?;
/// images.write_files("out", "form", "png")?;
/// # Ok::<(), pdf_forms_mcp::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct DocumentConverter {
    data: Vec<u8>,
}

impl DocumentConverter {
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::PdfNotFound {
                path: path.display().to_string(),
            });
        }
        Ok(Self::from_bytes(std::fs::read(path)?))
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self::from_bytes(data))
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Render at scale 1.0 (72 DPI)
    pub fn to_images(&self) -> Result<PageImages> {
        self.to_images_with_scale(1.0)
    }

    /// Render at `scale` times the page's natural size
    pub fn to_images_with_scale(&self, scale: f32) -> Result<PageImages> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::InvalidInput {
                reason: format!("scale must be a positive number, got {}", scale),
            });
        }
        let dpi = (scale * POINTS_PER_INCH).round().max(1.0) as i32;
        self.to_images_with(&PdfiumRasterizer, dpi)
    }

    /// Render with an explicit rasterizer and resolution
    pub fn to_images_with(&self, rasterizer: &dyn Rasterizer, dpi: i32) -> Result<PageImages> {
        rasterizer::render(rasterizer, &self.data, dpi).map(PageImages::new)
    }
}

/// Rendered pages of one document
#[derive(Debug, Clone)]
pub struct PageImages {
    pages: Vec<RenderedPage>,
}

impl PageImages {
    pub fn new(pages: Vec<RenderedPage>) -> Self {
        Self { pages }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Image of the page at `index` (0-based)
    pub fn image(&self, index: usize) -> Result<&DynamicImage> {
        self.pages
            .get(index)
            .map(|page| &page.image)
            .ok_or(Error::PageOutOfBounds {
                page: index as u32 + 1,
                total: self.pages.len() as u32,
            })
    }

    pub fn pages(&self) -> &[RenderedPage] {
        &self.pages
    }

    /// Encoded bytes of one page in `format` (a file extension)
    pub fn as_bytes(&self, index: usize, format: &str) -> Result<Vec<u8>> {
        let image = self.image(index)?;
        encode_image(image, image_format_for(&format.to_ascii_lowercase())?)
    }

    /// Encoded bytes of every page, in page order
    pub fn as_bytes_all(&self, format: &str) -> Result<Vec<Vec<u8>>> {
        let image_format = image_format_for(&format.to_ascii_lowercase())?;
        self.pages
            .par_iter()
            .map(|page| encode_image(&page.image, image_format))
            .collect()
    }

    pub fn write_file(&self, index: usize, path: impl AsRef<Path>, format: &str) -> Result<()> {
        std::fs::write(path, self.as_bytes(index, format)?)?;
        Ok(())
    }

    /// Write every page to `dir` as `{prefix}_page_{n}.{format}`, 1-based.
    /// Returns the written paths in page order.
    pub fn write_files(
        &self,
        dir: impl AsRef<Path>,
        prefix: &str,
        format: &str,
    ) -> Result<Vec<std::path::PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let encoded = self.as_bytes_all(format)?;
        let mut written = Vec::with_capacity(encoded.len());
        for (index, data) in encoded.into_iter().enumerate() {
            let path = dir.join(format!("{}_page_{}.{}", prefix, index + 1, format));
            std::fs::write(&path, data)?;
            written.push(path);
        }
        Ok(written)
    }

    /// Pack every page into a zip archive
    pub fn into_archive(self, format: Option<&str>) -> Result<Vec<u8>> {
        archive::assemble(&self.pages, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use pretty_assertions::assert_eq;

    struct Blank(usize);

    impl Rasterizer for Blank {
        fn rasterize(&self, _pdf: &[u8], dpi: u32) -> Result<Vec<RenderedPage>> {
            Ok((0..self.0)
                .map(|i| RenderedPage::new(i, DynamicImage::ImageRgba8(RgbaImage::new(dpi / 10, 5))))
                .collect())
        }
    }

    #[test]
    fn test_from_path_missing() {
        let result = DocumentConverter::from_path("/nonexistent/form.pdf");
        assert!(matches!(result, Err(Error::PdfNotFound { .. })));
    }

    #[test]
    fn test_from_reader() {
        let converter = DocumentConverter::from_reader(&b"%PDF-1.7"[..]).unwrap();
        assert_eq!(converter.data(), b"%PDF-1.7");
    }

    #[test]
    fn test_invalid_scale() {
        let converter = DocumentConverter::from_bytes(b"%PDF".to_vec());
        for scale in [0.0, -1.0, f32::NAN] {
            assert!(matches!(
                converter.to_images_with_scale(scale),
                Err(Error::InvalidInput { .. })
            ));
        }
    }

    #[test]
    fn test_page_access() {
        let converter = DocumentConverter::from_bytes(b"%PDF".to_vec());
        let images = converter.to_images_with(&Blank(2), 100).unwrap();
        assert_eq!(images.page_count(), 2);
        assert_eq!(images.image(1).unwrap().width(), 10);
        assert!(matches!(
            images.image(2),
            Err(Error::PageOutOfBounds { page: 3, total: 2 })
        ));
    }

    #[test]
    fn test_write_files_naming() {
        let dir = tempfile::tempdir().unwrap();
        let images = DocumentConverter::from_bytes(b"%PDF".to_vec())
            .to_images_with(&Blank(2), 150)
            .unwrap();

        let written = images.write_files(dir.path(), "form", "png").unwrap();
        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["form_page_1.png", "form_page_2.png"]);
        assert!(written.iter().all(|p| p.exists()));
    }

    #[test]
    fn test_into_archive() {
        let images = DocumentConverter::from_bytes(b"%PDF".to_vec())
            .to_images_with(&Blank(1), 0)
            .unwrap();
        let archive = images.into_archive(Some("jpg")).unwrap();
        assert_eq!(archive::list_entries(&archive).unwrap(), vec!["page_001.jpg"]);
    }
}
