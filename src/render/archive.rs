//! Packing rendered pages into a zip archive

use super::rasterizer::RenderedPage;
use crate::config::{normalize_format, DEFAULT_IMAGE_FORMAT};
use crate::error::{Error, Result};
use image::{DynamicImage, ImageFormat};
use rayon::prelude::*;
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Archive entry name for the page at `index` (0-based)
pub fn entry_name(index: usize, format: &str) -> String {
    format!("page_{:03}.{}", index + 1, format)
}

/// Image codec for a file extension, if it can be written
pub fn image_format_for(extension: &str) -> Result<ImageFormat> {
    ImageFormat::from_extension(extension)
        .filter(|format| format.writing_enabled())
        .ok_or_else(|| Error::Encoding {
            reason: format!("unsupported image format: {}", extension),
        })
}

/// Encode one image with `format`
pub fn encode_image(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    let written = match format {
        // JPEG has no alpha channel
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut buffer, format),
        _ => image.write_to(&mut buffer, format),
    };
    written.map_err(|e| Error::Encoding {
        reason: e.to_string(),
    })?;
    Ok(buffer.into_inner())
}

/// Encode `pages` and pack them into a zip archive.
///
/// Entries are named `page_001.<format>`, `page_002.<format>` and so on in
/// input order. Encoding runs in parallel; any failure fails the whole call.
pub fn assemble(pages: &[RenderedPage], format: Option<&str>) -> Result<Vec<u8>> {
    let extension = normalize_format(format, DEFAULT_IMAGE_FORMAT);
    let image_format = image_format_for(&extension)?;

    let encoded = pages
        .par_iter()
        .map(|page| {
            encode_image(&page.image, image_format).map_err(|e| match e {
                Error::Encoding { reason } => Error::Encoding {
                    reason: format!("page {}: {}", page.page_number(), reason),
                },
                other => other,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (position, data) in encoded.iter().enumerate() {
        zip.start_file(entry_name(position, &extension), options)
            .map_err(Error::archive_write)?;
        zip.write_all(data)?;
    }
    let archive = zip.finish().map_err(Error::archive_write)?.into_inner();

    tracing::debug!(
        entries = encoded.len(),
        format = %extension,
        bytes = archive.len(),
        "archive assembled"
    );
    Ok(archive)
}

/// Entry names of a zip archive, in archive order
pub fn list_entries(archive: &[u8]) -> Result<Vec<String>> {
    let mut zip = ZipArchive::new(Cursor::new(archive)).map_err(Error::archive_read)?;
    let mut names = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        names.push(zip.by_index(i).map_err(Error::archive_read)?.name().to_string());
    }
    Ok(names)
}

/// Read one entry's bytes from a zip archive
pub fn read_entry(archive: &[u8], name: &str) -> Result<Vec<u8>> {
    let mut zip = ZipArchive::new(Cursor::new(archive)).map_err(Error::archive_read)?;
    let mut entry = zip.by_name(name).map_err(Error::archive_read)?;
    let mut data = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut data)?;
    Ok(data)
}
