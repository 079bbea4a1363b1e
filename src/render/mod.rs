//! Page rasterization and image archives

pub mod archive;
mod convert;
mod rasterizer;

pub use archive::{assemble, entry_name, list_entries};
pub use convert::{DocumentConverter, PageImages};
pub use rasterizer::{
    render, scale_for_dpi, PdfiumRasterizer, Rasterizer, RenderedPage, POINTS_PER_INCH,
};
