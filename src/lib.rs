//! PDF forms MCP Server Library
//!
//! This crate provides PDF form and page-image tooling, usable directly or
//! through MCP tools:
//! - `introspect_form`: List AcroForm fields with kinds, labels and values
//! - `fill_form`: Write field values and produce a new PDF
//! - `convert_to_image_archive`: Render every page into a zip of images

pub mod config;
pub mod error;
pub mod form;
pub mod render;
pub mod server;
pub mod service;
pub mod source;

pub use config::ServiceConfig;
pub use error::{Error, Result};
pub use form::{FieldDescriptor, FieldKind, FillReport, FormDocument, FormSnapshot};
pub use render::{DocumentConverter, PageImages, PdfiumRasterizer, Rasterizer, RenderedPage};
pub use server::{
    run_server, run_server_with_config, run_server_with_dirs, PdfServer, PdfSource, ServerConfig,
};
pub use service::{Download, FilledPdf, PdfService};
