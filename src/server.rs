//! MCP Server implementation using rmcp

use crate::error::Error;
use crate::form::{FieldDescriptor, FormDocument};
use crate::render;
use crate::service::PdfService;
use crate::source::{
    resolve_base64, resolve_cache, resolve_path, CachedDocument, DocumentCache, ResolvedPdf,
};
use anyhow::Result;
use base64::Engine;
use rmcp::{
    handler::server::tool::ToolRouter, handler::server::wrapper::Parameters, model::*,
    schemars::JsonSchema, tool, tool_handler, tool_router, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where a tool reads its PDF from
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum PdfSource {
    /// File path (absolute or relative)
    Path {
        /// Path to the PDF file
        path: String,
    },
    /// Base64 encoded PDF data
    Base64 {
        /// Base64 encoded PDF content
        base64: String,
    },
    /// Reference to cached PDF
    CacheRef {
        /// Cache key from previous operation
        cache_key: String,
    },
}

const SOURCE_KEYS: [&str; 3] = ["path", "base64", "cache_key"];

impl<'de> serde::Deserialize<'de> for PdfSource {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let Some(obj) = value.as_object() else {
            let kind = match &value {
                serde_json::Value::Array(_) => "an array",
                serde_json::Value::String(_) => "a string",
                serde_json::Value::Number(_) => "a number",
                serde_json::Value::Bool(_) => "a boolean",
                serde_json::Value::Null => "null",
                serde_json::Value::Object(_) => "an object",
            };
            return Err(serde::de::Error::custom(format!(
                "Invalid source: expected an object with one of {:?}, but got {}",
                SOURCE_KEYS, kind
            )));
        };

        for key in SOURCE_KEYS {
            let Some(v) = obj.get(key) else {
                continue;
            };
            let Some(s) = v.as_str() else {
                return Err(serde::de::Error::custom(format!(
                    "\"{}\" must be a string",
                    key
                )));
            };
            let s = s.to_string();
            return Ok(match key {
                "path" => PdfSource::Path { path: s },
                "base64" => PdfSource::Base64 { base64: s },
                _ => PdfSource::CacheRef { cache_key: s },
            });
        }

        let keys: Vec<&String> = obj.keys().collect();
        Err(serde::de::Error::custom(format!(
            "Invalid source: expected an object with one of {:?}, but got keys: {:?}",
            SOURCE_KEYS, keys
        )))
    }
}

/// Security and resource configuration for the MCP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directories that path sources and output paths must stay inside.
    /// Empty means unrestricted.
    pub resource_dirs: Vec<String>,
    /// Maximum total bytes in cache (default: 512MB)
    pub cache_max_bytes: usize,
    /// Maximum number of cache entries (default: 100)
    pub cache_max_entries: usize,
    /// Highest accepted rasterization DPI (default: 1200)
    pub max_dpi: u32,
    /// Boundary operations
    pub service: PdfService,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            resource_dirs: Vec::new(),
            cache_max_bytes: 512 * 1024 * 1024, // 512MB
            cache_max_entries: 100,
            max_dpi: 1200,
            service: PdfService::new(),
        }
    }
}

/// PDF forms MCP Server
#[derive(Clone)]
pub struct PdfServer {
    cache: Arc<DocumentCache>,
    tool_router: ToolRouter<Self>,
    /// Server configuration
    config: Arc<ServerConfig>,
}

// ============================================================================
// Request/Response types for convert_to_image_archive
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConvertToImageArchiveParams {
    /// PDF to rasterize
    pub source: PdfSource,
    /// Image format for archive entries, e.g. "png" or "jpg" (default: png)
    #[serde(default)]
    pub format: Option<String>,
    /// Rendering resolution; zero, negative or absent means 150
    #[serde(default)]
    pub dpi: Option<i32>,
    /// Output file path (optional). If provided, saves the archive there instead of returning it inline.
    #[serde(default)]
    pub output_path: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ConvertToImageArchiveResult {
    pub source: String,
    /// Suggested download name
    pub file_name: String,
    pub content_type: String,
    /// Archive entry names in page order
    pub entries: Vec<String>,
    pub size_bytes: usize,
    /// Base64-encoded archive (omitted when written to output_path)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Request/Response types for introspect_form
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct IntrospectFormParams {
    /// PDF sources to process
    pub sources: Vec<PdfSource>,
    /// Enable caching
    #[serde(default)]
    pub cache: bool,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct IntrospectFormResult {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_key: Option<String>,
    /// Qualified field name -> current value
    pub values: BTreeMap<String, String>,
    pub fields: Vec<FieldDescriptor>,
    pub total_fields: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Request/Response types for fill_form
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FillFormParams {
    /// Source PDF containing form fields
    pub source: PdfSource,
    /// Qualified field name -> value. Checkboxes accept true/false/on/off or their export value.
    #[serde(default)]
    pub values: HashMap<String, String>,
    /// Name the filled document is derived from (default: the source file name)
    #[serde(default)]
    pub original_name: Option<String>,
    /// Output file path (optional). If provided, saves the filled PDF to this path.
    #[serde(default)]
    pub output_path: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct SkippedFieldInfo {
    /// Field name
    pub name: String,
    /// Reason the field was skipped
    pub reason: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct FillFormResult {
    /// Source identifier
    pub source: String,
    /// Suggested download name, e.g. "filled-form.pdf"
    pub file_name: String,
    pub content_type: String,
    /// Cache key for the output PDF (always provided for chaining operations)
    pub output_cache_key: String,
    /// Number of fields written
    pub fields_filled: u32,
    /// Requested fields that were not written
    pub fields_skipped: Vec<SkippedFieldInfo>,
    /// Number of pages in output PDF
    pub output_page_count: u32,
    /// Path where PDF was saved (if output_path was specified)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Tool implementations
// ============================================================================

#[tool_router]
impl PdfServer {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    /// Create a new PdfServer with specified resource directories
    pub fn with_resource_dirs(dirs: Vec<String>) -> Self {
        Self::with_config(ServerConfig {
            resource_dirs: dirs,
            ..ServerConfig::default()
        })
    }

    /// Create a new PdfServer with full configuration
    pub fn with_config(config: ServerConfig) -> Self {
        let cache = DocumentCache::new(config.cache_max_entries, config.cache_max_bytes);
        Self {
            cache: Arc::new(cache),
            tool_router: Self::tool_router(),
            config: Arc::new(config),
        }
    }

    /// Render every page of a PDF and pack the images into a zip archive
    #[tool(
        description = "Render every page of a PDF to an image and return the images packed in a zip archive.

Entries are named page_001.png, page_002.png, ... in page order.

Options:
- format: Image format for the entries (default: png). jpg, jpeg and png are typical.
- dpi: Rendering resolution (default: 150). Zero or negative values use the default.
- output_path: Write the archive to this path instead of returning it base64-encoded.

Source format: must be one of {\"path\": \"/absolute/path.pdf\"}, {\"base64\": \"...\"}, or {\"cache_key\": \"...\"}"
    )]
    async fn convert_to_image_archive(
        &self,
        Parameters(params): Parameters<ConvertToImageArchiveParams>,
    ) -> String {
        let result = self
            .process_convert_to_image_archive(&params)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "convert_to_image_archive failed");
                ConvertToImageArchiveResult {
                    source: Self::source_name(&params.source),
                    file_name: self.config.service.config().archive_name.clone(),
                    content_type: self.config.service.config().archive_content_type.clone(),
                    entries: vec![],
                    size_bytes: 0,
                    data_base64: None,
                    output_path: None,
                    error: Some(e.client_message()),
                }
            });

        let response = serde_json::json!({ "results": [result] });
        serde_json::to_string_pretty(&response).unwrap_or_default()
    }

    /// Describe the interactive form fields of PDF files
    #[tool(
        description = "List the interactive form (AcroForm) fields of PDF files with their current values.

Each field reports:
- qualified_name: The key to use with fill_form
- display_name: The name with UI suffixes such as \"Text Box\" or \"Checkbox\" removed
- kind: Tx (text), Ch (choice), Btn (button), Sig (signature) or Unknown
- type_label: Text Field, Dropdown, List Box, Checkbox, Radio Button, Signature or Unknown
- flags: Raw field flag bits
- dropdown_options: Options of choice fields, in document order
- checkbox_export_value: The value that checks a checkbox

A flat values map (qualified_name -> value) is returned as well; passing it unchanged to fill_form leaves the form as it is.

Source format: each element must be one of {\"path\": \"/absolute/path.pdf\"}, {\"base64\": \"...\"}, or {\"cache_key\": \"...\"}"
    )]
    async fn introspect_form(
        &self,
        Parameters(params): Parameters<IntrospectFormParams>,
    ) -> String {
        let mut results = Vec::new();

        for source in &params.sources {
            let result = self
                .process_introspect_form(source, &params)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "introspect_form failed");
                    IntrospectFormResult {
                        source: Self::source_name(source),
                        cache_key: None,
                        values: BTreeMap::new(),
                        fields: vec![],
                        total_fields: 0,
                        error: Some(e.client_message()),
                    }
                });
            results.push(result);
        }

        let response = serde_json::json!({ "results": results });
        serde_json::to_string_pretty(&response).unwrap_or_default()
    }

    /// Fill form fields in a PDF
    #[tool(
        description = "Fill form fields in a PDF and produce a new PDF.

values maps qualified field names (see introspect_form) to strings:
- Text and choice fields: the value is written as-is
- Checkboxes: \"true\"/\"on\" or the export value checks, \"\"/\"false\"/\"off\" unchecks
- Radio buttons: the name of the option to select

Unknown names are reported as skipped and never fail the call. Signature fields and push buttons are not written.

The output is always cached (output_cache_key) for chaining with other tools.

Source format: must be one of {\"path\": \"/absolute/path.pdf\"}, {\"base64\": \"...\"}, or {\"cache_key\": \"...\"}"
    )]
    async fn fill_form(&self, Parameters(params): Parameters<FillFormParams>) -> String {
        let result = self
            .process_fill_form(&params)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "fill_form failed");
                FillFormResult {
                    source: Self::source_name(&params.source),
                    file_name: String::new(),
                    content_type: self.config.service.config().pdf_content_type.clone(),
                    output_cache_key: String::new(),
                    fields_filled: 0,
                    fields_skipped: vec![],
                    output_page_count: 0,
                    output_path: None,
                    error: Some(e.client_message()),
                }
            });

        let response = serde_json::json!({ "results": [result] });
        serde_json::to_string_pretty(&response).unwrap_or_default()
    }
}

impl PdfServer {
    fn source_name(source: &PdfSource) -> String {
        match source {
            PdfSource::Path { path } => path.clone(),
            PdfSource::Base64 { .. } => "<base64>".to_string(),
            PdfSource::CacheRef { cache_key } => format!("<cache:{}>", cache_key),
        }
    }

    fn resolve_source(&self, source: &PdfSource) -> crate::error::Result<ResolvedPdf> {
        match source {
            PdfSource::Path { path } => {
                let allowed = self.validate_path_access(path)?;
                resolve_path(allowed)
            }
            PdfSource::Base64 { base64 } => resolve_base64(base64),
            PdfSource::CacheRef { cache_key } => resolve_cache(cache_key, &self.cache),
        }
    }

    fn within_resource_dirs(&self, canonical: &Path) -> bool {
        self.config.resource_dirs.iter().any(|dir| {
            std::fs::canonicalize(dir)
                .map(|dir| canonical.starts_with(dir))
                .unwrap_or(false)
        })
    }

    /// Validate that a path is within allowed resource directories.
    /// If no resource_dirs are configured, all paths are allowed.
    fn validate_path_access(&self, path: &str) -> crate::error::Result<PathBuf> {
        if self.config.resource_dirs.is_empty() {
            return Ok(PathBuf::from(path));
        }

        let denied = || Error::PathAccessDenied {
            path: path.to_string(),
        };
        let canonical = std::fs::canonicalize(path).map_err(|_| denied())?;
        if self.within_resource_dirs(&canonical) {
            Ok(canonical)
        } else {
            Err(denied())
        }
    }

    /// Validate that an output path is within allowed resource directories.
    /// Canonicalizes the parent directory since the output file may not exist yet.
    fn validate_output_path_access(&self, path: &str) -> crate::error::Result<PathBuf> {
        if self.config.resource_dirs.is_empty() {
            return Ok(PathBuf::from(path));
        }

        let denied = || Error::PathAccessDenied {
            path: path.to_string(),
        };
        let target = Path::new(path);
        let file_name = target.file_name().ok_or_else(denied)?;
        let parent = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let canonical = std::fs::canonicalize(parent)
            .map_err(|_| denied())?
            .join(file_name);

        if self.within_resource_dirs(&canonical) {
            Ok(canonical)
        } else {
            Err(denied())
        }
    }

    /// Write output data to a file path, with sandbox validation.
    fn write_output(
        &self,
        output_path: &Option<String>,
        data: &[u8],
    ) -> crate::error::Result<Option<String>> {
        let Some(path_str) = output_path else {
            return Ok(None);
        };
        let path = self.validate_output_path_access(path_str)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(&path, data)?;
        Ok(Some(path_str.clone()))
    }

    fn check_dpi(&self, dpi: i32) -> crate::error::Result<()> {
        if dpi > 0 && dpi as u32 > self.config.max_dpi {
            return Err(Error::DpiOutOfRange {
                dpi,
                max: self.config.max_dpi,
            });
        }
        Ok(())
    }

    pub async fn process_convert_to_image_archive(
        &self,
        params: &ConvertToImageArchiveParams,
    ) -> crate::error::Result<ConvertToImageArchiveResult> {
        let dpi = params.dpi.unwrap_or(0);
        self.check_dpi(dpi)?;

        let resolved = self.resolve_source(&params.source)?;
        let source_name = resolved.source_name.clone();

        let service = self.config.service.clone();
        let format = params.format.clone();
        let data = resolved.data;

        // Rasterization and encoding are CPU-bound
        let download = tokio::task::spawn_blocking(move || {
            service.image_archive_download(&data, format.as_deref(), dpi)
        })
        .await
        .map_err(|e| Error::Render {
            page: 0,
            reason: format!("Task join error: {}", e),
        })??;

        let entries = render::list_entries(&download.data)?;
        let output_path = self.write_output(&params.output_path, &download.data)?;
        let data_base64 = match output_path {
            Some(_) => None,
            None => Some(base64::engine::general_purpose::STANDARD.encode(&download.data)),
        };

        Ok(ConvertToImageArchiveResult {
            source: source_name,
            file_name: download.file_name,
            content_type: download.content_type,
            entries,
            size_bytes: download.data.len(),
            data_base64,
            output_path,
            error: None,
        })
    }

    pub async fn process_introspect_form(
        &self,
        source: &PdfSource,
        params: &IntrospectFormParams,
    ) -> crate::error::Result<IntrospectFormResult> {
        let resolved = self.resolve_source(source)?;
        let source_name = resolved.source_name.clone();

        // Cache if requested
        let cache_key = if params.cache {
            self.cache.insert(CachedDocument::new(
                resolved.data.clone(),
                resolved.file_name.clone(),
            ))
        } else {
            None
        };

        let service = self.config.service.clone();
        let data = resolved.data;
        let snapshot = tokio::task::spawn_blocking(move || service.introspect(&data))
            .await
            .map_err(|e| Error::Document {
                reason: format!("Task join error: {}", e),
            })??;

        Ok(IntrospectFormResult {
            source: source_name,
            cache_key,
            total_fields: snapshot.fields.len(),
            values: snapshot.values,
            fields: snapshot.fields,
            error: None,
        })
    }

    pub async fn process_fill_form(
        &self,
        params: &FillFormParams,
    ) -> crate::error::Result<FillFormResult> {
        let resolved = self.resolve_source(&params.source)?;
        let source_name = resolved.source_name.clone();
        let original_name = params
            .original_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(resolved.file_name);

        let service = self.config.service.clone();
        let values = params.values.clone();
        let data = resolved.data;

        let (download, report, output_page_count) = tokio::task::spawn_blocking(move || {
            let (download, report) = service.filled_download(&data, &values, &original_name)?;
            let output_page_count = FormDocument::load(&download.data)
                .map(|doc| doc.page_count() as u32)
                .unwrap_or(0);
            Ok::<_, Error>((download, report, output_page_count))
        })
        .await
        .map_err(|e| Error::Document {
            reason: format!("Task join error: {}", e),
        })??;

        // Always cache the output for chaining operations
        let output_cache_key = self
            .cache
            .insert(CachedDocument::new(
                download.data.clone(),
                download.file_name.clone(),
            ))
            .unwrap_or_default();

        let output_path = self.write_output(&params.output_path, &download.data)?;

        let fields_skipped = report
            .fields_skipped
            .into_iter()
            .map(|s| SkippedFieldInfo {
                name: s.name,
                reason: s.reason,
            })
            .collect();

        Ok(FillFormResult {
            source: source_name,
            file_name: download.file_name,
            content_type: download.content_type,
            output_cache_key,
            fields_filled: report.fields_filled,
            fields_skipped,
            output_page_count,
            output_path,
            error: None,
        })
    }
}

impl Default for PdfServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_handler]
impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "PDF forms server: introspect and fill AcroForm fields, and render pages \
                 into a zip archive of images. Filled PDFs are cached for chaining."
                    .into(),
            ),
        }
    }
}

/// Run the MCP server without resource directories
pub async fn run_server() -> Result<()> {
    run_server_with_config(ServerConfig::default()).await
}

/// Run the MCP server with specified resource directories
pub async fn run_server_with_dirs(resource_dirs: Vec<String>) -> Result<()> {
    run_server_with_config(ServerConfig {
        resource_dirs,
        ..ServerConfig::default()
    })
    .await
}

/// Run the MCP server with full configuration
pub async fn run_server_with_config(config: ServerConfig) -> Result<()> {
    let server = PdfServer::with_config(config);

    tracing::info!("PDF forms MCP Server ready, waiting for connections...");

    let service = server.serve(rmcp::transport::io::stdio()).await?;
    service.waiting().await?;

    Ok(())
}
