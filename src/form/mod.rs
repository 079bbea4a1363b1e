//! Interactive form (AcroForm) layer
//!
//! Field classification and name cleanup are pure functions; introspection
//! and filling work on a [`FormDocument`] backed by lopdf.

mod descriptor;
mod document;
mod fill;
mod introspect;
pub mod kind;
pub mod names;

pub use descriptor::{FieldDescriptor, FormSnapshot};
pub use document::{decode_text_string, encode_text_string, FieldNode, FormDocument, OFF_STATE};
pub use fill::{fill, resolve_checkbox_value, FillReport, SkippedField, DEFAULT_EXPORT_VALUE};
pub use introspect::introspect;
pub use kind::{label_for, FieldKind};
