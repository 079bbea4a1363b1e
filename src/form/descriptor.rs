//! Field descriptors produced by form introspection

use super::kind::{self, FieldKind};
use super::names;
use schemars::JsonSchema;
use serde::Serialize;
use std::collections::BTreeMap;

/// One interactive form field as seen by a caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct FieldDescriptor {
    /// Field name with UI type suffixes removed
    pub display_name: String,
    /// Fully-qualified name, the key used when filling
    pub qualified_name: String,
    /// Current value (empty when unset)
    pub value: String,
    /// Field kind (`Tx`, `Ch`, `Btn`, `Sig`, or `Unknown`)
    pub kind: FieldKind,
    /// Derived label such as "Dropdown" or "Radio Button"
    type_label: String,
    /// Raw `/Ff` flag word
    flags: u32,
    /// Choice options in document order (empty unless `kind` is `Ch`)
    pub dropdown_options: Vec<String>,
    /// "On" state name for checkboxes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkbox_export_value: Option<String>,
}

impl FieldDescriptor {
    pub fn new(
        qualified_name: impl Into<String>,
        value: impl Into<String>,
        kind: FieldKind,
        flags: u32,
    ) -> Self {
        let qualified_name = qualified_name.into();
        Self {
            display_name: names::clean(&qualified_name),
            qualified_name,
            value: value.into(),
            kind,
            type_label: kind.label(flags).to_string(),
            flags,
            dropdown_options: Vec::new(),
            checkbox_export_value: None,
        }
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    pub fn type_label(&self) -> &str {
        &self.type_label
    }

    /// Replace the flag word, keeping the label in sync
    pub fn set_flags(&mut self, flags: u32) {
        self.flags = flags;
        self.type_label = self.kind.label(flags).to_string();
    }

    pub fn is_text_field(&self) -> bool {
        self.kind == FieldKind::Text
    }

    pub fn is_signature_field(&self) -> bool {
        self.kind == FieldKind::Signature
    }

    pub fn is_checkbox(&self) -> bool {
        kind::is_checkbox(self.kind, self.flags)
    }

    pub fn is_radio_button(&self) -> bool {
        kind::is_radio_button(self.kind, self.flags)
    }

    pub fn is_dropdown(&self) -> bool {
        kind::is_dropdown(self.kind, self.flags)
    }

    pub fn is_list_box(&self) -> bool {
        kind::is_list_box(self.kind, self.flags)
    }

    pub fn is_read_only(&self) -> bool {
        self.flags & kind::FLAG_READ_ONLY != 0
    }

    pub fn is_required(&self) -> bool {
        self.flags & kind::FLAG_REQUIRED != 0
    }
}

/// Result of one introspection pass over a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct FormSnapshot {
    /// Qualified field name -> current value
    pub values: BTreeMap<String, String>,
    /// One descriptor per terminal field, in field-tree order
    pub fields: Vec<FieldDescriptor>,
}

impl FormSnapshot {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, qualified_name: &str) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|f| f.qualified_name == qualified_name)
    }
}
