//! Object-level access to a PDF's interactive form
//!
//! `FormDocument` owns a parsed `lopdf::Document` and exposes the field tree
//! flattened to terminal fields, with the inheritable attributes (`/FT`,
//! `/Ff`, `/V`) already resolved against their ancestors.

use super::kind::FieldKind;
use crate::error::{Error, Result};
use encoding_rs::{UTF_16BE, WINDOWS_1252};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use std::collections::HashSet;

/// Canonical "unchecked" appearance state for buttons
pub const OFF_STATE: &str = "Off";

/// Field trees deeper than this are treated as malformed
const MAX_FIELD_DEPTH: usize = 32;

/// A terminal field of the flattened field tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNode {
    /// Object holding the field dictionary
    pub id: ObjectId,
    /// Dotted path from the field-tree root
    pub qualified_name: String,
    /// Field kind from the nearest `/FT`
    pub kind: FieldKind,
    /// Flag word from the nearest `/Ff`
    pub flags: u32,
    /// Widget annotations; the field itself when field and widget are merged
    pub widgets: Vec<ObjectId>,
    /// Nearest node (self or ancestor) carrying a `/V` entry
    value_holder: Option<ObjectId>,
}

/// Attributes handed down the field tree
#[derive(Clone, Copy)]
struct Inherited<'a> {
    name: Option<&'a str>,
    kind: Option<FieldKind>,
    flags: Option<u32>,
    value_holder: Option<ObjectId>,
}

/// A loaded PDF with form-level helpers
pub struct FormDocument {
    doc: Document,
}

impl FormDocument {
    /// Parse PDF bytes
    pub fn load(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::InvalidInput {
                reason: "PDF data is empty".to_string(),
            });
        }
        if data.len() < 4 || &data[0..4] != b"%PDF" {
            return Err(Error::Document {
                reason: "Not a valid PDF file".to_string(),
            });
        }

        let doc = Document::load_mem(data)?;
        Ok(Self { doc })
    }

    pub fn from_document(doc: Document) -> Self {
        Self { doc }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Serialize the document, including any edits made through this wrapper
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.doc.save_to(&mut out)?;
        Ok(out)
    }

    /// The AcroForm dictionary, or `None` for documents without a form
    pub fn acroform(&self) -> Result<Option<&Dictionary>> {
        let catalog = self.doc.catalog()?;
        let Ok(entry) = catalog.get(b"AcroForm") else {
            return Ok(None);
        };
        match self.resolve(entry)? {
            Object::Dictionary(dict) => Ok(Some(dict)),
            _ => Ok(None),
        }
    }

    pub fn has_form(&self) -> bool {
        matches!(self.acroform(), Ok(Some(_)))
    }

    /// Flatten the field tree into its terminal fields, in document order.
    ///
    /// Returns `None` when the document has no AcroForm. Dangling or
    /// non-dictionary field references are skipped.
    pub fn fields(&self) -> Result<Option<Vec<FieldNode>>> {
        let Some(acroform) = self.acroform()? else {
            return Ok(None);
        };
        let Ok(fields) = acroform.get(b"Fields") else {
            return Ok(Some(Vec::new()));
        };
        let roots = self.resolve(fields)?.as_array().map_err(|_| Error::Document {
            reason: "AcroForm /Fields is not an array".to_string(),
        })?;

        let root = Inherited {
            name: None,
            kind: None,
            flags: None,
            value_holder: None,
        };
        let mut visited = HashSet::new();
        let mut nodes = Vec::new();
        for entry in roots {
            match entry {
                Object::Reference(id) => self.collect(*id, root, 0, &mut visited, &mut nodes),
                _ => tracing::debug!("skipping direct field dictionary in /Fields"),
            }
        }
        Ok(Some(nodes))
    }

    fn collect(
        &self,
        id: ObjectId,
        inherited: Inherited<'_>,
        depth: usize,
        visited: &mut HashSet<ObjectId>,
        out: &mut Vec<FieldNode>,
    ) {
        if depth > MAX_FIELD_DEPTH || !visited.insert(id) {
            tracing::debug!(object = ?id, "field tree cycle or excessive depth");
            return;
        }
        let Ok(dict) = self.doc.get_dictionary(id) else {
            tracing::debug!(object = ?id, "field reference does not point to a dictionary");
            return;
        };

        let partial = dict.get(b"T").ok().and_then(|t| self.text_of(t));
        let qualified = match (inherited.name, partial) {
            (Some(parent), Some(part)) => format!("{}.{}", parent, part),
            (None, Some(part)) => part,
            (Some(parent), None) => parent.to_string(),
            (None, None) => String::new(),
        };
        let kind = dict
            .get(b"FT")
            .and_then(Object::as_name)
            .map(|code| FieldKind::from_code(&String::from_utf8_lossy(code)))
            .ok()
            .or(inherited.kind);
        let flags = dict
            .get(b"Ff")
            .and_then(Object::as_i64)
            .map(|ff| ff as u32)
            .ok()
            .or(inherited.flags);
        let value_holder = if dict.has(b"V") {
            Some(id)
        } else {
            inherited.value_holder
        };

        let kids: Vec<ObjectId> = dict
            .get(b"Kids")
            .ok()
            .and_then(|kids| self.resolve(kids).ok())
            .and_then(|kids| kids.as_array().ok())
            .map(|kids| kids.iter().filter_map(|k| k.as_reference().ok()).collect())
            .unwrap_or_default();
        let (field_kids, widget_kids): (Vec<ObjectId>, Vec<ObjectId>) = kids
            .into_iter()
            .partition(|kid| self.is_field_dictionary(*kid));

        if field_kids.is_empty() {
            let widgets = if widget_kids.is_empty() {
                vec![id]
            } else {
                widget_kids
            };
            out.push(FieldNode {
                id,
                qualified_name: qualified,
                kind: kind.unwrap_or(FieldKind::Unknown),
                flags: flags.unwrap_or(0),
                widgets,
                value_holder,
            });
            return;
        }

        let passed = Inherited {
            name: Some(&qualified),
            kind,
            flags,
            value_holder,
        };
        for kid in field_kids {
            self.collect(kid, passed, depth + 1, visited, out);
        }
    }

    /// Kids with a partial name are fields; the rest are widget annotations
    fn is_field_dictionary(&self, id: ObjectId) -> bool {
        self.doc
            .get_dictionary(id)
            .map(|d| d.has(b"T"))
            .unwrap_or(false)
    }

    /// Current value of a field rendered as text.
    ///
    /// Buttons without a `/V` report their widget state (or "Off") so that
    /// writing the reported value back is a no-op.
    pub fn field_value(&self, node: &FieldNode) -> String {
        let value = node
            .value_holder
            .and_then(|holder| self.doc.get_dictionary(holder).ok())
            .and_then(|dict| dict.get(b"V").ok())
            .and_then(|v| self.resolve(v).ok());

        match (value, node.kind) {
            (Some(value), _) => self.value_text(value),
            (None, FieldKind::Button) => self
                .widget_state(node)
                .unwrap_or_else(|| OFF_STATE.to_string()),
            (None, _) => String::new(),
        }
    }

    fn value_text(&self, value: &Object) -> String {
        match value {
            Object::Array(items) => items
                .iter()
                .filter_map(|item| self.resolve(item).ok())
                .map(|item| self.value_text(item))
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            Object::Integer(i) => i.to_string(),
            other => self.text_of(other).unwrap_or_default(),
        }
    }

    /// First "on" appearance state selected on any widget
    fn widget_state(&self, node: &FieldNode) -> Option<String> {
        node.widgets.iter().find_map(|widget| {
            let state = self
                .doc
                .get_dictionary(*widget)
                .ok()?
                .get(b"AS")
                .and_then(Object::as_name)
                .ok()?;
            (state != OFF_STATE.as_bytes()).then(|| String::from_utf8_lossy(state).into_owned())
        })
    }

    /// Option export values of a choice field's `/Opt` array.
    ///
    /// A missing `/Opt` yields no options; a malformed one is an error.
    pub fn choice_options(&self, node: &FieldNode) -> Result<Vec<String>> {
        let dict = self.doc.get_dictionary(node.id)?;
        let Ok(opt) = dict.get(b"Opt") else {
            return Ok(Vec::new());
        };
        let entries = self.resolve(opt)?.as_array().map_err(|_| Error::Document {
            reason: format!("/Opt of field '{}' is not an array", node.qualified_name),
        })?;

        entries
            .iter()
            .map(|entry| {
                let entry = self.resolve(entry)?;
                // [export display] pairs: /V holds the export value
                let shown = match entry {
                    Object::Array(pair) => pair.first(),
                    other => Some(other),
                };
                shown
                    .and_then(|s| self.resolve(s).ok())
                    .and_then(|s| match s {
                        Object::String(bytes, _) => Some(decode_text_string(bytes)),
                        _ => None,
                    })
                    .ok_or_else(|| Error::Document {
                        reason: format!(
                            "unexpected /Opt entry in field '{}'",
                            node.qualified_name
                        ),
                    })
            })
            .collect()
    }

    /// Appearance state names a widget defines in its `/AP /N` dictionary
    pub fn appearance_states(&self, widget: ObjectId) -> Vec<String> {
        self.doc
            .get_dictionary(widget)
            .ok()
            .and_then(|dict| dict.get(b"AP").ok())
            .and_then(|ap| self.resolve(ap).ok())
            .and_then(|ap| ap.as_dict().ok())
            .and_then(|ap| ap.get(b"N").ok())
            .and_then(|normal| self.resolve(normal).ok())
            .and_then(|normal| normal.as_dict().ok())
            .map(|normal| {
                normal
                    .iter()
                    .map(|(state, _)| String::from_utf8_lossy(state).into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The "on" state of a two-state button, if any widget defines one
    pub fn on_state(&self, node: &FieldNode) -> Option<String> {
        node.widgets.iter().find_map(|widget| {
            self.appearance_states(*widget)
                .into_iter()
                .find(|state| state != OFF_STATE)
        })
    }

    /// Write a text string to a field's `/V`
    pub fn set_text_value(&mut self, node: &FieldNode, value: &str) -> Result<()> {
        let format = if value.is_ascii() {
            StringFormat::Literal
        } else {
            StringFormat::Hexadecimal
        };
        self.field_dict_mut(node.id)?
            .set("V", Object::String(encode_text_string(value), format));
        Ok(())
    }

    /// Write several selected options to a multi-select choice field's `/V`
    pub fn set_selected_options(&mut self, node: &FieldNode, values: &[&str]) -> Result<()> {
        let items = values
            .iter()
            .map(|value| {
                let format = if value.is_ascii() {
                    StringFormat::Literal
                } else {
                    StringFormat::Hexadecimal
                };
                Object::String(encode_text_string(value), format)
            })
            .collect::<Vec<_>>();
        self.field_dict_mut(node.id)?.set("V", Object::Array(items));
        Ok(())
    }

    /// Select a button state: `/V` on the field and `/AS` on every widget
    /// that has appearances (the state itself where defined, "Off" elsewhere)
    pub fn set_button_state(&mut self, node: &FieldNode, state: &str) -> Result<()> {
        let widget_states: Vec<(ObjectId, Vec<String>)> = node
            .widgets
            .iter()
            .map(|widget| (*widget, self.appearance_states(*widget)))
            .collect();

        self.field_dict_mut(node.id)?
            .set("V", Object::Name(state.as_bytes().to_vec()));

        for (widget, states) in widget_states {
            if states.is_empty() {
                continue;
            }
            let selected = if states.iter().any(|s| s == state) {
                state
            } else {
                OFF_STATE
            };
            self.field_dict_mut(widget)?
                .set("AS", Object::Name(selected.as_bytes().to_vec()));
        }
        Ok(())
    }

    /// Ask readers to regenerate field appearances from the values.
    ///
    /// Returns `false` when the document has no AcroForm.
    pub fn set_need_appearances(&mut self) -> Result<bool> {
        let root = self.doc.trailer.get(b"Root")?.as_reference()?;
        let acroform = match self.doc.get_dictionary(root)?.get(b"AcroForm") {
            Ok(Object::Reference(id)) => Some(*id),
            Ok(Object::Dictionary(_)) => None,
            _ => return Ok(false),
        };

        let dict = match acroform {
            Some(id) => self.field_dict_mut(id)?,
            None => self
                .field_dict_mut(root)?
                .get_mut(b"AcroForm")
                .and_then(Object::as_dict_mut)?,
        };
        dict.set("NeedAppearances", Object::Boolean(true));
        Ok(true)
    }

    fn field_dict_mut(&mut self, id: ObjectId) -> Result<&mut Dictionary> {
        Ok(self.doc.get_object_mut(id)?.as_dict_mut()?)
    }

    fn resolve<'a>(&'a self, object: &'a Object) -> Result<&'a Object> {
        match object {
            Object::Reference(id) => Ok(self.doc.get_object(*id)?),
            other => Ok(other),
        }
    }

    fn text_of(&self, object: &Object) -> Option<String> {
        match self.resolve(object).ok()? {
            Object::String(bytes, _) => Some(decode_text_string(bytes)),
            Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
            _ => None,
        }
    }
}

/// Decode a PDF text string: UTF-16BE or UTF-8 with BOM, else
/// PDFDocEncoding (its Latin range is approximated with Windows-1252)
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return UTF_16BE.decode_without_bom_handling(utf16).0.into_owned();
    }
    if let Some(utf8) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(utf8).into_owned();
    }
    WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned()
}

/// Encode a text string: plain bytes for ASCII, UTF-16BE with BOM otherwise
pub fn encode_text_string(text: &str) -> Vec<u8> {
    if text.is_ascii() {
        return text.as_bytes().to_vec();
    }
    let mut bytes = vec![0xFE, 0xFF];
    bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
    bytes
}
