//! Writing values into form fields

use super::document::{FieldNode, FormDocument, OFF_STATE};
use super::kind::{self, FieldKind};
use crate::error::Result;
use std::collections::{HashMap, HashSet};

/// Export value assumed for checkboxes that define no "on" appearance
pub const DEFAULT_EXPORT_VALUE: &str = "Yes";

const FALSY: [&str; 2] = ["false", "off"];
const TRUTHY: [&str; 2] = ["true", "on"];

/// Summary of a fill pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    /// Number of field writes performed
    pub fields_filled: u32,
    /// Requested names that were not written
    pub fields_skipped: Vec<SkippedField>,
}

/// A requested field that was not written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedField {
    pub name: String,
    pub reason: String,
}

/// Map a caller-supplied checkbox value onto the field's two states.
///
/// The rules are checked in order; anything unrecognized counts as checked.
pub fn resolve_checkbox_value<'a>(
    candidate: &str,
    export_value: &'a str,
    off_token: &'a str,
) -> &'a str {
    let export_value = if export_value.trim().is_empty() {
        DEFAULT_EXPORT_VALUE
    } else {
        export_value
    };
    let is = |token: &str| candidate.eq_ignore_ascii_case(token);

    if candidate.is_empty() || FALSY.iter().any(|t| is(*t)) {
        off_token
    } else if TRUTHY.iter().any(|t| is(*t)) || is(export_value) {
        export_value
    } else if is(off_token) {
        off_token
    } else {
        export_value
    }
}

/// Apply `edits` (qualified name -> value) to the document's fields.
///
/// Unknown names are reported in the returned summary but never fail the
/// call. Marks the form so readers regenerate appearances; serialization
/// is left to the caller.
pub fn fill(doc: &mut FormDocument, edits: &HashMap<String, String>) -> Result<FillReport> {
    let mut report = FillReport::default();

    let Some(nodes) = doc.fields()? else {
        tracing::debug!("document has no interactive form, nothing to fill");
        report.fields_skipped = not_found(edits.keys());
        return Ok(report);
    };
    doc.set_need_appearances()?;

    let mut matched = HashSet::new();
    for node in &nodes {
        let Some(value) = edits.get(&node.qualified_name) else {
            continue;
        };
        matched.insert(node.qualified_name.as_str());

        match write_field(doc, node, value)? {
            None => report.fields_filled += 1,
            Some(reason) => report.fields_skipped.push(SkippedField {
                name: node.qualified_name.clone(),
                reason: reason.to_string(),
            }),
        }
    }

    report.fields_skipped.extend(not_found(
        edits.keys().filter(|name| !matched.contains(name.as_str())),
    ));
    tracing::debug!(
        filled = report.fields_filled,
        skipped = report.fields_skipped.len(),
        "form filled"
    );
    Ok(report)
}

/// Write one field; returns the reason when the field is not writable
fn write_field(
    doc: &mut FormDocument,
    node: &FieldNode,
    value: &str,
) -> Result<Option<&'static str>> {
    match node.kind {
        FieldKind::Signature => return Ok(Some("Signature fields are not writable")),
        FieldKind::Button if kind::is_push_button(node.kind, node.flags) => {
            return Ok(Some("Push buttons have no value"))
        }
        FieldKind::Button if kind::is_radio_button(node.kind, node.flags) => {
            let state = if value.is_empty() { OFF_STATE } else { value };
            doc.set_button_state(node, state)?;
        }
        FieldKind::Button => {
            let export_value = doc
                .on_state(node)
                .unwrap_or_else(|| DEFAULT_EXPORT_VALUE.to_string());
            let state = resolve_checkbox_value(value, &export_value, OFF_STATE).to_string();
            doc.set_button_state(node, &state)?;
        }
        FieldKind::Choice => write_choice(doc, node, value)?,
        FieldKind::Text | FieldKind::Unknown => {
            doc.set_text_value(node, value)?;
        }
    }
    Ok(None)
}

/// Choice values are written verbatim, except that a multi-select field
/// keeps its selection array: an unchanged value is left alone, and a
/// ", "-joined list of listed options becomes an array again.
fn write_choice(doc: &mut FormDocument, node: &FieldNode, value: &str) -> Result<()> {
    if !kind::is_multi_select(node.kind, node.flags) {
        return doc.set_text_value(node, value);
    }
    if doc.field_value(node) == value {
        return Ok(());
    }

    let options = doc.choice_options(node).unwrap_or_default();
    let parts: Vec<&str> = value.split(", ").collect();
    if parts.len() > 1 && parts.iter().all(|part| options.iter().any(|o| o == part)) {
        doc.set_selected_options(node, &parts)
    } else {
        doc.set_text_value(node, value)
    }
}

fn not_found<'a>(names: impl Iterator<Item = &'a String>) -> Vec<SkippedField> {
    let mut names: Vec<&String> = names.collect();
    names.sort();
    names
        .into_iter()
        .map(|name| SkippedField {
            name: name.clone(),
            reason: "Field not found in PDF".to_string(),
        })
        .collect()
}
