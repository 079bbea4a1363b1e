//! Read-only form introspection

use super::descriptor::{FieldDescriptor, FormSnapshot};
use super::document::FormDocument;
use super::fill::DEFAULT_EXPORT_VALUE;
use super::kind::FieldKind;
use crate::error::Result;

/// Describe every terminal field of the document's form.
///
/// Documents without an AcroForm produce an empty snapshot. A malformed
/// choice field degrades to an empty option list and the pass continues.
pub fn introspect(doc: &FormDocument) -> Result<FormSnapshot> {
    let Some(nodes) = doc.fields()? else {
        tracing::debug!("document has no interactive form");
        return Ok(FormSnapshot::default());
    };

    let mut snapshot = FormSnapshot::default();
    for node in nodes {
        let value = doc.field_value(&node);
        let mut field = FieldDescriptor::new(
            node.qualified_name.clone(),
            value.clone(),
            node.kind,
            node.flags,
        );

        match node.kind {
            FieldKind::Choice => {
                field.dropdown_options = doc.choice_options(&node).unwrap_or_else(|e| {
                    tracing::debug!(
                        field = %node.qualified_name,
                        error = %e,
                        "could not extract choice options"
                    );
                    Vec::new()
                });
            }
            FieldKind::Button if field.is_checkbox() => {
                field.checkbox_export_value = Some(
                    doc.on_state(&node)
                        .unwrap_or_else(|| DEFAULT_EXPORT_VALUE.to_string()),
                );
            }
            _ => {}
        }

        snapshot.values.insert(node.qualified_name, value);
        snapshot.fields.push(field);
    }

    tracing::debug!(fields = snapshot.fields.len(), "form introspected");
    Ok(snapshot)
}
