//! Required-on-status gate for status changes.

use super::{MissingField, MissingRequiredFields, ProjectFieldView};
use serde_json::Value;
use std::collections::BTreeMap;

/// Returns `true` for values that count as not filled in.
#[must_use]
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(entries)) => entries.is_empty(),
        Some(Value::Bool(_) | Value::Number(_)) => false,
    }
}

/// Checks that every field required on a target status is filled.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredFieldsCheck;

impl RequiredFieldsCheck {
    /// Verifies `fields` against the projection for `target_status`.
    ///
    /// # Errors
    ///
    /// Returns [`MissingRequiredFields`] listing every projected field that
    /// is required on `target_status` and missing or empty.
    pub fn verify(
        projection: &[ProjectFieldView],
        fields: &BTreeMap<String, Value>,
        target_status: i32,
    ) -> Result<(), MissingRequiredFields> {
        let missing: Vec<MissingField> = projection
            .iter()
            .filter(|view| view.required_on(target_status))
            .filter(|view| is_empty_value(fields.get(view.hash().as_str())))
            .map(|view| MissingField {
                hash: view.hash().as_str().to_owned(),
                name: view.name().to_owned(),
            })
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(MissingRequiredFields {
                status: target_status,
                fields: missing,
            })
        }
    }
}
