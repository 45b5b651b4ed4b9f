//! Typed coercion of raw task field values.

use super::{FieldDataType, FieldValueError, ProjectFieldView};
use crate::shared::validation::is_email;
use chrono::DateTime;
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;
use uuid::Uuid;

#[expect(clippy::expect_used, reason = "static pattern is known to compile")]
static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\[[^\]]*\]\((https?://|//|/)?[A-Za-z0-9_\-]*:?[A-Za-z0-9_\-]*@?[A-Za-z0-9]+([\-.][a-z0-9]+)*\.[a-z]{2,5}(:[0-9]{1,5})?(/.*)?\)$",
    )
    .expect("link pattern")
});

/// Offset of the time part in an RFC 3339 timestamp.
const TIME_OFFSET: usize = 11;

/// Coerced field values split into writes and removals.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilteredFields {
    /// Values to store, keyed by hash.
    pub set: BTreeMap<String, Value>,
    /// Hashes whose value is removed.
    pub removed: BTreeSet<String>,
}

/// Converts raw JSON values to their field type.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldValueFilter;

impl FieldValueFilter {
    /// Coerces every raw value against the project's projected fields.
    ///
    /// `null` marks a value for removal.
    ///
    /// # Errors
    ///
    /// Returns [`FieldValueError`] for the first value of the wrong shape, or
    /// lists the keys that are not projected onto the project.
    pub fn filter(
        projection: &[ProjectFieldView],
        raw: &BTreeMap<String, Value>,
    ) -> Result<FilteredFields, FieldValueError> {
        let mut filtered = FilteredFields::default();
        if raw.is_empty() {
            return Ok(filtered);
        }

        let unknown: Vec<String> = raw
            .keys()
            .filter(|key| !projection.iter().any(|view| view.hash().as_str() == key.as_str()))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            if projection.is_empty() {
                return Err(FieldValueError::NoProjectFields);
            }
            return Err(FieldValueError::NotProjected(unknown));
        }

        for view in projection {
            let hash = view.hash().as_str();
            let Some(value) = raw.get(hash) else {
                continue;
            };
            if value.is_null() {
                filtered.removed.insert(hash.to_owned());
                continue;
            }
            let coerced = coerce(view, value)?;
            filtered.set.insert(hash.to_owned(), coerced);
        }
        Ok(filtered)
    }
}

fn coerce(view: &ProjectFieldView, value: &Value) -> Result<Value, FieldValueError> {
    let wrong_type = |expected: &'static str| FieldValueError::WrongType {
        name: view.name().to_owned(),
        hash: view.hash().as_str().to_owned(),
        expected,
    };
    let invalid = |detail: String| FieldValueError::InvalidValue {
        name: view.name().to_owned(),
        hash: view.hash().as_str().to_owned(),
        detail,
    };

    match view.data_type() {
        FieldDataType::Integer => value.as_i64().map(Value::from).ok_or_else(|| wrong_type("integer")),
        FieldDataType::Phone => value
            .as_i64()
            .map(Value::from)
            .ok_or_else(|| wrong_type("integer (phone)")),
        FieldDataType::Float => value.as_f64().map(Value::from).ok_or_else(|| wrong_type("float")),
        FieldDataType::String => string_value(value).ok_or_else(|| wrong_type("string")),
        FieldDataType::Text => string_value(value).ok_or_else(|| wrong_type("text")),
        FieldDataType::Bool => value.as_bool().map(Value::from).ok_or_else(|| wrong_type("bool")),
        FieldDataType::Switch => match value.as_i64() {
            Some(choice @ 0..=2) => Ok(Value::from(choice)),
            Some(other) => Err(invalid(format!("must be switch (0|1|2), got {other}"))),
            None => Err(wrong_type("switch (0|1|2)")),
        },
        FieldDataType::Array => {
            let items = value.as_array().ok_or_else(|| wrong_type("array"))?;
            Ok(Value::from(items.iter().map(stringify).collect::<Vec<_>>()))
        }
        FieldDataType::Link => {
            let text = value.as_str().ok_or_else(|| wrong_type("string"))?;
            if LINK_PATTERN.is_match(text) {
                Ok(Value::from(text))
            } else {
                Err(invalid("should be link [text](url)".to_owned()))
            }
        }
        FieldDataType::Email => {
            let text = value.as_str().ok_or_else(|| wrong_type("string"))?;
            if is_email(text) {
                Ok(Value::from(text))
            } else {
                Err(invalid("should be email".to_owned()))
            }
        }
        FieldDataType::Time => {
            let text = value.as_str().ok_or_else(|| wrong_type("string"))?;
            DateTime::parse_from_rfc3339(text).map_err(|err| invalid(err.to_string()))?;
            let time = text.get(TIME_OFFSET..).unwrap_or_default();
            Ok(Value::from(time))
        }
        FieldDataType::DateTime => {
            let text = value.as_str().ok_or_else(|| wrong_type("string"))?;
            DateTime::parse_from_rfc3339(text).map_err(|err| invalid(err.to_string()))?;
            Ok(Value::from(text))
        }
        FieldDataType::People => {
            let items = value.as_array().ok_or_else(|| wrong_type("array"))?;
            let emails = items
                .iter()
                .map(|item| {
                    let email = stringify(item);
                    if is_email(&email) {
                        Ok(email)
                    } else {
                        Err(invalid(format!("{email} should be email")))
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::from(emails))
        }
        FieldDataType::Data => {
            let text = value.as_str().ok_or_else(|| wrong_type("identifier"))?;
            parse_identifier(text).map(Value::from).map_err(invalid)
        }
        FieldDataType::DataArray => {
            let items = value.as_array().ok_or_else(|| wrong_type("array"))?;
            let identifiers = items
                .iter()
                .map(|item| {
                    item.as_str()
                        .ok_or_else(|| "identifiers must be strings".to_owned())
                        .and_then(parse_identifier)
                })
                .collect::<Result<Vec<_>, _>>()
                .map_err(invalid)?;
            Ok(Value::from(identifiers))
        }
    }
}

fn string_value(value: &Value) -> Option<Value> {
    value.as_str().map(Value::from)
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn parse_identifier(text: &str) -> Result<String, String> {
    Uuid::parse_str(text)
        .map(|id| id.to_string())
        .map_err(|err| format!("'{text}' is not an identifier: {err}"))
}
