use crate::error::{ValidationError, Violation};
use crate::paths;
use crate::schema::{FieldKind, FieldSpec, KeyKind, Schema};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::fmt;

// ---------------------------------------------------------------------------
// ValidationMode
// ---------------------------------------------------------------------------

/// Permissive ignores fields the schema does not declare; strict reports them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    #[default]
    Permissive,
    Strict,
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationMode::Permissive => f.write_str("permissive"),
            ValidationMode::Strict => f.write_str("strict"),
        }
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

/// Validate `document` against `schema`.
///
/// Returns the normalized document (defaults applied, nulls on optional
/// fields resolved) or every violation found. Pure: no I/O.
pub fn validate(
    document: &Value,
    schema: &Schema,
    mode: ValidationMode,
) -> Result<Value, ValidationError> {
    let mut validator = Validator {
        mode,
        violations: Vec::new(),
    };
    let normalized = validator.object(document, &schema.fields, "");
    if validator.violations.is_empty() {
        Ok(normalized)
    } else {
        Err(ValidationError {
            schema: schema.name.clone(),
            violations: validator.violations,
        })
    }
}

struct Validator {
    mode: ValidationMode,
    violations: Vec<Violation>,
}

impl Validator {
    fn report(&mut self, path: &str, message: impl Into<String>) {
        self.violations.push(Violation {
            path: path.to_string(),
            message: message.into(),
        });
    }

    fn mismatch(&mut self, path: &str, expected: &str, found: &Value) {
        self.report(
            path,
            format!("expected {expected}, found {}", type_name(found)),
        );
    }

    fn check(&mut self, value: &Value, kind: &FieldKind, path: &str) -> Value {
        match kind {
            FieldKind::String => {
                if !value.is_string() {
                    self.mismatch(path, "string", value);
                }
            }
            FieldKind::Integer => {
                if !(value.is_i64() || value.is_u64()) {
                    self.mismatch(path, "integer", value);
                }
            }
            FieldKind::Number => {
                if !value.is_number() {
                    self.mismatch(path, "number", value);
                }
            }
            FieldKind::Ratio => match value.as_f64() {
                Some(n) if (0.0..=1.0).contains(&n) => {}
                Some(n) => self.report(path, format!("value {n} is outside 0.0..=1.0")),
                None => self.mismatch(path, "number", value),
            },
            FieldKind::Bool => {
                if !value.is_bool() {
                    self.mismatch(path, "boolean", value);
                }
            }
            FieldKind::Date => match value.as_str() {
                Some(s) if NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() => {}
                Some(s) => self.report(path, format!("invalid date '{s}' (expected YYYY-MM-DD)")),
                None => self.mismatch(path, "date string", value),
            },
            FieldKind::Email => match value.as_str() {
                Some(s) if paths::is_valid_email(s) => {}
                Some(s) => self.report(path, format!("invalid email address '{s}'")),
                None => self.mismatch(path, "email string", value),
            },
            FieldKind::Enum(allowed) => match value.as_str() {
                Some(s) if allowed.contains(&s) => {}
                Some(s) => self.report(
                    path,
                    format!("invalid value '{s}' (allowed: {})", allowed.join(", ")),
                ),
                None => self.mismatch(path, "one of the allowed strings", value),
            },
            FieldKind::List(inner) => {
                let Some(items) = value.as_sequence() else {
                    self.mismatch(path, "list", value);
                    return value.clone();
                };
                let checked = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.check(item, inner, &format!("{path}[{i}]")))
                    .collect();
                return Value::Sequence(checked);
            }
            FieldKind::Object(fields) => return self.object(value, fields, path),
            FieldKind::Map { key, value: inner } => return self.map(value, *key, inner, path),
            FieldKind::Any => {}
        }
        value.clone()
    }

    fn object(&mut self, value: &Value, fields: &[FieldSpec], path: &str) -> Value {
        let Some(map) = value.as_mapping() else {
            self.mismatch(path, "mapping", value);
            return value.clone();
        };

        let mut out = Mapping::new();
        for field in fields {
            let field_path = join(path, &field.name);
            match map.get(field.name.as_str()) {
                Some(v) if !v.is_null() => {
                    let checked = self.check(v, &field.kind, &field_path);
                    out.insert(Value::from(field.name.as_str()), checked);
                }
                _ if field.required => self.report(&field_path, "missing required field"),
                _ => {
                    if let Some(default) = &field.default {
                        // Run defaults through the checker so nested defaults apply.
                        let filled = self.check(default, &field.kind, &field_path);
                        out.insert(Value::from(field.name.as_str()), filled);
                    }
                }
            }
        }

        for (k, v) in map {
            let declared = k
                .as_str()
                .is_some_and(|k| fields.iter().any(|f| f.name == k));
            if declared {
                continue;
            }
            if self.mode == ValidationMode::Strict {
                self.report(&join(path, &key_label(k)), "unknown field");
            } else {
                out.insert(k.clone(), v.clone());
            }
        }
        Value::Mapping(out)
    }

    fn map(&mut self, value: &Value, key_kind: KeyKind, inner: &FieldKind, path: &str) -> Value {
        let Some(map) = value.as_mapping() else {
            self.mismatch(path, "mapping", value);
            return value.clone();
        };

        let mut out = Mapping::new();
        for (k, v) in map {
            let Some(key) = k.as_str() else {
                self.report(
                    &join(path, &key_label(k)),
                    format!("expected string key, found {}", type_name(k)),
                );
                continue;
            };
            let entry_path = join(path, key);
            match key_kind {
                KeyKind::Slug if !paths::is_valid_id(key) => self.report(
                    &entry_path,
                    "invalid id: must be lowercase alphanumeric with '-' or '_'",
                ),
                KeyKind::Email if !paths::is_valid_email(key) => {
                    self.report(&entry_path, format!("invalid email address '{key}'"))
                }
                _ => {}
            }
            let checked = self.check(v, inner, &entry_path);
            out.insert(k.clone(), checked);
        }
        Value::Mapping(out)
    }
}

fn join(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{path}.{segment}")
    }
}

fn key_label(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| type_name(other).to_string()),
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
