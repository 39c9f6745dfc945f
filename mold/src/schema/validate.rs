//! Structural validation of raw call arguments against a schema.
//!
//! Produces the coerced input record handed to a mold handler: declared fields only (unknown
//! keys are dropped), integral floats narrowed to integers, optional `null`s removed.

use serde_json::{Map, Value};
use thiserror::Error;

use super::{FieldType, SchemaDescriptor};

/// Field path used when the arguments themselves are not a JSON object.
pub(crate) const ARGUMENTS_PATH: &str = "<arguments>";

/// Structural validation failure; every variant names the offending field path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaValidationError {
    #[error("missing required field '{field}'")]
    MissingField { field: String },
    #[error("field '{field}' expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },
    #[error("field '{field}' expected {expected}, got '{value}'")]
    InvalidEnumValue {
        field: String,
        expected: String,
        value: String,
    },
}

impl SchemaValidationError {
    /// Path of the field the error is about (e.g. `city`, `location.lat`, `alerts[1]`).
    pub fn field(&self) -> &str {
        match self {
            Self::MissingField { field }
            | Self::TypeMismatch { field, .. }
            | Self::InvalidEnumValue { field, .. } => field,
        }
    }
}

/// Validates `raw` against `schema` and returns the coerced record.
pub fn validate(
    schema: &SchemaDescriptor,
    raw: &Value,
) -> Result<Map<String, Value>, SchemaValidationError> {
    validate_record(schema, raw, None)
}

fn validate_record(
    schema: &SchemaDescriptor,
    raw: &Value,
    prefix: Option<&str>,
) -> Result<Map<String, Value>, SchemaValidationError> {
    let Some(object) = raw.as_object() else {
        return Err(SchemaValidationError::TypeMismatch {
            field: prefix.unwrap_or(ARGUMENTS_PATH).to_string(),
            expected: "object".to_string(),
            actual: json_kind(raw).to_string(),
        });
    };

    let mut out = Map::new();
    for spec in schema.fields() {
        let path = match prefix {
            Some(p) => format!("{}.{}", p, spec.name),
            None => spec.name.clone(),
        };
        match object.get(&spec.name) {
            None | Some(Value::Null) => {
                if spec.required {
                    return Err(SchemaValidationError::MissingField { field: path });
                }
            }
            Some(value) => {
                let coerced = coerce(&spec.ty, value, &path)?;
                out.insert(spec.name.clone(), coerced);
            }
        }
    }
    Ok(out)
}

/// Validates one value written to a field of type `ty`; errors name `field`.
pub fn validate_field(
    ty: &FieldType,
    field: &str,
    value: &Value,
) -> Result<Value, SchemaValidationError> {
    coerce(ty, value, field)
}

fn coerce(ty: &FieldType, value: &Value, path: &str) -> Result<Value, SchemaValidationError> {
    let mismatch = || SchemaValidationError::TypeMismatch {
        field: path.to_string(),
        expected: ty.to_string(),
        actual: json_kind(value).to_string(),
    };
    match ty {
        FieldType::String if value.is_string() => Ok(value.clone()),
        FieldType::Number if value.is_number() => Ok(value.clone()),
        FieldType::Boolean if value.is_boolean() => Ok(value.clone()),
        FieldType::Integer => {
            if value.is_i64() || value.is_u64() {
                return Ok(value.clone());
            }
            match value.as_f64() {
                Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                    Ok(Value::from(f as i64))
                }
                _ => Err(mismatch()),
            }
        }
        FieldType::Enum { values } => match value.as_str() {
            Some(s) if values.iter().any(|v| v == s) => Ok(value.clone()),
            Some(s) => Err(SchemaValidationError::InvalidEnumValue {
                field: path.to_string(),
                expected: ty.to_string(),
                value: s.to_string(),
            }),
            None => Err(mismatch()),
        },
        FieldType::Record { schema } => {
            validate_record(schema, value, Some(path)).map(Value::Object)
        }
        FieldType::List { items } => {
            let Some(elements) = value.as_array() else {
                return Err(mismatch());
            };
            elements
                .iter()
                .enumerate()
                .map(|(i, el)| coerce(items, el, &format!("{}[{}]", path, i)))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        _ => Err(mismatch()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn weather_schema() -> SchemaDescriptor {
        SchemaDescriptor::builder()
            .required("city", FieldType::String)
            .required("temperature", FieldType::Number)
            .required("status", FieldType::enumeration(["success", "error"]))
            .optional("alerts", FieldType::list(FieldType::String))
            .build()
            .unwrap()
    }

    /// **Scenario**: Valid input passes; unknown keys are dropped.
    #[test]
    fn valid_input_passes_and_drops_unknown_fields() {
        let out = validate(
            &weather_schema(),
            &json!({"city": "Seattle", "temperature": 61.0, "status": "success", "humidity": 80}),
        )
        .unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out["city"], "Seattle");
        assert!(out.get("humidity").is_none());
    }

    /// **Scenario**: Missing required field names the field.
    #[test]
    fn missing_required_field_is_named() {
        let err = validate(
            &weather_schema(),
            &json!({"temperature": 61.0, "status": "success"}),
        )
        .unwrap_err();
        assert_eq!(
            err,
            SchemaValidationError::MissingField {
                field: "city".into()
            }
        );
    }

    /// **Scenario**: A string given to a number field reports field and expected type.
    #[test]
    fn type_mismatch_names_field_and_expected_type() {
        let err = validate(
            &weather_schema(),
            &json!({"city": "Seattle", "temperature": "61", "status": "success"}),
        )
        .unwrap_err();
        assert_eq!(err.field(), "temperature");
        let msg = err.to_string();
        assert!(msg.contains("number"), "{}", msg);
        assert!(msg.contains("string"), "{}", msg);
    }

    #[test]
    fn enum_value_outside_literals_is_rejected() {
        let err = validate(
            &weather_schema(),
            &json!({"city": "Seattle", "temperature": 1, "status": "maybe"}),
        )
        .unwrap_err();
        assert!(matches!(err, SchemaValidationError::InvalidEnumValue { ref value, .. } if value == "maybe"));
    }

    /// **Scenario**: null on an optional field counts as absent; null on a required one is missing.
    #[test]
    fn null_optional_is_absent() {
        let out = validate(
            &weather_schema(),
            &json!({"city": "X", "temperature": 1, "status": "error", "alerts": null}),
        )
        .unwrap();
        assert!(!out.contains_key("alerts"));
        let err = validate(
            &weather_schema(),
            &json!({"city": null, "temperature": 1, "status": "error"}),
        )
        .unwrap_err();
        assert_eq!(err.field(), "city");
    }

    /// **Scenario**: Nested records and list elements report full paths.
    #[test]
    fn nested_paths_are_reported() {
        let location = SchemaDescriptor::builder()
            .required("lat", FieldType::Number)
            .build()
            .unwrap();
        let schema = SchemaDescriptor::builder()
            .required("location", FieldType::record(location))
            .required("counts", FieldType::list(FieldType::Integer))
            .build()
            .unwrap();

        let err = validate(&schema, &json!({"location": {}, "counts": []})).unwrap_err();
        assert_eq!(err.field(), "location.lat");

        let err = validate(
            &schema,
            &json!({"location": {"lat": 1.5}, "counts": [1, "two"]}),
        )
        .unwrap_err();
        assert_eq!(err.field(), "counts[1]");
    }

    /// **Scenario**: Integral floats are coerced into integer fields; fractions are not.
    #[test]
    fn integer_coercion() {
        let schema = SchemaDescriptor::builder()
            .required("n", FieldType::Integer)
            .build()
            .unwrap();
        let out = validate(&schema, &json!({"n": 3.0})).unwrap();
        assert_eq!(out["n"], json!(3));
        assert!(validate(&schema, &json!({"n": 3.5})).is_err());
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        let err = validate(&weather_schema(), &json!([1, 2])).unwrap_err();
        assert_eq!(err.field(), ARGUMENTS_PATH);
    }
}
