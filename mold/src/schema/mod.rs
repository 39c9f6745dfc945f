//! Schema descriptors: the declared input shape of a mold.
//!
//! A [`SchemaDescriptor`] is an ordered list of uniquely named fields, each with a
//! [`FieldType`] tag and an optionality flag. It is built once (usually from
//! [`MoldInput::input_type`]) and is immutable afterwards. Validation of model arguments lives
//! in [`validate`]; the JSON Schema rendering published to the model lives in `json_schema`.

mod json_schema;
mod validate;

pub use validate::{validate, validate_field, SchemaValidationError};

use std::collections::BTreeSet;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Type tag of one field.
///
/// Two tags are compatible when they are structurally equal; enum tags compare as sets of
/// literals, so `enum(success, error)` equals `enum(error, success)`.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    /// One of a fixed set of string literals.
    Enum { values: Vec<String> },
    /// Nested record with its own fields.
    Record { schema: SchemaDescriptor },
    /// Collection of elements of one type. Collection fields merge by appending.
    List { items: Box<FieldType> },
}

impl FieldType {
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enum {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn list(items: FieldType) -> Self {
        Self::List {
            items: Box::new(items),
        }
    }

    pub fn record(schema: SchemaDescriptor) -> Self {
        Self::Record { schema }
    }

    /// True for collection types (merged by append).
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::List { .. })
    }
}

impl PartialEq for FieldType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String, Self::String)
            | (Self::Number, Self::Number)
            | (Self::Integer, Self::Integer)
            | (Self::Boolean, Self::Boolean) => true,
            (Self::Enum { values: a }, Self::Enum { values: b }) => {
                a.iter().collect::<BTreeSet<_>>() == b.iter().collect::<BTreeSet<_>>()
            }
            (Self::Record { schema: a }, Self::Record { schema: b }) => a == b,
            (Self::List { items: a }, Self::List { items: b }) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Number => write!(f, "number"),
            Self::Integer => write!(f, "integer"),
            Self::Boolean => write!(f, "boolean"),
            Self::Enum { values } => write!(f, "enum({})", values.join(", ")),
            Self::Record { schema } => {
                let names: Vec<&str> = schema.fields().iter().map(|s| s.name.as_str()).collect();
                write!(f, "record{{{}}}", names.join(", "))
            }
            Self::List { items } => write!(f, "list<{}>", items),
        }
    }
}

/// One field of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(flatten)]
    pub ty: FieldType,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Errors from building a schema descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("duplicate field '{0}' in schema")]
    DuplicateField(String),
    #[error("schema field name must not be empty")]
    EmptyFieldName,
}

/// Ordered mapping from field name to type tag and optionality. Immutable once built.
///
/// Serializes as a list of field specs; deserializing goes through [`SchemaBuilder::build`], so
/// duplicate or empty names are rejected there too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FieldSpec>", into = "Vec<FieldSpec>")]
pub struct SchemaDescriptor {
    fields: Vec<FieldSpec>,
}

impl TryFrom<Vec<FieldSpec>> for SchemaDescriptor {
    type Error = SchemaError;

    fn try_from(fields: Vec<FieldSpec>) -> Result<Self, Self::Error> {
        SchemaBuilder { fields }.build()
    }
}

impl From<SchemaDescriptor> for Vec<FieldSpec> {
    fn from(schema: SchemaDescriptor) -> Self {
        schema.fields
    }
}

impl SchemaDescriptor {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Builder for [`SchemaDescriptor`]; rejects duplicate and empty field names in `build`.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<FieldSpec>,
}

impl SchemaBuilder {
    pub fn required(self, name: impl Into<String>, ty: FieldType) -> Self {
        self.field(name, ty, true, None)
    }

    pub fn optional(self, name: impl Into<String>, ty: FieldType) -> Self {
        self.field(name, ty, false, None)
    }

    /// Adds a field with a description (shown to the model in the mold's JSON Schema).
    pub fn field(
        mut self,
        name: impl Into<String>,
        ty: FieldType,
        required: bool,
        description: Option<String>,
    ) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            ty,
            required,
            description,
        });
        self
    }

    pub fn build(self) -> Result<SchemaDescriptor, SchemaError> {
        let mut seen = BTreeSet::new();
        for spec in &self.fields {
            if spec.name.is_empty() {
                return Err(SchemaError::EmptyFieldName);
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(SchemaError::DuplicateField(spec.name.clone()));
            }
        }
        Ok(SchemaDescriptor {
            fields: self.fields,
        })
    }
}

/// A typed mold input: a Rust type that declares its structural shape.
///
/// `input_type` must return [`FieldType::Record`]; registration rejects anything else.
///
/// ```rust
/// use mold::{FieldType, MoldInput, SchemaDescriptor};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Alert {
///     text: String,
/// }
///
/// impl MoldInput for Alert {
///     fn input_type() -> FieldType {
///         let schema = SchemaDescriptor::builder()
///             .required("text", FieldType::String)
///             .build()
///             .expect("valid schema");
///         FieldType::record(schema)
///     }
/// }
/// ```
pub trait MoldInput: DeserializeOwned + Send + 'static {
    fn input_type() -> FieldType;
}
