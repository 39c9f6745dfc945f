//! JSON Schema rendering of schema descriptors, used as the `input_schema` of mold tool specs.

use serde_json::{json, Map, Value};

use super::{FieldType, SchemaDescriptor};

impl SchemaDescriptor {
    /// Renders the descriptor as a JSON Schema object (`type: object`, `properties`, `required`).
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for spec in self.fields() {
            let mut prop = spec.ty.to_json_schema();
            if let (Some(desc), Some(obj)) = (&spec.description, prop.as_object_mut()) {
                obj.insert("description".to_string(), Value::String(desc.clone()));
            }
            properties.insert(spec.name.clone(), prop);
            if spec.required {
                required.push(Value::String(spec.name.clone()));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

impl FieldType {
    pub fn to_json_schema(&self) -> Value {
        match self {
            Self::String => json!({ "type": "string" }),
            Self::Number => json!({ "type": "number" }),
            Self::Integer => json!({ "type": "integer" }),
            Self::Boolean => json!({ "type": "boolean" }),
            Self::Enum { values } => json!({ "type": "string", "enum": values }),
            Self::Record { schema } => schema.to_json_schema(),
            Self::List { items } => json!({ "type": "array", "items": items.to_json_schema() }),
        }
    }
}
