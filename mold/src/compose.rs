//! State composer: derives one state shape from all registered molds.
//!
//! Composition always recomputes from the full registry (conflicts are global), is
//! deterministic, and orders fields by first registration. The shape is stored with the built
//! agent and published for introspection.

use serde::Serialize;
use tracing::debug;

use crate::registry::{MoldRegistry, RegistryError};
use crate::schema::FieldType;

/// Name of the reserved, append-only message log present in every state.
pub const MESSAGES_FIELD: &str = "messages";

/// How concurrent writes to one field within a batch are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePolicy {
    /// Last writer (in request order) wins. Scalars and records.
    LastValue,
    /// New elements are appended. Collections and the message log.
    Append,
}

impl MergePolicy {
    pub fn for_type(ty: &FieldType) -> Self {
        if ty.is_collection() {
            Self::Append
        } else {
            Self::LastValue
        }
    }
}

/// One data field of the composed state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: FieldType,
    /// Optional unless every contributing mold marks the field required.
    pub optional: bool,
    pub merge: MergePolicy,
    /// Molds writing this field, in registration order.
    pub contributors: Vec<String>,
}

/// The shape of shared conversation state: the message log plus every mold field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateShape {
    messages: &'static str,
    fields: Vec<StateField>,
}

impl StateShape {
    /// Data fields in first-registration order (the message log is not included).
    pub fn fields(&self) -> &[StateField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&StateField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// All field names, the message log first.
    pub fn field_names(&self) -> Vec<&str> {
        std::iter::once(self.messages)
            .chain(self.fields.iter().map(|f| f.name.as_str()))
            .collect()
    }

    pub fn messages_field(&self) -> &'static str {
        self.messages
    }

    /// JSON form published alongside the agent.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Derives the [`StateShape`] of a registry.
pub struct StateComposer;

impl StateComposer {
    pub fn compose(registry: &MoldRegistry) -> Result<StateShape, RegistryError> {
        let mut fields: Vec<StateField> = Vec::new();
        for mold in registry.molds() {
            let schema = mold.definition().schema();
            for (local, state_name) in mold.field_map() {
                let Some(spec) = schema.field(local) else {
                    continue;
                };
                match fields.iter().position(|f| &f.name == state_name) {
                    Some(i) => {
                        let field = &mut fields[i];
                        if field.ty != spec.ty {
                            return Err(RegistryError::FieldConflict {
                                field: state_name.clone(),
                                mold: mold.name().to_string(),
                                owner: field.contributors.first().cloned().unwrap_or_default(),
                                existing: field.ty.to_string(),
                                incoming: spec.ty.to_string(),
                            });
                        }
                        field.optional |= !spec.required;
                        field.contributors.push(mold.name().to_string());
                    }
                    None => fields.push(StateField {
                        name: state_name.clone(),
                        ty: spec.ty.clone(),
                        optional: !spec.required,
                        merge: MergePolicy::for_type(&spec.ty),
                        contributors: vec![mold.name().to_string()],
                    }),
                }
            }
        }
        let shape = StateShape {
            messages: MESSAGES_FIELD,
            fields,
        };
        debug!(fields = ?shape.field_names(), "composed state shape");
        Ok(shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::MoldDefinition;
    use crate::registry::FieldConflictPolicy;
    use crate::schema::SchemaDescriptor;

    #[test]
    fn empty_registry_has_only_messages() {
        let shape = StateComposer::compose(&MoldRegistry::default()).unwrap();
        assert_eq!(shape.field_names(), vec![MESSAGES_FIELD]);
        assert!(shape.fields().is_empty());
    }

    /// **Scenario**: Shared field is optional when any contributor marks it optional.
    #[test]
    fn shared_field_optionality_is_merged() {
        let status = FieldType::enumeration(["success", "error"]);
        let a = SchemaDescriptor::builder()
            .required("status", status.clone())
            .build()
            .unwrap();
        let b = SchemaDescriptor::builder()
            .optional("status", status)
            .required("alerts", FieldType::list(FieldType::String))
            .build()
            .unwrap();
        let mut registry = MoldRegistry::new(FieldConflictPolicy::Error);
        registry.register(MoldDefinition::structured("a", "", a)).unwrap();
        registry.register(MoldDefinition::structured("b", "", b)).unwrap();

        let shape = StateComposer::compose(&registry).unwrap();
        let status = shape.field("status").unwrap();
        assert!(status.optional);
        assert_eq!(status.contributors, vec!["a", "b"]);
        assert_eq!(status.merge, MergePolicy::LastValue);
        let alerts = shape.field("alerts").unwrap();
        assert!(!alerts.optional);
        assert_eq!(alerts.merge, MergePolicy::Append);
    }

    #[test]
    fn shape_json_lists_fields_in_order() {
        let schema = SchemaDescriptor::builder()
            .required("city", FieldType::String)
            .required("temperature", FieldType::Number)
            .build()
            .unwrap();
        let mut registry = MoldRegistry::default();
        registry
            .register(MoldDefinition::structured("weather_report", "", schema))
            .unwrap();
        let json = StateComposer::compose(&registry).unwrap().to_json();
        assert_eq!(json["messages"], MESSAGES_FIELD);
        assert_eq!(json["fields"][0]["name"], "city");
        assert_eq!(json["fields"][1]["type"]["type"], "number");
        assert_eq!(json["fields"][1]["merge"], "last_value");
    }
}
