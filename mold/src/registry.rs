//! Mold registry: collects mold definitions and checks name and field ownership eagerly.
//!
//! All composition failures surface here, at registration time, before an agent exists:
//! duplicate mold names, a field declared with a different type than its current owner
//! (unless the namespace policy is active), and the reserved message-log field.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::compose::MESSAGES_FIELD;
use crate::definition::{MoldDefinition, UpdateCommand};
use crate::schema::{validate_field, FieldType, SchemaValidationError};

/// What to do when two molds declare the same field name with different types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldConflictPolicy {
    /// Reject the second mold with [`RegistryError::FieldConflict`].
    #[default]
    Error,
    /// Store the incoming field as `"<mold>.<field>"`.
    Namespace,
}

impl FromStr for FieldConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "namespace" => Ok(Self::Namespace),
            _ => Err(format!(
                "unknown field_conflict_policy: {} (use error or namespace)",
                s
            )),
        }
    }
}

impl fmt::Display for FieldConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Namespace => write!(f, "namespace"),
        }
    }
}

/// Build-time registration errors. Always fatal for agent construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("duplicate mold name '{0}'")]
    DuplicateName(String),
    #[error("field '{field}' of mold '{mold}' is {incoming}, but mold '{owner}' declares it as {existing}")]
    FieldConflict {
        field: String,
        mold: String,
        owner: String,
        existing: String,
        incoming: String,
    },
    #[error("mold '{mold}' declares reserved field '{field}'")]
    ReservedField { mold: String, field: String },
    #[error("mold '{mold}' input must be a record, found {found}")]
    NotARecord { mold: String, found: String },
}

/// A mold as stored by the registry: its definition plus where each schema field lives in state.
#[derive(Debug, Clone)]
pub struct RegisteredMold {
    definition: MoldDefinition,
    /// (schema field name, state field name), in schema order.
    field_map: Vec<(String, String)>,
}

impl RegisteredMold {
    pub fn definition(&self) -> &MoldDefinition {
        &self.definition
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// State field that backs the schema field `schema_field`.
    pub fn state_field(&self, schema_field: &str) -> Option<&str> {
        self.field_map
            .iter()
            .find(|(local, _)| local == schema_field)
            .map(|(_, state)| state.as_str())
    }

    pub fn field_map(&self) -> &[(String, String)] {
        &self.field_map
    }

    /// Rewrites a handler's updates from schema-local names to state field names, checking each
    /// value against the field's declared type.
    pub(crate) fn to_state_updates(
        &self,
        cmd: UpdateCommand,
    ) -> Result<UpdateCommand, UpdateRejection> {
        let schema = self.definition.schema();
        let mut state_updates = serde_json::Map::new();
        for (field, value) in cmd.state_updates {
            let (Some(spec), Some(state_name)) = (schema.field(&field), self.state_field(&field))
            else {
                return Err(UpdateRejection::Undeclared(field));
            };
            let value = validate_field(&spec.ty, &field, &value).map_err(UpdateRejection::Invalid)?;
            state_updates.insert(state_name.to_string(), value);
        }
        Ok(UpdateCommand {
            state_updates,
            messages_to_append: cmd.messages_to_append,
        })
    }
}

/// Why a handler's update was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UpdateRejection {
    /// The mold wrote a field its schema does not declare.
    Undeclared(String),
    /// The written value does not fit the field's type.
    Invalid(SchemaValidationError),
}

#[derive(Debug, Clone)]
struct FieldOwner {
    ty: FieldType,
    owner: String,
}

/// Registry of molds for one agent, in registration order. Read-only once the agent is built.
#[derive(Debug, Default)]
pub struct MoldRegistry {
    policy: FieldConflictPolicy,
    molds: Vec<RegisteredMold>,
    by_name: HashMap<String, usize>,
    fields: HashMap<String, FieldOwner>,
}

impl MoldRegistry {
    pub fn new(policy: FieldConflictPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> FieldConflictPolicy {
        self.policy
    }

    /// Registers a mold. Nothing is recorded when any check fails.
    pub fn register(&mut self, definition: MoldDefinition) -> Result<(), RegistryError> {
        let mold = definition.name().to_string();
        if self.by_name.contains_key(&mold) {
            return Err(RegistryError::DuplicateName(mold));
        }

        let mut field_map = Vec::with_capacity(definition.schema().len());
        let mut new_fields: Vec<(String, FieldOwner)> = Vec::new();
        for spec in definition.schema().fields() {
            if spec.name == MESSAGES_FIELD {
                return Err(RegistryError::ReservedField {
                    mold,
                    field: spec.name.clone(),
                });
            }
            let mut state_name = spec.name.clone();
            if let Some(existing) = self.owner_of(&state_name, &new_fields) {
                if existing.ty != spec.ty {
                    match self.policy {
                        FieldConflictPolicy::Error => {
                            return Err(conflict(&state_name, &mold, existing, &spec.ty));
                        }
                        FieldConflictPolicy::Namespace => {
                            state_name = format!("{}.{}", mold, spec.name);
                            debug!(mold = %mold, field = %spec.name, state_field = %state_name, "namespacing conflicting field");
                            if let Some(existing) = self.owner_of(&state_name, &new_fields) {
                                if existing.ty != spec.ty {
                                    return Err(conflict(&state_name, &mold, existing, &spec.ty));
                                }
                            }
                        }
                    }
                }
            }
            if self.owner_of(&state_name, &new_fields).is_none() {
                new_fields.push((
                    state_name.clone(),
                    FieldOwner {
                        ty: spec.ty.clone(),
                        owner: mold.clone(),
                    },
                ));
            }
            field_map.push((spec.name.clone(), state_name));
        }

        self.fields.extend(new_fields);
        self.by_name.insert(mold.clone(), self.molds.len());
        self.molds.push(RegisteredMold {
            definition,
            field_map,
        });
        info!(mold = %mold, molds = self.molds.len(), "mold registered");
        Ok(())
    }

    fn owner_of<'a>(
        &'a self,
        state_name: &str,
        pending: &'a [(String, FieldOwner)],
    ) -> Option<&'a FieldOwner> {
        self.fields.get(state_name).or_else(|| {
            pending
                .iter()
                .find(|(name, _)| name == state_name)
                .map(|(_, owner)| owner)
        })
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredMold> {
        self.by_name.get(name).map(|&i| &self.molds[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Molds in registration order.
    pub fn molds(&self) -> impl Iterator<Item = &RegisteredMold> {
        self.molds.iter()
    }

    pub fn len(&self) -> usize {
        self.molds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.molds.is_empty()
    }
}

fn conflict(field: &str, mold: &str, existing: &FieldOwner, incoming: &FieldType) -> RegistryError {
    RegistryError::FieldConflict {
        field: field.to_string(),
        mold: mold.to_string(),
        owner: existing.owner.clone(),
        existing: existing.ty.to_string(),
        incoming: incoming.to_string(),
    }
}
