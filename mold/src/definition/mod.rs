//! Mold definitions: name, schema, handler and documentation of one schema-typed callable.
//!
//! A mold does not act on the outside world; its handler turns a validated input record into an
//! [`UpdateCommand`] (partial state update plus messages for the log). Handlers are stateless
//! between invocations and never touch the shared state directly.

mod handler;

pub use handler::{FnHandler, MoldHandler, StructuredHandler, TypedHandler};

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::message::Message;
use crate::registry::RegistryError;
use crate::schema::{FieldType, MoldInput, SchemaDescriptor};
use crate::tool_source::ToolSpec;

/// Guidance prepended to every mold's doc in its tool spec.
pub const MOLD_DESCRIPTION_PREFIX: &str = "SCHEMA TOOL: ";

/// Guidance appended to every mold's doc in its tool spec.
pub const MOLD_DESCRIPTION_SUFFIX: &str = ". This tool helps you focus by structuring data into a defined schema. Use it to organize information and guide your data collection - the schema shows what information to look for when calling other tools.";

/// Result of one mold-handler invocation, consumed once by the state merger.
///
/// `state_updates` is keyed by the mold's own schema field names; the dispatcher maps them to
/// state field names before merging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateCommand {
    pub state_updates: Map<String, Value>,
    pub messages_to_append: Vec<Message>,
}

impl UpdateCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one field (builder).
    pub fn set(mut self, field: impl Into<String>, value: Value) -> Self {
        self.state_updates.insert(field.into(), value);
        self
    }

    /// Appends one message to the log (builder).
    pub fn message(mut self, message: Message) -> Self {
        self.messages_to_append.push(message);
        self
    }

    /// Writes every field of `record` and appends a tool message with the serialized record.
    pub fn from_record(record: Map<String, Value>, call_id: &str, mold_name: &str) -> Self {
        let content = Value::Object(record.clone()).to_string();
        Self {
            state_updates: record,
            messages_to_append: vec![Message::tool(call_id, mold_name, content)],
        }
    }
}

/// Failure raised by a handler.
///
/// `Failed` is reported to the model like a validation error; `Fatal` ends the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Failed(String),
    #[error("unrecoverable: {0}")]
    Fatal(String),
}

/// A registered callable that structures data into shared state.
#[derive(Clone)]
pub struct MoldDefinition {
    name: String,
    doc: String,
    schema: SchemaDescriptor,
    handler: Arc<dyn MoldHandler>,
}

impl MoldDefinition {
    /// Creates a mold from an explicit schema and handler.
    pub fn new(
        name: impl Into<String>,
        doc: impl Into<String>,
        schema: SchemaDescriptor,
        handler: impl MoldHandler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            doc: doc.into(),
            schema,
            handler: Arc::new(handler),
        }
    }

    /// Creates a mold whose handler is a plain function of the validated record.
    pub fn from_fn<F>(
        name: impl Into<String>,
        doc: impl Into<String>,
        schema: SchemaDescriptor,
        f: F,
    ) -> Self
    where
        F: Fn(Map<String, Value>, &str) -> Result<UpdateCommand, HandlerError>
            + Send
            + Sync
            + 'static,
    {
        Self::new(name, doc, schema, FnHandler::new(f))
    }

    /// Creates a mold that writes its validated input straight into state and echoes it as a
    /// tool message.
    pub fn structured(
        name: impl Into<String>,
        doc: impl Into<String>,
        schema: SchemaDescriptor,
    ) -> Self {
        let name = name.into();
        let handler = StructuredHandler::new(name.clone());
        Self::new(name, doc, schema, handler)
    }

    /// Creates a mold from a typed input; the schema comes from `I::input_type()`.
    ///
    /// Fails with [`RegistryError::NotARecord`] when the declared type is not a record.
    pub fn typed<I, F>(
        name: impl Into<String>,
        doc: impl Into<String>,
        f: F,
    ) -> Result<Self, RegistryError>
    where
        I: MoldInput,
        F: Fn(I, &str) -> Result<UpdateCommand, HandlerError> + Send + Sync + 'static,
    {
        let name = name.into();
        match I::input_type() {
            FieldType::Record { schema } => {
                Ok(Self::new(name, doc, schema, TypedHandler::<I, F>::new(f)))
            }
            other => Err(RegistryError::NotARecord {
                mold: name,
                found: other.to_string(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    pub fn handler(&self) -> Arc<dyn MoldHandler> {
        Arc::clone(&self.handler)
    }

    /// Tool spec published to the model for this mold.
    pub fn tool_spec(&self) -> ToolSpec {
        let doc = if self.doc.is_empty() {
            "Structure data into JSON format"
        } else {
            self.doc.trim_end_matches('.')
        };
        ToolSpec {
            name: self.name.clone(),
            description: Some(format!(
                "{}{}{}",
                MOLD_DESCRIPTION_PREFIX, doc, MOLD_DESCRIPTION_SUFFIX
            )),
            input_schema: self.schema.to_json_schema(),
        }
    }
}

impl fmt::Debug for MoldDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MoldDefinition")
            .field("name", &self.name)
            .field("doc", &self.doc)
            .field("schema", &self.schema)
            .field("handler", &"<handler>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct NotRecord;

    impl MoldInput for NotRecord {
        fn input_type() -> FieldType {
            FieldType::String
        }
    }

    /// **Scenario**: A typed mold whose declared type is not a record is rejected.
    #[test]
    fn typed_rejects_non_record_input() {
        let err = MoldDefinition::typed::<NotRecord, _>("bad", "doc", |_, _| {
            Ok(UpdateCommand::new())
        })
        .unwrap_err();
        assert!(matches!(err, RegistryError::NotARecord { ref mold, .. } if mold == "bad"));
    }

    /// **Scenario**: Tool spec carries the schema-tool guidance and JSON Schema.
    #[test]
    fn tool_spec_wraps_doc_and_schema() {
        let schema = SchemaDescriptor::builder()
            .required("city", FieldType::String)
            .build()
            .unwrap();
        let mold = MoldDefinition::structured("weather_report", "Record the weather.", schema);
        let spec = mold.tool_spec();
        assert_eq!(spec.name, "weather_report");
        let desc = spec.description.unwrap();
        assert!(desc.starts_with("SCHEMA TOOL: Record the weather. This tool"), "{}", desc);
        assert_eq!(spec.input_schema["required"], json!(["city"]));
    }

    #[test]
    fn update_command_builder_and_from_record() {
        let cmd = UpdateCommand::new()
            .set("temperature", json!(72))
            .message(Message::tool("c1", "m", "ok"));
        assert_eq!(cmd.state_updates["temperature"], json!(72));
        assert_eq!(cmd.messages_to_append.len(), 1);

        let mut record = Map::new();
        record.insert("city".into(), json!("Seattle"));
        let cmd = UpdateCommand::from_record(record, "c2", "weather_report");
        assert_eq!(cmd.state_updates["city"], "Seattle");
        assert_eq!(
            cmd.messages_to_append,
            vec![Message::tool("c2", "weather_report", r#"{"city":"Seattle"}"#)]
        );
    }
}
