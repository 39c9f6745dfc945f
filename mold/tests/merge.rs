//! State merger: per-field merge policy, error messages, purity.

mod init_logging;

use std::sync::Arc;

use mold::{
    CallError, CallKind, CallOutput, CallRequest, ComposedState, DispatchOutcome, FieldType,
    Message, MoldDefinition, MoldRegistry, SchemaDescriptor, StateComposer, StateMerger,
    UpdateCommand,
};
use serde_json::{json, Value};

fn merger() -> StateMerger {
    let schema = SchemaDescriptor::builder()
        .optional("temperature", FieldType::Number)
        .optional("alerts", FieldType::list(FieldType::String))
        .optional(
            "location",
            FieldType::record(
                SchemaDescriptor::builder()
                    .required("city", FieldType::String)
                    .build()
                    .unwrap(),
            ),
        )
        .build()
        .unwrap();
    let mut registry = MoldRegistry::default();
    registry
        .register(MoldDefinition::structured("weather", "", schema))
        .unwrap();
    StateMerger::new(Arc::new(StateComposer::compose(&registry).unwrap()))
}

fn ok(id: &str, cmd: UpdateCommand) -> DispatchOutcome {
    DispatchOutcome {
        request: CallRequest::new(CallKind::Mold, "weather", json!({}), id),
        result: Ok(CallOutput::Mold(cmd)),
    }
}

/// **Scenario**: Two writes of 72 then 75 to a scalar field leave 75.
#[test]
fn scalar_field_last_writer_wins() {
    let state = merger().merge(
        &ComposedState::new(),
        &[
            ok("a", UpdateCommand::new().set("temperature", json!(72))),
            ok("b", UpdateCommand::new().set("temperature", json!(75))),
        ],
    );
    assert_eq!(state.get("temperature"), Some(&json!(75)));
}

/// **Scenario**: `["rain"]` then `["wind"]` to a list field leave `["rain", "wind"]`.
#[test]
fn list_field_appends() {
    let m = merger();
    let state = m.merge(
        &ComposedState::new(),
        &[
            ok("a", UpdateCommand::new().set("alerts", json!(["rain"]))),
            ok("b", UpdateCommand::new().set("alerts", json!(["wind"]))),
        ],
    );
    assert_eq!(state.get("alerts"), Some(&json!(["rain", "wind"])));

    // appends across batches too
    let state = m.merge(
        &state,
        &[ok("c", UpdateCommand::new().set("alerts", json!(["fog"])))],
    );
    assert_eq!(state.get("alerts"), Some(&json!(["rain", "wind", "fog"])));
}

#[test]
fn record_field_is_replaced_whole() {
    let state = ComposedState::new().with_value("location", json!({"city": "Portland"}));
    let state = merger().merge(
        &state,
        &[ok("a", UpdateCommand::new().set("location", json!({"city": "Seattle"})))],
    );
    assert_eq!(state.get("location"), Some(&json!({"city": "Seattle"})));
}

/// **Scenario**: Failed calls add an error tool message and touch no field.
#[test]
fn failed_call_appends_error_message_only() {
    let state = ComposedState::with_messages(vec![Message::user("hi")])
        .with_value("temperature", json!(60));
    let failed = DispatchOutcome {
        request: CallRequest::new(CallKind::Unknown, "teleport", json!({}), "x1"),
        result: Err(CallError::UnknownTarget("teleport".to_string())),
    };
    let next = merger().merge(&state, &[failed]);

    assert_eq!(next.values(), state.values());
    assert_eq!(next.messages.len(), 2);
    match &next.messages[1] {
        Message::Tool {
            call_id,
            content,
            is_error,
            ..
        } => {
            assert_eq!(call_id, "x1");
            assert!(*is_error);
            let payload: Value = serde_json::from_str(content).unwrap();
            assert!(payload["error"].as_str().unwrap().contains("teleport"));
            assert!(payload["field"].is_null());
        }
        other => panic!("expected tool message, got {:?}", other),
    }
}

/// **Scenario**: Identical input gives identical output, and the input state is not modified.
#[test]
fn merge_is_pure() {
    let m = merger();
    let state = ComposedState::with_messages(vec![Message::user("hi")]);
    let outcomes = vec![
        ok("a", UpdateCommand::new().set("temperature", json!(72))),
        ok("b", UpdateCommand::new().set("alerts", json!(["rain"]))),
    ];
    let before = state.clone();
    let first = m.merge(&state, &outcomes);
    let second = m.merge(&state, &outcomes);
    assert_eq!(first, second);
    assert_eq!(state, before);
    // one synthesized tool message per mold call without messages of its own
    assert_eq!(first.messages.len(), 3);
}
