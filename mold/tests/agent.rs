//! End-to-end: build an agent, run reasoning steps, check state and messages.

mod init_logging;

use std::sync::Arc;

use mold::{
    create_mold_agent, AgentBuilder, BuildAgentError, ComposedState, FieldType, LlmResponse,
    Message, MockLlm, MockToolSource, MoldAgentConfig, MoldDefinition, MoldInput, Next, Node,
    RegistryError, SchemaDescriptor, ToolCall, UpdateCommand, MOLD_DESCRIPTION_PREFIX,
};
use serde::Deserialize;
use serde_json::{json, Value};

const PROMPT: &str = "You are a weather assistant.";

fn weather_report() -> MoldDefinition {
    let schema = SchemaDescriptor::builder()
        .required("city", FieldType::String)
        .required("temperature", FieldType::Number)
        .required("status", FieldType::enumeration(["success", "error"]))
        .build()
        .unwrap();
    MoldDefinition::structured("weather_report", "Record a weather report", schema)
}

fn call(name: &str, args: Value, id: &str) -> ToolCall {
    ToolCall::new(name, args.to_string(), id)
}

/// **Scenario**: A valid call writes exactly the three fields plus a tool message with the
/// record; a follow-up missing `city` leaves fields unchanged and appends an error naming it.
#[tokio::test]
async fn weather_report_end_to_end() {
    let llm = MockLlm::scripted(vec![]);
    let agent = create_mold_agent(Arc::new(llm), None, vec![weather_report()], PROMPT, None)
        .await
        .unwrap();

    let state = agent.initial_state("What's the weather in Seattle?");
    let output = LlmResponse::new(
        "",
        vec![call(
            "weather_report",
            json!({"city": "Seattle", "temperature": 61.0, "status": "success"}),
            "c1",
        )],
    );
    let state = agent.step(&state, output).await.unwrap();

    assert_eq!(state.values().len(), 3);
    assert_eq!(state.get("city"), Some(&json!("Seattle")));
    assert_eq!(state.get("temperature"), Some(&json!(61.0)));
    assert_eq!(state.get("status"), Some(&json!("success")));
    assert_eq!(state.messages.len(), 3);
    match state.messages.last().unwrap() {
        Message::Tool {
            call_id,
            content,
            is_error,
            ..
        } => {
            assert_eq!(call_id, "c1");
            assert!(!*is_error);
            let record: Value = serde_json::from_str(content).unwrap();
            assert_eq!(
                record,
                json!({"city": "Seattle", "temperature": 61.0, "status": "success"})
            );
        }
        other => panic!("expected tool message, got {:?}", other),
    }

    let follow_up = LlmResponse::new(
        "",
        vec![call(
            "weather_report",
            json!({"temperature": 58.0, "status": "success"}),
            "c2",
        )],
    );
    let next = agent.step(&state, follow_up).await.unwrap();
    assert_eq!(next.values(), state.values());
    assert_eq!(next.messages.len(), state.messages.len() + 2);
    match next.messages.last().unwrap() {
        Message::Tool {
            call_id,
            content,
            is_error,
            ..
        } => {
            assert_eq!(call_id, "c2");
            assert!(*is_error);
            let payload: Value = serde_json::from_str(content).unwrap();
            assert_eq!(payload["field"], "city");
            assert!(payload["error"].as_str().unwrap().contains("city"));
        }
        other => panic!("expected error tool message, got {:?}", other),
    }
}

/// **Scenario**: Conflicting molds stop the build; no agent is returned.
#[tokio::test]
async fn build_fails_on_field_conflict() {
    let note = MoldDefinition::structured(
        "note",
        "",
        SchemaDescriptor::builder()
            .required("status", FieldType::String)
            .build()
            .unwrap(),
    );
    let err = create_mold_agent(
        Arc::new(MockLlm::scripted(vec![])),
        None,
        vec![weather_report(), note],
        PROMPT,
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        BuildAgentError::Registry(RegistryError::FieldConflict { .. })
    ));
}

/// **Scenario**: The mapping config form selects the namespace policy.
#[tokio::test]
async fn namespace_config_from_mapping() {
    let note = MoldDefinition::structured(
        "note",
        "",
        SchemaDescriptor::builder()
            .required("status", FieldType::String)
            .build()
            .unwrap(),
    );
    let agent = create_mold_agent(
        Arc::new(MockLlm::scripted(vec![])),
        None,
        vec![weather_report(), note],
        PROMPT,
        Some(json!({"field_conflict_policy": "namespace"})),
    )
    .await
    .unwrap();

    let state = agent
        .step(
            &agent.initial_state("note it"),
            LlmResponse::new("", vec![call("note", json!({"status": "free text"}), "n1")]),
        )
        .await
        .unwrap();
    assert_eq!(state.get("note.status"), Some(&json!("free text")));
    assert_eq!(state.get("status"), None);
}

/// **Scenario**: An unreadable config mapping stops the build with a config error.
#[tokio::test]
async fn build_fails_on_invalid_config_mapping() {
    let err = create_mold_agent(
        Arc::new(MockLlm::scripted(vec![])),
        None,
        vec![weather_report()],
        PROMPT,
        Some(json!({"field_conflict_policy": "merge"})),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, BuildAgentError::Config(_)), "{:?}", err);
}

/// **Scenario**: A typed config passed through the builder is kept on the agent.
#[tokio::test]
async fn builder_keeps_typed_config() {
    let config = MoldAgentConfig {
        concurrent_dispatch: false,
        ..MoldAgentConfig::default()
    };
    let agent = AgentBuilder::new(Arc::new(MockLlm::scripted(vec![])))
        .mold(weather_report())
        .config(config.clone())
        .build()
        .await
        .unwrap();
    assert_eq!(agent.config(), &config);
}

/// **Scenario**: The model sees the prompt first and receives tool specs then mold specs; the
/// stored state gains no system message.
#[tokio::test]
async fn think_injects_prompt_and_publishes_specs() {
    let llm = Arc::new(MockLlm::with_no_tool_calls("Sunny."));
    let agent = create_mold_agent(
        llm.clone(),
        Some(Arc::new(MockToolSource::get_time_example())),
        vec![weather_report()],
        PROMPT,
        None,
    )
    .await
    .unwrap();

    let state = agent.initial_state("Weather?");
    let response = agent.think(&state).await.unwrap();
    assert_eq!(response.content, "Sunny.");

    let sent = llm.last_messages();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], Message::system(PROMPT));
    assert_eq!(sent[1], Message::user("Weather?"));
    assert!(state.messages.iter().all(|m| !m.is_system()));
    assert_eq!(llm.last_tool_names(), vec!["get_time", "weather_report"]);

    let specs = agent.tool_specs();
    let mold_spec = &specs[1];
    assert!(mold_spec
        .description
        .as_deref()
        .unwrap()
        .starts_with(MOLD_DESCRIPTION_PREFIX));
    assert_eq!(
        mold_spec.input_schema["required"],
        json!(["city", "temperature", "status"])
    );
}

/// **Scenario**: An existing system message is not duplicated.
#[tokio::test]
async fn think_keeps_existing_system_message() {
    let llm = Arc::new(MockLlm::with_no_tool_calls("ok"));
    let agent = AgentBuilder::new(llm.clone())
        .mold(weather_report())
        .prompt(PROMPT)
        .build()
        .await
        .unwrap();
    let state = ComposedState::with_messages(vec![
        Message::system("custom"),
        Message::user("hi"),
    ]);
    agent.think(&state).await.unwrap();
    assert_eq!(llm.last_messages(), state.messages);
}

/// **Scenario**: Calls without an id get one; the assistant message and tool message agree.
#[tokio::test]
async fn missing_call_ids_are_assigned() {
    let agent = AgentBuilder::new(Arc::new(MockLlm::scripted(vec![])))
        .tools(Arc::new(MockToolSource::get_time_example()))
        .build()
        .await
        .unwrap();
    let output = LlmResponse::new(
        "checking",
        vec![ToolCall {
            name: "get_time".to_string(),
            arguments: String::new(),
            id: None,
        }],
    );
    let state = agent
        .step(&agent.initial_state("time?"), output)
        .await
        .unwrap();

    let assigned = match &state.messages[1] {
        Message::Assistant { tool_calls, .. } => tool_calls[0].id.clone().unwrap(),
        other => panic!("expected assistant message, got {:?}", other),
    };
    match &state.messages[2] {
        Message::Tool {
            call_id, content, ..
        } => {
            assert_eq!(call_id, &assigned);
            assert_eq!(content, "2025-01-29 12:00:00");
        }
        other => panic!("expected tool message, got {:?}", other),
    }
    assert!(state.values().is_empty());
}

#[derive(Debug, Deserialize)]
struct TrafficInput {
    city: String,
    delay_minutes: i64,
}

impl MoldInput for TrafficInput {
    fn input_type() -> FieldType {
        FieldType::record(
            SchemaDescriptor::builder()
                .required("city", FieldType::String)
                .required("delay_minutes", FieldType::Integer)
                .build()
                .unwrap(),
        )
    }
}

/// **Scenario**: The think and dispatch nodes loop until the model stops calling; a typed mold
/// and a tool run in the same batch.
#[tokio::test]
async fn nodes_run_until_model_is_done() {
    let traffic = MoldDefinition::typed("traffic_report", "Record traffic", |t: TrafficInput, _: &str| {
        Ok(UpdateCommand::new()
            .set("city", json!(t.city))
            .set("delay_minutes", json!(t.delay_minutes)))
    })
    .unwrap();
    let llm = MockLlm::scripted(vec![LlmResponse::new(
        "Looking it up.",
        vec![
            call("traffic_report", json!({"city": "Seattle", "delay_minutes": 12.0}), "t1"),
            call("get_time", json!({}), "g1"),
        ],
    )])
    .with_final_content("Traffic recorded.");
    let agent = Arc::new(
        create_mold_agent(
            Arc::new(llm),
            Some(Arc::new(MockToolSource::get_time_example())),
            vec![traffic],
            PROMPT,
            None,
        )
        .await
        .unwrap(),
    );

    let think = agent.think_node();
    let dispatch = agent.dispatch_node();
    assert_eq!(think.id(), "think");
    assert_eq!(dispatch.id(), "dispatch");

    let mut state = agent.initial_state("How is traffic?");
    let mut rounds = 0;
    loop {
        rounds += 1;
        let (next_state, next) = think.run(state).await.unwrap();
        state = next_state;
        if next == Next::End {
            break;
        }
        assert_eq!(next, Next::Continue);
        let (next_state, next) = dispatch.run(state).await.unwrap();
        state = next_state;
        assert_eq!(next, Next::Node("think".to_string()));
        assert!(rounds < 5);
    }

    assert_eq!(rounds, 2);
    assert_eq!(state.get("city"), Some(&json!("Seattle")));
    assert_eq!(state.get("delay_minutes"), Some(&json!(12)));
    assert_eq!(state.last_assistant_reply(), Some("Traffic recorded."));
    // user, assistant(calls), mold tool message, tool message, final assistant
    assert_eq!(state.messages.len(), 5);

    let (_, next) = dispatch.run(state).await.unwrap();
    assert_eq!(next, Next::End);
}

#[tokio::test]
async fn typed_mold_rejects_non_record_input() {
    #[derive(Debug, Deserialize)]
    struct Bare(String);
    impl MoldInput for Bare {
        fn input_type() -> FieldType {
            FieldType::String
        }
    }
    let err = MoldDefinition::typed("bare", "", |_: Bare, _: &str| Ok(UpdateCommand::new()))
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotARecord { .. }));
}

/// **Scenario**: A dispatch node whose token is cancelled fails the step with `Cancelled`.
#[tokio::test]
async fn dispatch_node_honours_cancellation() {
    let agent = Arc::new(
        AgentBuilder::new(Arc::new(MockLlm::scripted(vec![])))
            .tools(Arc::new(MockToolSource::get_time_example()))
            .build()
            .await
            .unwrap(),
    );
    let cancel = tokio_util::sync::CancellationToken::new();
    cancel.cancel();
    let node = agent.dispatch_node().with_cancellation(cancel);

    let state = agent.record_response(
        &agent.initial_state("time?"),
        LlmResponse::new("", vec![call("get_time", json!({}), "g1")]),
    );
    let err = node.run(state).await.unwrap_err();
    assert!(matches!(err, mold::AgentError::Cancelled));
}
