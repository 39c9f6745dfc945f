//! Sessions: per-session state, merges applied under the session lock, cancellation.

mod init_logging;

use std::sync::Arc;
use std::time::Duration;

use mold::{
    create_mold_agent, AgentError, FieldType, LlmResponse, MockLlm, MockToolSource, MoldAgent,
    MoldDefinition, SchemaDescriptor, ToolCall,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;

async fn agent() -> Arc<MoldAgent> {
    let schema = SchemaDescriptor::builder()
        .required("city", FieldType::String)
        .optional("alerts", FieldType::list(FieldType::String))
        .build()
        .unwrap();
    let tools = MockToolSource::get_time_example().with_delay(Duration::from_millis(20));
    Arc::new(
        create_mold_agent(
            Arc::new(MockLlm::with_no_tool_calls("Noted.")),
            Some(Arc::new(tools)),
            vec![MoldDefinition::structured("alert", "Record alerts", schema)],
            "",
            None,
        )
        .await
        .unwrap(),
    )
}

fn alert(city: &str, alert: &str, id: &str) -> LlmResponse {
    LlmResponse::new(
        "",
        vec![ToolCall::new(
            "alert",
            json!({"city": city, "alerts": [alert]}).to_string(),
            id,
        )],
    )
}

/// **Scenario**: Concurrent batches on one session are all merged; none is lost.
#[tokio::test]
async fn concurrent_applies_on_one_session_all_land() {
    let session = Arc::new(agent().await.session("start"));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let session = session.clone();
            tokio::spawn(async move {
                session
                    .apply(
                        alert("Seattle", &format!("a{}", i), &format!("c{}", i)),
                        &CancellationToken::new(),
                    )
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let state = session.snapshot().await;
    let alerts = state.get("alerts").unwrap().as_array().unwrap();
    assert_eq!(alerts.len(), 8);
    // user + 8 * (assistant + tool message)
    assert_eq!(state.messages.len(), 17);
}

/// **Scenario**: Two sessions of one agent do not see each other's state.
#[tokio::test]
async fn sessions_are_independent() {
    let agent = agent().await;
    let a = agent.session("a");
    let b = agent.session("b");
    a.apply(alert("Seattle", "rain", "c1"), &CancellationToken::new())
        .await
        .unwrap();
    b.apply(alert("Portland", "wind", "c2"), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(a.snapshot().await.get("city"), Some(&json!("Seattle")));
    assert_eq!(b.snapshot().await.get("city"), Some(&json!("Portland")));
}

/// **Scenario**: A cancelled batch stores nothing, not even the assistant message.
#[tokio::test]
async fn cancelled_apply_leaves_state_untouched() {
    let session = agent().await.session("start");
    let before = session.snapshot().await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let output = LlmResponse::new("", vec![ToolCall::new("get_time", "{}", "g1")]);
    let err = session.apply(output, &cancel).await.unwrap_err();
    assert!(matches!(err, AgentError::Cancelled));
    assert_eq!(session.snapshot().await, before);
}

#[tokio::test]
async fn think_then_apply_final_answer() {
    let session = agent().await.session("hello");
    session.push_user("any alerts?").await;
    let output = session.think().await.unwrap();
    let state = session
        .apply(output, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(state.messages.len(), 3);
    assert_eq!(state.last_assistant_reply(), Some("Noted."));
    assert!(state.pending_tool_calls().is_none());
}
