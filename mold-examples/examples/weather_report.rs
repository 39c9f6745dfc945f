//! Weather report: one structured mold, one typed mold and a clock tool, driven by a scripted
//! model through the think/dispatch loop.
//!
//! ```bash
//! RUST_LOG=mold=debug cargo run -p mold-examples --example weather_report
//! MOLD_FIELD_CONFLICT_POLICY=namespace MOLD_DEBUG=true cargo run -p mold-examples --example weather_report
//! ```

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use mold::{
    AgentBuilder, FieldType, LlmResponse, MockLlm, MockToolSource, MoldAgentConfig,
    MoldDefinition, MoldInput, Next, Node, SchemaDescriptor, ToolCall, UpdateCommand,
};

#[derive(Debug, Deserialize)]
struct Forecast {
    city: String,
    alerts: Vec<String>,
}

impl MoldInput for Forecast {
    fn input_type() -> FieldType {
        let schema = SchemaDescriptor::builder()
            .required("city", FieldType::String)
            .required("alerts", FieldType::list(FieldType::String))
            .build();
        match schema {
            Ok(schema) => FieldType::record(schema),
            Err(_) => FieldType::String,
        }
    }
}

fn scripted_model() -> MockLlm {
    let report = json!({"city": "Seattle", "temperature": 61.0, "status": "success"});
    let forecast = json!({"city": "Seattle", "alerts": ["rain"]});
    MockLlm::scripted(vec![
        LlmResponse::new(
            "Let me check the time and record what I know.",
            vec![
                ToolCall::new("get_time", "{}", "call-time"),
                ToolCall::new("weather_report", report.to_string(), "call-report"),
            ],
        ),
        LlmResponse::new(
            "Adding the forecast.",
            vec![ToolCall::new("forecast", forecast.to_string(), "call-forecast")],
        ),
    ])
    .with_final_content("Seattle is 61°F with rain expected.")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let weather_report = MoldDefinition::structured(
        "weather_report",
        "Record the current weather for a city",
        SchemaDescriptor::builder()
            .required("city", FieldType::String)
            .required("temperature", FieldType::Number)
            .required("status", FieldType::enumeration(["success", "error"]))
            .build()?,
    );
    let forecast = MoldDefinition::typed("forecast", "Record weather alerts", |f: Forecast, _: &str| {
        Ok(UpdateCommand::new()
            .set("city", json!(f.city))
            .set("alerts", json!(f.alerts)))
    })?;

    let agent = Arc::new(
        AgentBuilder::new(Arc::new(scripted_model()))
            .tools(Arc::new(MockToolSource::get_time_example()))
            .molds([weather_report, forecast])
            .prompt("You are a weather assistant. Record findings with the schema tools.")
            .config(MoldAgentConfig::from_env()?)
            .build()
            .await?,
    );
    println!("state shape:\n{}", serde_json::to_string_pretty(&agent.shape().to_json())?);

    let think = agent.think_node();
    let dispatch = agent.dispatch_node();
    let mut state = agent.initial_state("What's the weather in Seattle?");
    loop {
        let (next_state, next) = think.run(state).await?;
        state = next_state;
        if next == Next::End {
            break;
        }
        let (next_state, _) = dispatch.run(state).await?;
        state = next_state;
    }

    println!("final state:\n{}", serde_json::to_string_pretty(&state.to_json())?);
    if let Some(reply) = state.last_assistant_reply() {
        println!("assistant: {}", reply);
    }
    Ok(())
}
