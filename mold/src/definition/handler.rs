//! Handler trait and the stock handler shapes (plain function, typed input, structured echo).

use std::marker::PhantomData;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{HandlerError, UpdateCommand};
use crate::schema::MoldInput;

/// Turns a validated input record into an [`UpdateCommand`].
///
/// Handlers receive the coerced record (declared fields only) and the call id. They may await
/// external dependencies; the dispatcher runs each call on its own task.
#[async_trait]
pub trait MoldHandler: Send + Sync {
    async fn handle(
        &self,
        input: Map<String, Value>,
        call_id: &str,
    ) -> Result<UpdateCommand, HandlerError>;
}

/// Handler backed by a synchronous function.
pub struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F>
where
    F: Fn(Map<String, Value>, &str) -> Result<UpdateCommand, HandlerError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> MoldHandler for FnHandler<F>
where
    F: Fn(Map<String, Value>, &str) -> Result<UpdateCommand, HandlerError> + Send + Sync,
{
    async fn handle(
        &self,
        input: Map<String, Value>,
        call_id: &str,
    ) -> Result<UpdateCommand, HandlerError> {
        (self.f)(input, call_id)
    }
}

/// Handler that deserializes the validated record into `I` before calling `f`.
pub struct TypedHandler<I, F> {
    f: F,
    _input: PhantomData<fn() -> I>,
}

impl<I, F> TypedHandler<I, F>
where
    I: MoldInput,
    F: Fn(I, &str) -> Result<UpdateCommand, HandlerError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _input: PhantomData,
        }
    }
}

#[async_trait]
impl<I, F> MoldHandler for TypedHandler<I, F>
where
    I: MoldInput,
    F: Fn(I, &str) -> Result<UpdateCommand, HandlerError> + Send + Sync,
{
    async fn handle(
        &self,
        input: Map<String, Value>,
        call_id: &str,
    ) -> Result<UpdateCommand, HandlerError> {
        let typed: I = serde_json::from_value(Value::Object(input))
            .map_err(|e| HandlerError::Failed(format!("input does not match declared type: {}", e)))?;
        (self.f)(typed, call_id)
    }
}

/// Writes the validated record into state under the mold's field names and echoes it as a
/// tool message.
pub struct StructuredHandler {
    mold_name: String,
}

impl StructuredHandler {
    pub fn new(mold_name: impl Into<String>) -> Self {
        Self {
            mold_name: mold_name.into(),
        }
    }
}

#[async_trait]
impl MoldHandler for StructuredHandler {
    async fn handle(
        &self,
        input: Map<String, Value>,
        call_id: &str,
    ) -> Result<UpdateCommand, HandlerError> {
        Ok(UpdateCommand::from_record(input, call_id, &self.mold_name))
    }
}
