//! Action Registry
//!
//! A static mapping from action name to an invocable handler. The registry is
//! assembled once at startup through [`RegistryBuilder`], then frozen; the
//! built [`Registry`] is shared across connections behind an `Arc` and read
//! without locking.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::protocol::Params;

/// How a handler invocation can fail.
///
/// Parameter-contract violations and internal failures are kept apart because
/// they map to different wire error codes (`invalid_params` vs `server_error`).
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The supplied parameters do not satisfy the handler's contract
    #[error("{0}")]
    InvalidParams(String),

    /// Any other failure raised during invocation
    #[error("{0}")]
    Internal(String),
}

/// Outcome of a handler invocation: a JSON-representable value or a failure.
pub type HandlerResult = Result<Value, HandlerError>;

/// The uniform shape every handler is invoked through. Synchronous handlers
/// are wrapped into an immediately-ready future at registration time, so the
/// dispatcher awaits one abstraction regardless of the underlying kind.
pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

/// A registered handler, invocable with named parameters.
pub type Handler = Arc<dyn (Fn(Params) -> HandlerFuture) + Send + Sync>;

/// Builder for assembling a [`Registry`] at process start.
#[derive(Default)]
pub struct RegistryBuilder {
    handlers: HashMap<String, Handler>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asynchronous handler under the given action name.
    ///
    /// Registering a second handler under the same name replaces the first
    /// (last write wins) and logs a warning.
    pub fn register<F, Fut>(mut self, action: &str, handler: F) -> Self
        where
            F: Fn(Params) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = HandlerResult> + Send + 'static
    {
        let boxed: Handler = Arc::new(move |params| -> HandlerFuture { Box::pin(handler(params)) });
        if self.handlers.insert(action.to_string(), boxed).is_some() {
            tracing::warn!(action, "replacing previously registered handler");
        }
        self
    }

    /// Register a synchronous handler under the given action name.
    pub fn register_fn<F>(self, action: &str, handler: F) -> Self
        where F: Fn(Params) -> HandlerResult + Send + Sync + 'static
    {
        self.register(action, move |params| std::future::ready(handler(params)))
    }

    /// Freeze the builder into an immutable registry.
    pub fn build(self) -> Registry {
        Registry { handlers: self.handlers }
    }
}

/// Immutable action-name-to-handler mapping, safe for concurrent reads.
pub struct Registry {
    handlers: HashMap<String, Handler>,
}

impl Registry {
    /// Look up the handler registered under `action`.
    pub fn lookup(&self, action: &str) -> Option<&Handler> {
        self.handlers.get(action)
    }

    /// Check whether an action is registered.
    pub fn contains(&self, action: &str) -> bool {
        self.handlers.contains_key(action)
    }

    /// Names of all registered actions, for diagnostics.
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

/// Deserialize an action's params object into its typed parameter struct.
///
/// Unknown fields are rejected when the target struct opts in with
/// `#[serde(deny_unknown_fields)]`; any mismatch maps to
/// [`HandlerError::InvalidParams`].
pub fn parse_params<T: DeserializeOwned>(params: Params) -> Result<T, HandlerError> {
    serde_json
        ::from_value(Value::Object(params))
        .map_err(|e| HandlerError::InvalidParams(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn lookup_finds_registered_handler() {
        let registry = RegistryBuilder::new()
            .register_fn("ping", |_| Ok(json!("pong")))
            .build();

        let handler = registry.lookup("ping").expect("handler registered");
        let result = handler(Params::new()).await.unwrap();
        assert_eq!(result, json!("pong"));
        assert!(registry.lookup("pong").is_none());
    }

    #[tokio::test]
    async fn duplicate_registration_last_write_wins() {
        let registry = RegistryBuilder::new()
            .register_fn("version", |_| Ok(json!(1)))
            .register_fn("version", |_| Ok(json!(2)))
            .build();

        let handler = registry.lookup("version").unwrap();
        assert_eq!(handler(Params::new()).await.unwrap(), json!(2));
    }

    #[tokio::test]
    async fn async_handlers_are_awaited() {
        let registry = RegistryBuilder::new()
            .register("sleepy", |_| async {
                tokio::task::yield_now().await;
                Ok(json!("done"))
            })
            .build();

        let handler = registry.lookup("sleepy").unwrap();
        assert_eq!(handler(Params::new()).await.unwrap(), json!("done"));
    }

    #[test]
    fn parse_params_rejects_unknown_fields() {
        #[derive(Deserialize, Debug)]
        #[serde(deny_unknown_fields)]
        struct EchoParams {
            #[allow(dead_code)]
            message: String,
        }

        let err = parse_params::<EchoParams>(
            params(json!({ "message": "hi", "extra": true }))
        ).expect_err("unknown field should be rejected");
        assert!(matches!(err, HandlerError::InvalidParams(_)));
    }

    #[test]
    fn parse_params_rejects_wrong_types() {
        #[derive(Deserialize, Debug)]
        struct AddParams {
            #[allow(dead_code)]
            a: f64,
            #[allow(dead_code)]
            b: f64,
        }

        let err = parse_params::<AddParams>(
            params(json!({ "a": "ten", "b": 20 }))
        ).expect_err("non-numeric operand should be rejected");
        assert!(matches!(err, HandlerError::InvalidParams(_)));
    }
}
