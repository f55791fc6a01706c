//! Request Dispatcher
//!
//! Given a validated [`Request`], the dispatcher looks up the handler in the
//! registry, invokes it, and converts the outcome into a [`Response`]. Handler
//! failures are confined here: they become error responses, never panics or
//! terminated connections.

use std::sync::Arc;

use crate::protocol::{ ErrorCode, Request, Response, RpcError };
use crate::registry::{ HandlerError, Registry };

/// Dispatches validated requests against a read-only registry.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Invoke the handler for `request` and build the correlated response.
    ///
    /// Every failure path carries the request's ID so the client can match the
    /// error to the call that caused it. Internal handler failures are logged
    /// with full context before being reported as `server_error`.
    pub async fn dispatch(&self, request: Request) -> Response {
        let Request { request_id, action, params } = request;

        let Some(handler) = self.registry.lookup(&action) else {
            return Response::error(
                request_id,
                RpcError::new(ErrorCode::UnknownAction, format!("Unknown action '{}'", action))
            );
        };

        match handler(params).await {
            Ok(result) => Response::ok(request_id, result),
            Err(HandlerError::InvalidParams(message)) => {
                Response::error(request_id, RpcError::new(ErrorCode::InvalidParams, message))
            }
            Err(HandlerError::Internal(message)) => {
                tracing::error!(
                    %action,
                    request_id = request_id.as_deref().unwrap_or("<none>"),
                    error = %message,
                    "unhandled error while executing action"
                );
                Response::error(request_id, RpcError::new(ErrorCode::ServerError, message))
            }
        }
    }
}
