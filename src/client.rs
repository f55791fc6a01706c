//! RPC Client Call Helper
//!
//! The symmetric counterpart of the server: generates a fresh request ID,
//! sends a request, and awaits the correlated response within a deadline.
//! Timeouts and correlation mismatches are local call failures, kept distinct
//! from protocol errors the server reports inside a response.

use std::time::Duration;

use tokio::time::timeout;
use uuid::Uuid;

use crate::errors::Error;
use crate::protocol::{ Params, Request, Response };
use crate::transport::{ self, ClientConnection, Connection };

/// Default deadline for a single call
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// An RPC client holding one connection for sequential calls.
pub struct RpcClient<C: Connection> {
    connection: C,
    call_timeout: Duration,
}

impl RpcClient<ClientConnection> {
    /// Connect to the server at `url` (e.g. `ws://127.0.0.1:8000`).
    pub async fn connect(url: &str) -> Result<Self, Error> {
        Ok(Self::over(transport::connect(url).await?))
    }
}

impl<C: Connection> RpcClient<C> {
    /// Build a client over an already-established connection.
    pub fn over(connection: C) -> Self {
        Self {
            connection,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Set the per-call response deadline.
    pub fn with_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Call a remote action and await its correlated response.
    ///
    /// Fails with [`Error::Timeout`] when no response arrives within the
    /// deadline, and with [`Error::CorrelationMismatch`] when a response
    /// arrives for a different request ID — which guards against stale or
    /// misrouted responses on a shared connection.
    pub async fn call(&mut self, action: &str, params: Params) -> Result<Response, Error> {
        // Fresh ID per call; correlation is the only ordering guarantee
        let request_id = Uuid::new_v4().to_string();
        let request = Request {
            request_id: Some(request_id.clone()),
            action: action.to_string(),
            params,
        };

        self.connection.send(serde_json::to_string(&request)?).await?;

        let raw = timeout(self.call_timeout, self.connection.receive()).await
            .map_err(|_|
                Error::Timeout(format!("no response within {:?}", self.call_timeout))
            )??
            .ok_or(Error::ConnectionClosed)?;

        let response: Response = serde_json::from_str(&raw)?;
        if response.request_id.as_deref() != Some(request_id.as_str()) {
            return Err(Error::CorrelationMismatch {
                expected: request_id,
                received: response.request_id,
            });
        }

        Ok(response)
    }

    /// Close the underlying connection.
    pub async fn close(&mut self) -> Result<(), Error> {
        self.connection.close().await
    }
}

/// Make a single remote call over a fresh connection.
///
/// Connects, sends the request, awaits the correlated response within
/// `call_timeout`, and closes the connection regardless of the outcome.
pub async fn call_action(
    url: &str,
    action: &str,
    params: Params,
    call_timeout: Duration
) -> Result<Response, Error> {
    let mut client = RpcClient::connect(url).await?.with_timeout(call_timeout);
    let result = client.call(action, params).await;
    let _ = client.close().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    /// Scripted connection standing in for a live server
    struct MockConnection {
        /// Response script: each receive pops the front entry. The `{id}`
        /// placeholder is replaced with the last sent request's ID.
        replies: Vec<String>,
        sent: Vec<String>,
    }

    impl MockConnection {
        fn replying(replies: &[&str]) -> Self {
            Self {
                replies: replies.iter().rev().map(|s| s.to_string()).collect(),
                sent: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl Connection for MockConnection {
        async fn send(&mut self, text: String) -> Result<(), Error> {
            self.sent.push(text);
            Ok(())
        }

        async fn receive(&mut self) -> Result<Option<String>, Error> {
            match self.replies.pop() {
                Some(template) => {
                    let request: Request = serde_json::from_str(
                        self.sent.last().expect("receive before send")
                    ).unwrap();
                    let id = request.request_id.unwrap();
                    Ok(Some(template.replace("{id}", &id)))
                }
                // No scripted reply: suspend forever, like a silent server
                None => std::future::pending().await,
            }
        }

        async fn close(&mut self) -> Result<(), Error> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn call_returns_correlated_response() {
        let mock = MockConnection::replying(
            &[r#"{"request_id": "{id}", "status": "ok", "result": 30}"#]
        );
        let mut client = RpcClient::over(mock);

        let response = client.call("add_numbers", Params::new()).await.unwrap();
        assert!(response.is_ok());
        assert_eq!(
            serde_json::to_value(&response.outcome).unwrap()["result"],
            json!(30)
        );
    }

    #[tokio::test]
    async fn mismatched_request_id_is_a_correlation_error() {
        let mock = MockConnection::replying(
            &[r#"{"request_id": "someone-elses", "status": "ok", "result": 1}"#]
        );
        let mut client = RpcClient::over(mock);

        let err = client.call("echo", Params::new()).await.unwrap_err();
        assert!(matches!(err, Error::CorrelationMismatch { .. }));
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let mock = MockConnection::replying(&[]);
        let mut client = RpcClient::over(mock).with_timeout(Duration::from_millis(20));

        let err = client.call("echo", Params::new()).await.unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }
}
