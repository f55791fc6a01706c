//! ws-rpc
//!
//! A minimal remote-procedure-call protocol over persistent WebSocket
//! connections. Clients send `{request_id, action, params}` requests; the
//! server validates each message, dispatches the action to a registered
//! handler, and returns a correlated `ok`/`error` response. Failures are
//! isolated per request: a malformed message or a failing handler never
//! terminates the connection, and only the request ID correlates responses
//! to requests.

pub mod client;
pub mod dispatch;
pub mod errors;
pub mod functions;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod transport;

// Re-export commonly used items
pub use client::RpcClient;
pub use dispatch::Dispatcher;
pub use errors::Error;
pub use protocol::{ ErrorCode, Params, Request, Response, RpcError };
pub use registry::{ Registry, RegistryBuilder };
pub use server::{ Server, ServerOptions };
pub use transport::Connection;
