//! WebSocket RPC Server
//!
//! The server accepts WebSocket connections and runs one connection-handler
//! task per client. Inside a connection, each incoming message is validated,
//! dispatched, and answered independently: a malformed message or a failing
//! handler produces an error response and the connection keeps serving.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{ SinkExt, StreamExt };
use tokio::net::{ TcpListener, TcpStream };
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::{ self, protocol::Message as WsMessage };
use uuid::Uuid;

use crate::dispatch::Dispatcher;
use crate::errors::Error;
use crate::protocol::{ self, ErrorCode, Response, RpcError };
use crate::registry::Registry;

/// Capacity of the per-connection outbound response queue
const OUTBOUND_QUEUE_SIZE: usize = 64;

/// Configuration options for the RPC server.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Address to bind the listener to
    pub bind_address: SocketAddr,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".parse().expect("static address"),
        }
    }
}

/// A bound RPC server, ready to accept connections.
pub struct Server {
    listener: TcpListener,
    dispatcher: Dispatcher,
}

impl Server {
    /// Bind the listening socket. Failing to bind is the only fatal startup
    /// error; everything after this point is recovered per-connection.
    pub async fn bind(registry: Arc<Registry>, options: ServerOptions) -> Result<Self, Error> {
        let listener = TcpListener::bind(options.bind_address).await?;
        Ok(Self {
            listener,
            dispatcher: Dispatcher::new(registry),
        })
    }

    /// The address the server is actually listening on. Useful with port 0.
    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections forever, spawning one handler task per client.
    /// No single connection's failure affects others or this loop.
    pub async fn run(self) -> Result<(), Error> {
        tracing::info!(address = %self.local_addr()?, "RPC server listening");

        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            let dispatcher = self.dispatcher.clone();
            tokio::spawn(async move {
                match tokio_tungstenite::accept_async(stream).await {
                    Ok(socket) => handle_connection(socket, peer, dispatcher).await,
                    Err(e) => {
                        tracing::warn!(%peer, error = %e, "WebSocket handshake failed");
                    }
                }
            });
        }
    }
}

/// Handle a single client connection throughout its lifetime.
///
/// The socket is split into a read half driven here and a write half owned by
/// a dedicated writer task fed through a channel. Each message is dispatched
/// in its own task, so a slow handler never blocks the read loop and responses
/// may complete out of arrival order; the request ID is the only correlation.
async fn handle_connection(
    socket: WebSocketStream<TcpStream>,
    peer: SocketAddr,
    dispatcher: Dispatcher
) {
    let conn_id = Uuid::new_v4().to_string();
    tracing::info!(%conn_id, %peer, "client connected");

    // Emit the disconnect event on every exit path
    let _disconnect = scopeguard::guard(conn_id.clone(), |id| {
        tracing::info!(conn_id = %id, "client disconnected");
    });

    let (mut sink, mut stream) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(OUTBOUND_QUEUE_SIZE);

    // Writer task: serializes access to the write half. When the connection
    // ends, the channel closes and any late response is dropped silently.
    let writer = tokio::spawn(async move {
        while let Some(text) = outbound_rx.recv().await {
            if sink.send(WsMessage::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => {
                spawn_request(text.to_string(), &conn_id, &dispatcher, &outbound_tx);
            }
            Ok(WsMessage::Binary(data)) => {
                // Binary frames carrying UTF-8 are treated as text; anything
                // else is answered like any other undecodable payload
                match String::from_utf8(data.to_vec()) {
                    Ok(text) => spawn_request(text, &conn_id, &dispatcher, &outbound_tx),
                    Err(_) => {
                        let response = Response::error(
                            None,
                            RpcError::new(ErrorCode::InvalidJson, "Payload is not valid JSON")
                        );
                        send_response(&outbound_tx, &conn_id, response).await;
                    }
                }
            }
            Ok(WsMessage::Close(_)) => {
                break;
            }
            // Ping/Pong frames are answered by tungstenite itself
            Ok(_) => {}
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                break;
            }
            Err(e) => {
                tracing::error!(%conn_id, error = %e, "connection-level error");
                break;
            }
        }
    }

    // Dropping our sender lets the writer drain and exit once in-flight
    // request tasks have finished or abandoned their sends
    drop(outbound_tx);
    let _ = writer.await;
}

/// Validate and dispatch one raw message in its own task, answering on the
/// connection's outbound queue.
fn spawn_request(
    raw: String,
    conn_id: &str,
    dispatcher: &Dispatcher,
    outbound_tx: &mpsc::Sender<String>
) {
    let conn_id = conn_id.to_string();
    let dispatcher = dispatcher.clone();
    let outbound_tx = outbound_tx.clone();

    tokio::spawn(async move {
        let response = match protocol::parse_request(&raw) {
            Ok(request) => dispatcher.dispatch(request).await,
            Err(violation) => Response::from(violation),
        };
        send_response(&outbound_tx, &conn_id, response).await;
    });
}

async fn send_response(outbound_tx: &mpsc::Sender<String>, conn_id: &str, response: Response) {
    match serde_json::to_string(&response) {
        Ok(json) => {
            if outbound_tx.send(json).await.is_err() {
                tracing::debug!(conn_id, "connection closed before response could be delivered");
            }
        }
        Err(e) => {
            tracing::error!(conn_id, error = %e, "failed to serialize response");
        }
    }
}
