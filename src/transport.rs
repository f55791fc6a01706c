//! Transport Layer
//!
//! This module defines the [`Connection`] trait the protocol core is written
//! against, plus its WebSocket implementation. A connection carries discrete
//! UTF-8 text messages; framing and keep-alive are the transport's business,
//! never the protocol's.

use async_trait::async_trait;
use futures_util::{ SinkExt, StreamExt };
use tokio::net::TcpStream;
use tokio_tungstenite::{ MaybeTlsStream, WebSocketStream, connect_async };
use tokio_tungstenite::tungstenite::{ self, protocol::Message as WsMessage };
use url::Url;

use crate::errors::Error;

/// A persistent, message-oriented connection to a peer.
#[async_trait]
pub trait Connection: Send {
    /// Send one text message.
    async fn send(&mut self, text: String) -> Result<(), Error>;

    /// Receive the next text message, suspending until one arrives.
    /// Returns `Ok(None)` when the peer closed the connection cleanly.
    async fn receive(&mut self) -> Result<Option<String>, Error>;

    /// Close the connection.
    async fn close(&mut self) -> Result<(), Error>;
}

/// WebSocket-backed [`Connection`].
pub struct WsConnection<S> {
    inner: WebSocketStream<S>,
}

/// The client-side connection type produced by [`connect`].
pub type ClientConnection = WsConnection<MaybeTlsStream<TcpStream>>;

/// Connect to a WebSocket RPC server at `url` (e.g. `ws://127.0.0.1:8000`).
pub async fn connect(url: &str) -> Result<ClientConnection, Error> {
    Url::parse(url).map_err(|e| Error::Transport(format!("Invalid WebSocket URL: {}", e)))?;

    let (stream, _) = connect_async(url).await.map_err(|e|
        Error::Transport(format!("WebSocket connection error: {}", e))
    )?;

    Ok(WsConnection { inner: stream })
}

impl<S> WsConnection<S> {
    /// Wrap an already-established WebSocket stream.
    pub fn new(inner: WebSocketStream<S>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S> Connection
    for WsConnection<S>
    where S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send
{
    async fn send(&mut self, text: String) -> Result<(), Error> {
        self.inner
            .send(WsMessage::Text(text.into())).await
            .map_err(|e| Error::Transport(format!("WebSocket send error: {}", e)))
    }

    async fn receive(&mut self) -> Result<Option<String>, Error> {
        while let Some(frame) = self.inner.next().await {
            match frame {
                Ok(WsMessage::Text(text)) => {
                    return Ok(Some(text.to_string()));
                }
                Ok(WsMessage::Binary(data)) => {
                    let text = std::str
                        ::from_utf8(&data)
                        .map_err(|_|
                            Error::Transport("Binary frame is not valid UTF-8".to_string())
                        )?;
                    return Ok(Some(text.to_string()));
                }
                Ok(WsMessage::Close(_)) => {
                    return Ok(None);
                }
                // Ping/Pong frames are answered by tungstenite itself
                Ok(_) => {
                    continue;
                }
                Err(
                    tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed,
                ) => {
                    return Ok(None);
                }
                Err(e) => {
                    return Err(Error::Transport(format!("WebSocket receive error: {}", e)));
                }
            }
        }

        Ok(None)
    }

    async fn close(&mut self) -> Result<(), Error> {
        match self.inner.close(None).await {
            Ok(()) => Ok(()),
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(e) => Err(Error::Transport(format!("WebSocket close error: {}", e))),
        }
    }
}
