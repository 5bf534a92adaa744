//! Transport abstraction over the persistent message connection
//!
//! Decouples the connection state machine from the WebSocket library's
//! callback shape: the write half hides behind [`MessageSink`] and a reader
//! task translates the read half into [`TransportEvent`]s.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use super::errors::StreamerError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Event surfaced by a connection's read side
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The peer closed the connection
    Closed,
    /// The connection failed
    Failed(String),
}

/// Write half of an established connection
#[async_trait]
pub trait MessageSink: Send {
    /// Send one text message
    async fn send_text(&mut self, payload: String) -> Result<(), StreamerError>;

    /// Close the connection
    async fn close(&mut self);
}

/// An established link: the write half plus the read-side event stream
pub struct TransportLink {
    pub sink: Box<dyn MessageSink>,
    pub events: mpsc::Receiver<TransportEvent>,
}

/// Factory for persistent message-oriented connections
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(&self, url: &str) -> Result<TransportLink, StreamerError>;
}

/// WebSocket transport over tokio-tungstenite
pub struct WsTransport;

#[async_trait]
impl Transport for WsTransport {
    async fn open(&self, url: &str) -> Result<TransportLink, StreamerError> {
        let (ws_stream, _) = connect_async(url)
            .await
            .map_err(|e| StreamerError::ConnectionFailed(e.to_string()))?;
        debug!(url, "websocket connected");

        let (write, read) = ws_stream.split();
        let (event_tx, events) = mpsc::channel(8);

        tokio::spawn(read_events(read, event_tx));

        Ok(TransportLink {
            sink: Box::new(WsSink { write }),
            events,
        })
    }
}

/// Reader task: translate the library's message stream into events.
async fn read_events(mut read: SplitStream<WsStream>, event_tx: mpsc::Sender<TransportEvent>) {
    while let Some(message) = read.next().await {
        match message {
            Ok(Message::Close(_)) => {
                let _ = event_tx.send(TransportEvent::Closed).await;
                return;
            }
            // Ping/pong are answered by the library; the collection endpoint
            // sends nothing else the client acts on.
            Ok(_) => {}
            Err(e) => {
                warn!("websocket read error: {}", e);
                let _ = event_tx.send(TransportEvent::Failed(e.to_string())).await;
                return;
            }
        }
    }
    // Stream ended without a close frame.
    let _ = event_tx.send(TransportEvent::Closed).await;
}

struct WsSink {
    write: SplitSink<WsStream, Message>,
}

#[async_trait]
impl MessageSink for WsSink {
    async fn send_text(&mut self, payload: String) -> Result<(), StreamerError> {
        self.write
            .send(Message::Text(payload))
            .await
            .map_err(|e| StreamerError::SendFailed(e.to_string()))
    }

    async fn close(&mut self) {
        let _ = self.write.send(Message::Close(None)).await;
        let _ = self.write.close().await;
    }
}
