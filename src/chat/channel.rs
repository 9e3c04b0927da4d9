//! The realtime WebSocket leg of a chat room.

use futures::{Sink, SinkExt, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, Result};
use crate::models::{ChatMessage, InboundEnvelope, OutboundEnvelope};

type FrameSink = Pin<Box<dyn Sink<Message, Error = WsError> + Send>>;

/// One open socket. Inbound frames are decoded by a background reader and
/// queued in arrival order; nothing is reordered or de-duplicated.
pub struct ChatChannel {
    sink: Mutex<FrameSink>,
    inbound: mpsc::UnboundedReceiver<ChatMessage>,
    open: Arc<AtomicBool>,
    reader: JoinHandle<()>,
}

impl std::fmt::Debug for ChatChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatChannel")
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

impl ChatChannel {
    pub async fn connect(url: &Url) -> Result<Self> {
        debug!(%url, "Opening chat channel");
        let (stream, _response) = tokio_tungstenite::connect_async(url.as_str()).await?;
        info!(%url, "Chat channel open");
        Ok(Self::from_stream(stream))
    }

    /// Wraps an already negotiated socket.
    pub fn from_stream<S>(stream: WebSocketStream<S>) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (sink, mut frames) = stream.split();
        let sink: FrameSink = Box::pin(sink);
        let (tx, inbound) = mpsc::unbounded_channel();
        let open = Arc::new(AtomicBool::new(true));

        let reader_open = Arc::clone(&open);
        let reader = tokio::spawn(async move {
            while let Some(frame) = frames.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<InboundEnvelope>(text.as_str()) {
                            Ok(envelope) => {
                                if tx.send(ChatMessage::from(envelope)).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!(error = %e, "Dropping malformed chat frame"),
                        }
                    }
                    Ok(Message::Close(frame)) => {
                        debug!(?frame, "Server closed chat channel");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "Chat channel read failed");
                        break;
                    }
                }
            }
            reader_open.store(false, Ordering::SeqCst);
        });

        Self {
            sink: Mutex::new(sink),
            inbound,
            open,
            reader,
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Sends one frame. There is no outbound queue: a closed channel refuses.
    pub async fn send(&self, envelope: &OutboundEnvelope) -> Result<()> {
        if !self.is_open() {
            return Err(ClientError::ChannelNotOpen);
        }

        let payload =
            serde_json::to_string(envelope).map_err(|e| ClientError::Channel(e.to_string()))?;
        let mut sink = self.sink.lock().await;
        sink.send(Message::text(payload)).await.map_err(|e| {
            self.open.store(false, Ordering::SeqCst);
            ClientError::from(e)
        })
    }

    /// Next inbound message; `None` once the socket is gone and the queue drained.
    pub async fn recv(&mut self) -> Option<ChatMessage> {
        self.inbound.recv().await
    }

    /// Already received messages without waiting.
    pub fn try_recv(&mut self) -> Option<ChatMessage> {
        self.inbound.try_recv().ok()
    }

    /// Sends a close frame and stops the reader.
    pub async fn close(&self) {
        let was_open = self.open.swap(false, Ordering::SeqCst);
        if was_open {
            let mut sink = self.sink.lock().await;
            if let Err(e) = sink.close().await {
                debug!(error = %e, "Close handshake failed");
            }
        }
        self.reader.abort();
        debug!("Chat channel closed");
    }
}

impl Drop for ChatChannel {
    fn drop(&mut self) {
        self.open.store(false, Ordering::SeqCst);
        self.reader.abort();
    }
}
