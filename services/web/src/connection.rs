//! Per-connection WebSocket task.
//!
//! Each upgraded connection runs this loop on its own task: outbound
//! payloads arrive over the session channel and go to the wire; inbound
//! text frames go to the registered application callback, whose reply (if
//! any) is written straight back on the same connection. Session
//! bookkeeping stays with the web actor — this task only reports open and
//! close.

use crate::server::WebMessage;
use crate::sessions::Session;
use device_actors::Mailbox;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use warp::ws::{Message, WebSocket};

/// The single application callback for inbound WebSocket payloads.
/// Returning `Some` sends the reply back on the originating connection.
pub type SocketHandler = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

pub(crate) async fn run(socket: WebSocket, server: Mailbox<WebMessage>, handler: SocketHandler) {
    let (mut wire_tx, mut wire_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let session = Session::new(tx);
    let id = session.id();
    debug!(session = %id, "websocket connection established");
    // The handshake registers the session; it produces no reply frame.
    if server.send(WebMessage::SessionOpened(session)).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            outbound = rx.recv() => match outbound {
                Some(payload) => {
                    if let Err(e) = wire_tx.send(Message::text(payload)).await {
                        warn!(session = %id, error = %e, "failed to send to websocket");
                        break;
                    }
                }
                // The registry dropped this session.
                None => break,
            },

            inbound = wire_rx.next() => match inbound {
                Some(Ok(frame)) => {
                    if frame.is_text() {
                        let payload = frame.to_str().unwrap_or("");
                        if let Some(reply) = handler(payload) {
                            if let Err(e) = wire_tx.send(Message::text(reply)).await {
                                warn!(session = %id, error = %e, "failed to reply on websocket");
                                break;
                            }
                        }
                    } else if frame.is_close() {
                        debug!(session = %id, "websocket closed by peer");
                        break;
                    }
                }
                Some(Err(e)) => {
                    warn!(session = %id, error = %e, "websocket error");
                    break;
                }
                None => break,
            },
        }
    }

    let _ = server.send(WebMessage::SessionClosed(id)).await;
}
