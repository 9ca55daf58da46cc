//! Kitchen WebSocket session

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::core::ServerState;
use crate::message::{ChannelListener, KitchenHub, LISTENER_QUEUE};

const PING_INTERVAL: Duration = Duration::from_secs(30);

/// GET /ws/kitchen
pub async fn kitchen_ws(State(state): State<ServerState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        let (sink, stream) = socket.split();
        run_session(sink, stream, state.hub.clone(), state.shutdown.clone(), PING_INTERVAL).await;
    })
}

/// Forward hub events to one socket until it closes, a send fails or the
/// server shuts down. The listener is removed from the hub on every exit path.
pub(crate) async fn run_session<Si, St, E>(
    mut sink: Si,
    mut stream: St,
    hub: KitchenHub,
    shutdown: CancellationToken,
    ping_every: Duration,
) where
    Si: Sink<Message> + Unpin,
    St: Stream<Item = Result<Message, E>> + Unpin,
    E: std::fmt::Display,
{
    let (listener, mut rx) = ChannelListener::new(LISTENER_QUEUE);
    let id = hub.join(Arc::new(listener));

    let mut ping = tokio::time::interval(ping_every);
    ping.tick().await;

    loop {
        tokio::select! {
            payload = rx.recv() => {
                // None: the hub dropped us after a failed delivery
                let Some(payload) = payload else { break };
                if sink.send(Message::Text(payload.to_string().into())).await.is_err() {
                    break;
                }
            }

            _ = ping.tick() => {
                if sink.send(Message::Ping(Default::default())).await.is_err() {
                    break;
                }
            }

            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = id, error = %e, "Kitchen socket read failed");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }

            _ = shutdown.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
        }
    }

    hub.leave(id);
}
