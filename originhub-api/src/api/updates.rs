use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use originhub_app::infrastructure::realtime::BroadcastHub;
use originhub_app::AppContext;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

pub(crate) async fn idea_updates(
    ws: WebSocketUpgrade,
    State(ctx): State<AppContext>,
    Path(idea_id): Path<Uuid>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_updates(socket, ctx.updates, idea_id))
}

/// Forwards hub events as JSON text frames and echoes client text frames
/// back as `pong`. Ends when either side goes away.
async fn stream_updates(socket: WebSocket, hub: BroadcastHub, idea_id: Uuid) {
    let mut events = hub.subscribe(idea_id);
    let (mut sink, mut stream) = socket.split();
    tracing::debug!(%idea_id, "Update stream opened");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let payload = match serde_json::to_string(&event) {
                        Ok(payload) => payload,
                        Err(e) => {
                            tracing::warn!(%idea_id, error = %e, "Failed to encode update");
                            continue;
                        }
                    };
                    if sink.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(%idea_id, skipped, "Update stream lagged");
                }
                Err(RecvError::Closed) => break,
            },
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let pong = serde_json::json!({ "type": "pong", "data": text.as_str() });
                    if sink.send(Message::Text(pong.to_string().into())).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    drop(events);
    hub.prune();
    tracing::debug!(%idea_id, "Update stream closed");
}
