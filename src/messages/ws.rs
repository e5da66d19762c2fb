use axum::{debug_handler, extract::{State, WebSocketUpgrade}, response::IntoResponse};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::{AppState, Shared};

use super::{announce, Inbox, SendMessageQuery};

#[debug_handler(state = AppState)]
pub(crate) async fn inbox_ws(
    State(inbox): State<Shared<Inbox>>,
    State(tx): State<broadcast::Sender<String>>,

    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(async move |stream| {
        let mut rx = tx.subscribe();
        let (mut sender, mut receiver) = stream.split();

        let broadcast_task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if sender.send(event.into()).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "socket fell behind the chat feed");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        while let Some(Ok(frame)) = receiver.next().await {
            let Ok(SendMessageQuery { text }) = serde_json::from_slice(&frame.into_data()) else {
                continue
            };

            let mut inbox = inbox.lock().await;
            if let Some(message) = inbox.send_text(&text.unwrap_or_default()).cloned() {
                announce(&tx, inbox.active(), &message);
            }
        }

        // reader is gone, stop forwarding to its sink
        broadcast_task.abort();
    })
}
