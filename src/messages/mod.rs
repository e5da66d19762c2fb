mod thread;
mod ws;

pub use thread::{Inbox, Message, PanelState, Theme, ME};

use axum::{debug_handler, extract::{Multipart, Path, Query, State}, http::StatusCode, response::{IntoResponse, Response}, routing::{get, post, put}, Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::{res, upload::{ObjectStore, Upload}, AppResult, AppState, Shared};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(panel))
        .route("/draft", put(set_draft))
        .route("/draft/emoji", post(insert_emoji))
        .route("/theme", post(toggle_theme))
        .route("/emoji-picker", post(toggle_emoji_picker))
        .route("/files", post(attach_file))
        .route("/ws", get(ws::inbox_ws))
        .route("/{peer}", get(select_peer).post(send))
}

/// What gets pushed to every open socket when a message lands.
#[derive(Serialize)]
struct ChatEvent<'a> {
    peer: &'a str,
    message: &'a Message,
}

pub(crate) fn announce(tx: &broadcast::Sender<String>, peer: &str, message: &Message) {
    match serde_json::to_string(&ChatEvent { peer, message }) {
        // no subscribers is fine
        Ok(event) => { let _ = tx.send(event); }
        Err(err) => tracing::warn!("couldn't encode chat event: {err}"),
    }
}

#[derive(Serialize)]
pub struct PanelView<'a> {
    pub peers: Vec<&'a str>,
    #[serde(flatten)]
    pub panel: &'a PanelState,
    pub messages: &'a [Message],
}

impl<'a> PanelView<'a> {
    fn new(inbox: &'a Inbox, query: &str) -> Self {
        Self {
            peers: inbox.peers(query),
            panel: inbox.panel(),
            messages: inbox.active_thread(),
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct PeerQuery {
    q: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct SendMessageQuery {
    pub(crate) text: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct EmojiQuery {
    emoji: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn panel(
    State(inbox): State<Shared<Inbox>>,
    Query(PeerQuery { q }): Query<PeerQuery>,
) -> Response {
    let inbox = inbox.lock().await;
    Json(PanelView::new(&inbox, q.as_deref().unwrap_or(""))).into_response()
}

#[debug_handler(state = AppState)]
pub(crate) async fn select_peer(
    State(inbox): State<Shared<Inbox>>,
    Path(peer): Path<String>,
) -> AppResult<Response> {
    let mut inbox = inbox.lock().await;
    if !inbox.select_peer(&peer) {
        return res::sorry("conversation");
    }

    Ok(Json(PanelView::new(&inbox, "")).into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn send(
    State(inbox): State<Shared<Inbox>>,
    State(tx): State<broadcast::Sender<String>>,
    Path(peer): Path<String>,
    Json(SendMessageQuery { text }): Json<SendMessageQuery>,
) -> AppResult<Response> {
    let mut inbox = inbox.lock().await;
    if !inbox.select_peer(&peer) {
        return res::sorry("conversation");
    }

    let sent = match text {
        Some(text) => inbox.send_text(&text).cloned(),
        None => inbox.send_draft().cloned(),
    };
    let Some(message) = sent else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    announce(&tx, inbox.active(), &message);
    Ok((StatusCode::CREATED, Json(message)).into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn attach_file(
    State(inbox): State<Shared<Inbox>>,
    State(objects): State<Shared<ObjectStore>>,
    State(tx): State<broadcast::Sender<String>>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let Some(upload) = Upload::from_multipart(&mut multipart).await? else {
        return Ok((StatusCode::BAD_REQUEST, "no file provided").into_response());
    };
    let object = objects.lock().await.register(upload);

    let mut inbox = inbox.lock().await;
    let Some(message) = inbox.attach_file(&object).cloned() else {
        return res::sorry("conversation");
    };

    announce(&tx, inbox.active(), &message);
    Ok((StatusCode::CREATED, Json(message)).into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn set_draft(
    State(inbox): State<Shared<Inbox>>,
    Json(SendMessageQuery { text }): Json<SendMessageQuery>,
) -> Response {
    inbox.lock().await.set_draft(text.unwrap_or_default());
    StatusCode::NO_CONTENT.into_response()
}

#[debug_handler(state = AppState)]
pub(crate) async fn insert_emoji(
    State(inbox): State<Shared<Inbox>>,
    Json(EmojiQuery { emoji }): Json<EmojiQuery>,
) -> Response {
    let mut inbox = inbox.lock().await;
    inbox.insert_emoji(&emoji);
    Json(inbox.panel().clone()).into_response()
}

#[debug_handler(state = AppState)]
pub(crate) async fn toggle_theme(State(inbox): State<Shared<Inbox>>) -> Json<Theme> {
    Json(inbox.lock().await.toggle_theme())
}

#[debug_handler(state = AppState)]
pub(crate) async fn toggle_emoji_picker(State(inbox): State<Shared<Inbox>>) -> Json<bool> {
    Json(inbox.lock().await.toggle_emoji_picker())
}
