mod schedule;

pub use schedule::{Schedule, Session, SessionForm, SessionId, PLACEHOLDER_IMAGE};

use axum::{debug_handler, extract::{Path, Query, State}, http::StatusCode, response::{IntoResponse, Response}, routing::{get, patch, post}, Json, Router};
use serde::{Deserialize, Serialize};

use crate::{res, AppResult, AppState, Shared};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/draft", patch(edit_draft))
        .route("/modal", post(toggle_modal))
        .route("/{id}/join", post(join))
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: Session,
    pub joined: bool,
}

impl SessionView {
    fn new(schedule: &Schedule, session: &Session) -> Self {
        Self {
            joined: schedule.is_joined(session.id),
            session: session.clone(),
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct SearchQuery {
    q: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn list(
    State(schedule): State<Shared<Schedule>>,
    Query(SearchQuery { q }): Query<SearchQuery>,
) -> Json<Vec<SessionView>> {
    let schedule = schedule.lock().await;
    Json(
        schedule
            .search(q.as_deref().unwrap_or(""))
            .into_iter()
            .map(|session| SessionView::new(&schedule, session))
            .collect()
    )
}

#[debug_handler(state = AppState)]
pub(crate) async fn create(
    State(schedule): State<Shared<Schedule>>,
    Json(form): Json<SessionForm>,
) -> Response {
    let mut schedule = schedule.lock().await;
    match schedule.create_with(form) {
        Some(session) => (StatusCode::CREATED, Json(session.clone())).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn edit_draft(
    State(schedule): State<Shared<Schedule>>,
    Json(form): Json<SessionForm>,
) -> Json<SessionForm> {
    let mut schedule = schedule.lock().await;
    schedule.edit_draft(form);
    Json(schedule.draft().clone())
}

#[debug_handler(state = AppState)]
pub(crate) async fn toggle_modal(State(schedule): State<Shared<Schedule>>) -> Json<bool> {
    Json(schedule.lock().await.toggle_modal())
}

#[debug_handler(state = AppState)]
pub(crate) async fn join(
    State(schedule): State<Shared<Schedule>>,
    Path(id): Path<SessionId>,
) -> AppResult<Response> {
    let Some(newly_joined) = schedule.lock().await.join(id) else {
        return res::sorry("session");
    };

    Ok(Json(serde_json::json!({ "id": id, "joined": true, "newly_joined": newly_joined })).into_response())
}
