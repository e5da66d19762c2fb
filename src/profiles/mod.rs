mod directory;

pub use directory::{upload_picture, Draft, Profile, ProfileField, ProfileId, ProfileStore};

use axum::{debug_handler, extract::{Multipart, Query, State}, http::StatusCode, response::{IntoResponse, Response}, routing::{get, post}, Json, Router};
use serde::Deserialize;

use crate::{upload::Upload, AppResult, AppState, Shared};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(search).post(save))
        .route("/draft", get(draft).patch(update_field).delete(discard_draft))
        .route("/picture", post(upload))
}

#[derive(Deserialize)]
pub(crate) struct SearchQuery {
    q: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct UpdateFieldQuery {
    field: ProfileField,
    value: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn search(
    State(profiles): State<Shared<ProfileStore>>,
    Query(SearchQuery { q }): Query<SearchQuery>,
) -> Json<Vec<Profile>> {
    let profiles = profiles.lock().await;
    Json(
        profiles
            .search(q.as_deref().unwrap_or(""))
            .into_iter()
            .cloned()
            .collect()
    )
}

#[debug_handler(state = AppState)]
pub(crate) async fn draft(State(profiles): State<Shared<ProfileStore>>) -> Json<Draft> {
    Json(profiles.lock().await.draft().clone())
}

#[debug_handler(state = AppState)]
pub(crate) async fn update_field(
    State(profiles): State<Shared<ProfileStore>>,
    Json(UpdateFieldQuery { field, value }): Json<UpdateFieldQuery>,
) -> Json<Draft> {
    let mut profiles = profiles.lock().await;
    profiles.update_field(field, value);
    Json(profiles.draft().clone())
}

#[debug_handler(state = AppState)]
pub(crate) async fn discard_draft(State(profiles): State<Shared<ProfileStore>>) -> Json<Draft> {
    let mut profiles = profiles.lock().await;
    profiles.discard_draft();
    Json(profiles.draft().clone())
}

#[debug_handler(state = AppState)]
pub(crate) async fn save(State(profiles): State<Shared<ProfileStore>>) -> Response {
    match profiles.lock().await.save() {
        Some(profile) => (StatusCode::CREATED, Json(profile.clone())).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn upload(
    State(profiles): State<Shared<ProfileStore>>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let Some(upload) = Upload::from_multipart(&mut multipart).await? else {
        return Ok((StatusCode::BAD_REQUEST, "no file provided").into_response());
    };

    let instance = upload_picture(&profiles, upload).await;
    Ok((StatusCode::ACCEPTED, Json(serde_json::json!({ "instance": instance }))).into_response())
}
