mod feed;
mod highlight;

pub use feed::{Confirmation, NewPost, Post, PostFeed, PostId};
pub use highlight::{highlight, Segment, SegmentKind};

use axum::{debug_handler, extract::{Multipart, Path, Query, State}, http::StatusCode, response::{IntoResponse, Response}, routing::{get, post, put}, Json, Router};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{auth::SessionContext, res, upload::{ObjectStore, Upload}, AppResult, AppState, Shared};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(feed).post(create_post))
        .route("/image", post(upload_image))
        .route("/{id}", axum::routing::delete(delete_post))
        .route("/{id}/like", post(toggle_like))
        .route("/{id}/comment", put(comment_draft))
        .route("/{id}/comments", post(add_comment))
}

#[derive(Debug, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub segments: Vec<Segment>,
}

impl From<&Post> for PostView {
    fn from(post: &Post) -> Self {
        Self {
            segments: highlight(&post.content),
            post: post.clone(),
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct SearchQuery {
    q: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct CreatePostQuery {
    title: Option<String>,
    content: String,
    image: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct CommentQuery {
    text: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct DeleteQuery {
    #[serde(default)]
    confirm: bool,
}

#[debug_handler(state = AppState)]
pub(crate) async fn feed(
    State(feed): State<Shared<PostFeed>>,
    Query(SearchQuery { q }): Query<SearchQuery>,
) -> Json<Vec<PostView>> {
    let feed = feed.lock().await;
    let posts = match q {
        Some(q) => feed.search(&q).into_iter().map(PostView::from).collect(),
        None => feed.posts().iter().map(PostView::from).collect(),
    };

    Json(posts)
}

#[debug_handler(state = AppState)]
pub(crate) async fn create_post(
    State(feed): State<Shared<PostFeed>>,
    session: Session,
    Json(CreatePostQuery { title, content, image }): Json<CreatePostQuery>,
) -> AppResult<Response> {
    let author = SessionContext::load(&session).await?.author();

    let mut feed = feed.lock().await;
    let Some(post) = feed.create(NewPost { author, title, content, image }) else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    Ok((StatusCode::CREATED, Json(PostView::from(post))).into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn upload_image(
    State(objects): State<Shared<ObjectStore>>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let Some(upload) = Upload::from_multipart(&mut multipart).await? else {
        return Ok((StatusCode::BAD_REQUEST, "no file provided").into_response());
    };

    let object = objects.lock().await.register(upload);
    Ok((StatusCode::CREATED, Json(object)).into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn toggle_like(
    State(feed): State<Shared<PostFeed>>,
    Path(id): Path<PostId>,
) -> AppResult<Response> {
    let mut feed = feed.lock().await;
    let Some(post) = feed.toggle_like(id) else {
        return res::sorry("post");
    };

    Ok(Json(PostView::from(post)).into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn comment_draft(
    State(feed): State<Shared<PostFeed>>,
    Path(id): Path<PostId>,
    Json(CommentQuery { text }): Json<CommentQuery>,
) -> AppResult<Response> {
    if !feed.lock().await.set_comment_draft(id, text.unwrap_or_default()) {
        return res::sorry("post");
    }

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn add_comment(
    State(feed): State<Shared<PostFeed>>,
    Path(id): Path<PostId>,
    Json(CommentQuery { text }): Json<CommentQuery>,
) -> AppResult<Response> {
    let mut feed = feed.lock().await;
    let post = match text {
        Some(text) => feed.add_comment(id, &text),
        None => feed.submit_comment_draft(id),
    };
    let Some(post) = post else {
        return res::sorry("post");
    };

    Ok(Json(PostView::from(post)).into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn delete_post(
    State(feed): State<Shared<PostFeed>>,
    State(objects): State<Shared<ObjectStore>>,
    Path(id): Path<PostId>,
    Query(DeleteQuery { confirm }): Query<DeleteQuery>,
) -> AppResult<Response> {
    let mut feed = feed.lock().await;
    if feed.get(id).is_none() {
        return res::sorry("post");
    }

    let Some(post) = feed.delete(id, confirm.into()) else {
        return Ok((StatusCode::PRECONDITION_REQUIRED, "confirm=true is required to delete a post").into_response());
    };

    // uploaded images go with their post; external urls are left alone
    if let Some(image) = post.image {
        objects.lock().await.release(&image);
    }

    Ok(StatusCode::NO_CONTENT.into_response())
}
