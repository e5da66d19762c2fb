pub mod appresult;
pub mod auth;
pub mod config;
pub mod messages;
pub mod nav;
pub mod posts;
pub mod profiles;
pub mod res;
pub mod sessions;
pub mod upload;

use std::{ops::Deref, sync::Arc};

use axum::{extract::{DefaultBodyLimit, FromRef}, http::{header, HeaderValue, Method}, response::{Html, IntoResponse}, routing::get, Router};
use tokio::sync::{broadcast, Mutex, MutexGuard};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

pub use appresult::{AppError, AppResult};

use config::Config;
use messages::Inbox;
use posts::PostFeed;
use profiles::ProfileStore;
use sessions::Schedule;
use upload::ObjectStore;

/// One store behind one lock; every mutation happens with the lock held,
/// so handlers touching the same store never interleave.
pub struct Shared<T>(Arc<Mutex<T>>);

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(Mutex::new(value)))
    }

    pub async fn lock(&self) -> MutexGuard<'_, T> {
        self.0.lock().await
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[derive(Clone, FromRef)]
pub struct AppState {
    pub posts: Shared<PostFeed>,
    pub inbox: Shared<Inbox>,
    pub profiles: Shared<ProfileStore>,
    pub schedule: Shared<Schedule>,
    pub objects: Shared<ObjectStore>,
    pub tx: broadcast::Sender<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            posts: Shared::default(),
            inbox: Shared::default(),
            profiles: Shared::default(),
            schedule: Shared::default(),
            objects: Shared::default(),
            tx: broadcast::channel(64).0,
        }
    }
}

pub struct Markdown<T>(pub T);

impl<T> IntoResponse for Markdown<T>
where
    T: Deref<Target = str>
{
    fn into_response(self) -> axum::response::Response {
        use pulldown_cmark::{Parser, Options};

        let parser = Parser::new_ext(&*self.0, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH);

        let mut html_output = String::new();
        pulldown_cmark::html::push_html(&mut html_output, parser);
        Html(html_output).into_response()
    }
}

async fn home() -> impl IntoResponse {
    Markdown(include_res!(str, "/pages/home.md"))
}

pub fn app(state: AppState, config: &Config) -> anyhow::Result<Router> {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(config.session_idle_minutes)));

    let origins = config
        .allow_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()?;
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Ok(Router::new()
        .route("/", get(nav::root))
        .route("/home", get(home))
        .route("/nav", get(nav::nav))
        .route("/files/{id}", get(upload::file))

        .merge(auth::router())
        .nest("/post", posts::router())
        .nest("/msg", messages::router())
        .nest("/profile", profiles::router())
        .nest("/session", sessions::router())
        .fallback(nav::fallback)

        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(session_layer)
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}
