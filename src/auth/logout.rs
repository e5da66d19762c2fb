use axum::{debug_handler, extract::Query, response::Redirect};
use serde::Deserialize;
use tower_sessions::Session;

use crate::AppResult;

use super::{return_to, SessionContext};

#[derive(Deserialize)]
pub(crate) struct LogoutQuery {
    pub(crate) return_url: Option<String>,
}

/// Drops the whole browser session, so the next request starts signed out.
#[debug_handler]
pub async fn logout(
    session: Session,
    Query(LogoutQuery { return_url }): Query<LogoutQuery>,
) -> AppResult<Redirect> {
    let context = SessionContext::load(&session).await?;
    session.flush().await?;
    tracing::info!(was_authenticated = context.authenticated, "logout");

    Ok(Redirect::to(return_to(return_url.as_deref())))
}
