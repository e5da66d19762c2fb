use axum::{debug_handler, response::{Html, Redirect}, Form};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{include_res, AppResult};

use super::{return_to, SessionContext};

#[derive(Deserialize)]
pub(crate) struct LoginQuery {
    pub(crate) name: String,
    pub(crate) return_url: Option<String>,
}

#[debug_handler]
pub async fn login_page() -> Html<&'static str> {
    Html(include_res!(str, "/pages/login.html"))
}

#[debug_handler]
pub async fn login(
    session: Session,
    Form(LoginQuery { name, return_url }): Form<LoginQuery>,
) -> AppResult<Redirect> {
    let name = name.trim();
    let context = if name.is_empty() {
        SessionContext::default()
    } else {
        SessionContext::signed_in(name)
    };
    context.store(&session).await?;
    tracing::info!(authenticated = context.authenticated, "login");

    Ok(Redirect::to(return_to(return_url.as_deref())))
}
