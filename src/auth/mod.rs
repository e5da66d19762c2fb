mod login;
mod logout;

pub use login::{login, login_page};
pub use logout::logout;

use axum::{routing::get, Router};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{nav::View, AppResult, AppState};

pub const CONTEXT: &str = "context";

/// Who the browser session claims to be. Nothing checks credentials;
/// the flag only decides which nav items and account actions show up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub authenticated: bool,
    pub display_name: Option<String>,
}

impl SessionContext {
    pub fn signed_in(display_name: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            display_name: Some(display_name.into()),
        }
    }

    pub async fn load(session: &Session) -> AppResult<Self> {
        Ok(session.get::<SessionContext>(CONTEXT).await?.unwrap_or_default())
    }

    pub async fn store(&self, session: &Session) -> AppResult<()> {
        session.insert(CONTEXT, self).await?;
        Ok(())
    }

    pub fn author(&self) -> String {
        match &self.display_name {
            Some(name) if self.authenticated => name.clone(),
            _ => crate::messages::ME.to_string(),
        }
    }
}

/// Where to go after login or logout. Only local paths are followed;
/// browsers read `/\` like `//`, and control characters can't go in a header.
pub fn return_to(return_url: Option<&str>) -> &str {
    match return_url {
        Some(url) if is_local_path(url) => url,
        _ => View::Home.path(),
    }
}

fn is_local_path(url: &str) -> bool {
    url.starts_with('/')
        && !url.starts_with("//")
        && !url.chars().any(|c| c == '\\' || c.is_control())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
}
