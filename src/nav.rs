use std::{fmt, str::FromStr};

use axum::{debug_handler, extract::Query, http::Uri, response::{IntoResponse, Redirect, Response}, Json};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{auth::SessionContext, res, AppResult};

/// The five pages of the app. Paths are always the lowercase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Home,
    Post,
    Msg,
    Profile,
    Session,
}

impl View {
    pub const ALL: [View; 5] = [View::Home, View::Post, View::Msg, View::Profile, View::Session];

    pub fn name(self) -> &'static str {
        match self {
            View::Home => "home",
            View::Post => "post",
            View::Msg => "msg",
            View::Profile => "profile",
            View::Session => "session",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            View::Home => "/home",
            View::Post => "/post",
            View::Msg => "/msg",
            View::Profile => "/profile",
            View::Session => "/session",
        }
    }

    /// Resolves the view a path belongs to, ignoring case. `/` is the home page.
    pub fn from_path(path: &str) -> Option<View> {
        let first = path.trim_start_matches('/').split('/').next().unwrap_or("");
        if first.is_empty() {
            return Some(View::Home);
        }

        first.parse().ok()
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownView(pub String);

impl fmt::Display for UnknownView {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "no page called {:?}", self.0)
    }
}

impl std::error::Error for UnknownView {}

impl FromStr for View {
    type Err = UnknownView;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.to_ascii_lowercase();
        View::ALL
            .into_iter()
            .find(|view| view.name() == name)
            .ok_or(UnknownView(s.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub label: &'static str,
    pub href: &'static str,
    pub active: bool,
}

impl NavItem {
    fn page(label: &'static str, view: View, current: Option<View>) -> Self {
        Self {
            label,
            href: view.path(),
            active: current == Some(view),
        }
    }

    fn action(label: &'static str, href: &'static str) -> Self {
        Self { label, href, active: false }
    }
}

pub fn nav_items(context: &SessionContext, current: Option<View>) -> Vec<NavItem> {
    let mut items = vec![
        NavItem::page("Home", View::Home, current),
        NavItem::page("Sessions", View::Session, current),
        NavItem::page("Msg", View::Msg, current),
        NavItem::page("Post", View::Post, current),
    ];

    if context.authenticated {
        items.push(NavItem::page("Profile", View::Profile, current));
        items.push(NavItem::action("Logout", "/logout"));
    } else {
        items.push(NavItem::action("Login", "/login"));
    }

    items
}

#[derive(Serialize)]
pub struct NavView {
    #[serde(flatten)]
    pub context: SessionContext,
    pub current: Option<View>,
    pub items: Vec<NavItem>,
}

#[derive(Deserialize)]
pub(crate) struct NavQuery {
    path: Option<String>,
}

#[debug_handler]
pub(crate) async fn nav(
    session: Session,
    Query(NavQuery { path }): Query<NavQuery>,
) -> AppResult<Json<NavView>> {
    let context = SessionContext::load(&session).await?;
    let current = path.as_deref().and_then(View::from_path);

    Ok(Json(NavView {
        items: nav_items(&context, current),
        context,
        current,
    }))
}

#[debug_handler]
pub(crate) async fn root() -> Redirect {
    Redirect::to(View::Home.path())
}

/// Sends `/Msg` and friends to their canonical lowercase path.
pub(crate) async fn fallback(uri: Uri) -> AppResult<Response> {
    let path = uri.path();
    let rest = path.trim_start_matches('/');
    let (first, tail) = rest.split_at(rest.find('/').unwrap_or(rest.len()));
    let Ok(view) = first.parse::<View>() else {
        return res::sorry("page");
    };

    let canonical = format!("{}{}", view.path(), tail);
    if canonical == path {
        return res::sorry("page");
    }

    let target = match uri.query() {
        Some(query) => format!("{canonical}?{query}"),
        None => canonical,
    };
    Ok(Redirect::permanent(&target).into_response())
}
