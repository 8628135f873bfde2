use axum::{
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
    Extension,
};

use serde::Serialize;
use tera::Context;
use tower_cookies::Cookies;

use std::sync::Arc;

use crate::{data::model::User, AppState};

pub const SESSION_COOKIE: &str = "dreammind-session";

/// Request-scoped identity, resolved once per request from the session
/// cookie and passed to handlers as an extension.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum AuthContext {
    User(User),
    Guest { session: String },
    Anonymous,
}

impl AuthContext {
    pub fn user(&self) -> Option<&User> {
        match self {
            AuthContext::User(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, AuthContext::Guest { .. })
    }

    /// Key for per-session state (chat transcripts, rate limits). Guests
    /// get their own key from the random cookie value.
    pub fn session_key(&self) -> Option<String> {
        match self {
            AuthContext::User(user) => Some(format!("user-{}", user.id)),
            AuthContext::Guest { session } => Some(session.clone()),
            AuthContext::Anonymous => None,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            AuthContext::User(user) => &user.username,
            _ => "Misafir",
        }
    }
}

pub async fn extract_auth<B>(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    mut req: Request<B>,
    next: Next<B>,
) -> Result<Response, StatusCode>
where
    B: Send + 'static,
{
    let session = cookies.get(SESSION_COOKIE).map(|c| c.value().to_string());

    let auth = match session {
        Some(value) if value.starts_with("guest-") => AuthContext::Guest { session: value },
        Some(value) => match value.parse::<i64>() {
            Ok(id) => match state.users.get_by_id(id).await {
                Ok(Some(user)) => AuthContext::User(user),
                Ok(None) => AuthContext::Anonymous,
                Err(e) => {
                    tracing::error!("user lookup failed: {}", e);
                    AuthContext::Anonymous
                }
            },
            Err(_) => AuthContext::Anonymous,
        },
        None => AuthContext::Anonymous,
    };

    req.extensions_mut().insert(auth);
    Ok(next.run(req).await)
}

/// Gates the feature pages: logged-in users and guests pass, anonymous
/// visitors land back on the entry screen.
pub async fn require_session<B>(
    Extension(auth): Extension<AuthContext>,
    req: Request<B>,
    next: Next<B>,
) -> Response
where
    B: Send + 'static,
{
    match auth {
        AuthContext::Anonymous => Redirect::to("/").into_response(),
        _ => next.run(req).await,
    }
}

pub async fn handle_error<B>(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    req: Request<B>,
    next: Next<B>,
) -> Result<Response, StatusCode>
where
    B: Send + 'static,
{
    let response = next.run(req).await;

    let status_code = response.status().as_u16();
    let status_text = response.status().as_str().to_string();

    match status_code {
        _ if status_code >= 400 => {
            let mut context = Context::new();
            context.insert("status_code", &status_code);
            context.insert("status_text", &status_text);

            let error = state
                .tera
                .render("views/error.html", &context)
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

            let mut context = Context::new();
            context.insert("view", &error);
            context.insert("current_user", &auth.user());
            context.insert("is_guest", &auth.is_guest());
            context.insert("display_name", auth.display_name());
            let rendered = state
                .tera
                .render("views/main.html", &context)
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
            Ok(Html(rendered).into_response())
        }
        _ => Ok(response),
    }
}
