use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};

use tera::Context;

use std::sync::Arc;

use crate::{
    middleware::{require_session, AuthContext},
    AppState,
};

mod analytics;
use analytics::analytics;
mod auth;
use auth::{continue_as_guest, entry, form_signup, login_form, logout, signup_entry};
mod dream;
use dream::{analyze_dream_form, delete_dream, dream};
mod error;
use error::error;
mod home;
use home::app;
mod mood;
use mood::{delete_mood, mood, mood_form};
mod therapy;
use therapy::{clear_therapy, delete_therapy, select_character, therapy, therapy_form};

/// Shared failure modes of the content pages.
pub enum PageError {
    Database(sqlx::Error),
    Template(tera::Error),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::Database(e) => {
                tracing::error!("database error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            PageError::Template(e) => {
                tracing::error!("template error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Renders a view template and nests it into the main layout.
/// The session fields are visible to both the view and the layout.
pub(crate) fn render_page(
    state: &AppState,
    template: &str,
    mut context: Context,
    auth: &AuthContext,
) -> Result<Html<String>, PageError> {
    context.insert("current_user", &auth.user());
    context.insert("is_guest", &auth.is_guest());
    context.insert("display_name", auth.display_name());
    let view = state
        .tera
        .render(template, &context)
        .map_err(PageError::Template)?;

    let mut outer = Context::new();
    outer.insert("view", &view);
    outer.insert("current_user", &auth.user());
    outer.insert("is_guest", &auth.is_guest());
    outer.insert("display_name", auth.display_name());
    let rendered = state
        .tera
        .render("views/main.html", &outer)
        .map_err(PageError::Template)?;

    Ok(Html(rendered))
}

pub fn app_router(state: Arc<AppState>) -> Router {
    let dream_router = Router::new()
        .route("/", get(dream).post(analyze_dream_form))
        .route("/:id/delete", post(delete_dream));

    let mood_router = Router::new()
        .route("/", get(mood).post(mood_form))
        .route("/:id/delete", post(delete_mood));

    let therapy_router = Router::new()
        .route("/", get(therapy).post(therapy_form))
        .route("/select", post(select_character))
        .route("/clear", post(clear_therapy))
        .route("/:id/delete", post(delete_therapy));

    let pages = Router::new()
        .nest("/dream", dream_router)
        .nest("/mood", mood_router)
        .nest("/therapy", therapy_router)
        .route("/analytics", get(analytics))
        .layer(axum::middleware::from_fn(require_session));

    Router::new()
        .route("/", get(app))
        .route("/error", get(error))
        .route("/login", get(entry).post(login_form))
        .route("/signup", get(signup_entry).post(form_signup))
        .route("/guest", post(continue_as_guest))
        .route("/logout", get(logout))
        .merge(pages)
        .with_state(state.clone())
}
