use axum::{
    extract::{Extension, Query, State},
    response::Html,
};

use serde::Deserialize;
use tera::Context;

use std::sync::Arc;

use crate::{middleware::AuthContext, AppState};

use super::{render_page, PageError};

#[derive(Deserialize)]
pub struct ErrorParams {
    code: u16,
    message: String,
}

#[axum::debug_handler]
pub async fn error(
    Query(params): Query<ErrorParams>,
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Html<String>, PageError> {
    let mut context = Context::new();
    context.insert("status_code", &params.code);
    context.insert("status_text", &params.message);
    render_page(&state, "views/error.html", context, &auth)
}
