use axum::{
    extract::{Extension, State},
    response::Html,
};

use tera::Context;

use std::sync::Arc;

use crate::{middleware::AuthContext, AppState};

use super::{render_page, PageError};

#[axum::debug_handler]
pub async fn app(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Html<String>, PageError> {
    if matches!(auth, AuthContext::Anonymous) {
        let mut context = Context::new();
        context.insert("login_error", &None::<String>);
        context.insert("signup_error", &None::<String>);
        return render_page(&state, "views/entry.html", context, &auth);
    }

    let context = Context::new();
    render_page(&state, "views/home.html", context, &auth)
}
