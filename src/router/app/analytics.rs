use axum::{
    extract::{Extension, State},
    response::Html,
};

use serde::Serialize;
use tera::Context;

use std::sync::Arc;

use crate::{middleware::AuthContext, AppState};

use super::{render_page, PageError};

#[derive(Serialize)]
struct MoodShare {
    mood: String,
    count: i64,
    percent: i64,
}

#[axum::debug_handler]
pub async fn analytics(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Html<String>, PageError> {
    let Some(user) = auth.user() else {
        // Guests are invited to log in instead of seeing empty charts.
        let context = Context::new();
        return render_page(&state, "views/analytics_guest.html", context, &auth);
    };

    let dream_count = state
        .dreams
        .count(user.id)
        .await
        .map_err(PageError::Database)?;
    let mood_count = state
        .moods
        .count(user.id)
        .await
        .map_err(PageError::Database)?;
    let therapy_count = state
        .therapies
        .count(user.id)
        .await
        .map_err(PageError::Database)?;

    let distribution = state
        .moods
        .mood_distribution(user.id)
        .await
        .map_err(PageError::Database)?;

    let shares: Vec<MoodShare> = distribution
        .iter()
        .map(|entry| MoodShare {
            mood: entry.mood.clone(),
            count: entry.count,
            percent: if mood_count > 0 {
                entry.count * 100 / mood_count
            } else {
                0
            },
        })
        .collect();

    let mut context = Context::new();
    context.insert("dream_count", &dream_count);
    context.insert("mood_count", &mood_count);
    context.insert("therapy_count", &therapy_count);
    context.insert("mood_shares", &shares);
    render_page(&state, "views/analytics.html", context, &auth)
}
