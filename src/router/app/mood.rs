use axum::{
    extract::{Extension, Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};

use serde::{Deserialize, Serialize};
use tera::Context;

use std::sync::Arc;

use crate::{
    data::model::{MoodRecord, MoodTrendPoint, MOODS},
    middleware::AuthContext,
    AppState,
};

use super::{render_page, PageError};

const HISTORY_LIMIT: i64 = 30;

#[derive(Serialize)]
struct MoodView {
    id: i64,
    created_at: String,
    mood: String,
    note: Option<String>,
}

impl From<&MoodRecord> for MoodView {
    fn from(record: &MoodRecord) -> Self {
        MoodView {
            id: record.id,
            created_at: record.created_at.format("%d.%m.%Y %H:%M").to_string(),
            mood: record.mood.clone(),
            note: record.note.clone(),
        }
    }
}

#[derive(Serialize)]
struct TrendView {
    day: String,
    mood: String,
    level_percent: usize,
}

impl From<&MoodTrendPoint> for TrendView {
    fn from(point: &MoodTrendPoint) -> Self {
        // bar height follows the mood's position in the fixed list
        let level = MOODS
            .iter()
            .position(|m| *m == point.mood)
            .unwrap_or(MOODS.len() - 1);
        TrendView {
            day: point.day.clone(),
            mood: point.mood.clone(),
            level_percent: (MOODS.len() - level) * 100 / MOODS.len(),
        }
    }
}

async fn render_mood_page(
    state: &AppState,
    auth: &AuthContext,
    message: Option<String>,
) -> Result<Html<String>, PageError> {
    let (records, trend): (Vec<MoodView>, Vec<TrendView>) = match auth.user() {
        Some(user) => {
            let records = state
                .moods
                .list(user.id, HISTORY_LIMIT)
                .await
                .map_err(PageError::Database)?;
            let trend = state
                .moods
                .mood_trend(user.id)
                .await
                .map_err(PageError::Database)?;
            (
                records.iter().map(MoodView::from).collect(),
                trend.iter().map(TrendView::from).collect(),
            )
        }
        None => (Vec::new(), Vec::new()),
    };

    let mut context = Context::new();
    context.insert("moods", &MOODS);
    context.insert("records", &records);
    context.insert("trend", &trend);
    context.insert("message", &message);
    render_page(state, "views/mood.html", context, auth)
}

#[axum::debug_handler]
pub async fn mood(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Html<String>, PageError> {
    render_mood_page(&state, &auth, None).await
}

#[derive(Deserialize, Debug)]
pub struct MoodForm {
    mood: String,
    note: Option<String>,
}

#[axum::debug_handler]
pub async fn mood_form(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Form(form): Form<MoodForm>,
) -> Result<Response, PageError> {
    // The form is disabled for guests; reject a hand-crafted submit too.
    let Some(user) = auth.user() else {
        let message = "Misafir modunda ruh hali kaydedilemez.".to_string();
        return Ok(render_mood_page(&state, &auth, Some(message))
            .await?
            .into_response());
    };

    if !MOODS.contains(&form.mood.as_str()) {
        let message = "Geçersiz ruh hali seçimi.".to_string();
        return Ok(render_mood_page(&state, &auth, Some(message))
            .await?
            .into_response());
    }

    let note = form.note.as_deref().filter(|n| !n.trim().is_empty());
    state
        .moods
        .add(user.id, &form.mood, note)
        .await
        .map_err(PageError::Database)?;

    Ok(Redirect::to("/mood").into_response())
}

#[axum::debug_handler]
pub async fn delete_mood(
    Path(record_id): Path<i64>,
    State(state): State<Arc<AppState>>,
) -> Result<Redirect, PageError> {
    state
        .moods
        .delete(record_id)
        .await
        .map_err(PageError::Database)?;

    Ok(Redirect::to("/mood"))
}
