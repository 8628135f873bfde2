use axum::{
    extract::{Extension, Path, Query, State},
    response::{Html, Redirect},
    Form,
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tera::Context;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::{data::model::DreamAnalysis, middleware::AuthContext, AppState};

use super::{render_page, PageError};

const HISTORY_LIMIT: i64 = 30;
const SEARCH_SCAN_LIMIT: i64 = 90;
const RATE_LIMIT_SECONDS: u64 = 60;

#[derive(Serialize)]
struct DreamView {
    id: i64,
    created_at: String,
    dream_text: String,
    analysis_html: String,
}

impl From<&DreamAnalysis> for DreamView {
    fn from(record: &DreamAnalysis) -> Self {
        DreamView {
            id: record.id,
            created_at: record.created_at.format("%d.%m.%Y %H:%M").to_string(),
            dream_text: record.dream_text.clone(),
            analysis_html: comrak::markdown_to_html(
                &record.analysis_result,
                &comrak::Options::default(),
            ),
        }
    }
}

/// Optional history filter, taken from the query string.
#[derive(Deserialize, Debug, Default)]
pub struct DreamFilter {
    keyword: Option<String>,
    date_start: Option<String>,
    date_end: Option<String>,
}

impl DreamFilter {
    fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    fn date(value: &Option<String>) -> Option<NaiveDate> {
        value
            .as_deref()
            .and_then(|v| NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").ok())
    }

    fn is_active(&self) -> bool {
        self.keyword().is_some()
            || Self::date(&self.date_start).is_some()
            || Self::date(&self.date_end).is_some()
    }
}

async fn history(
    state: &AppState,
    auth: &AuthContext,
    filter: &DreamFilter,
) -> Result<Vec<DreamView>, PageError> {
    match auth.user() {
        Some(user) => {
            let records = state
                .dreams
                .search(
                    user.id,
                    filter.keyword(),
                    DreamFilter::date(&filter.date_start),
                    DreamFilter::date(&filter.date_end),
                    SEARCH_SCAN_LIMIT,
                    HISTORY_LIMIT,
                )
                .await
                .map_err(PageError::Database)?;
            Ok(records.iter().map(DreamView::from).collect())
        }
        None => Ok(Vec::new()),
    }
}

async fn render_dream_page(
    state: &AppState,
    auth: &AuthContext,
    filter: &DreamFilter,
    analysis_html: Option<String>,
    warning: Option<String>,
) -> Result<Html<String>, PageError> {
    let mut context = Context::new();
    context.insert("analysis_html", &analysis_html);
    context.insert("warning", &warning);
    context.insert("records", &history(state, auth, filter).await?);
    context.insert("filter_keyword", &filter.keyword().unwrap_or(""));
    context.insert("filter_date_start", &filter.date_start.as_deref().unwrap_or(""));
    context.insert("filter_date_end", &filter.date_end.as_deref().unwrap_or(""));
    context.insert("filter_active", &filter.is_active());
    render_page(state, "views/dream.html", context, auth)
}

#[axum::debug_handler]
pub async fn dream(
    Query(filter): Query<DreamFilter>,
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Html<String>, PageError> {
    render_dream_page(&state, &auth, &filter, None, None).await
}

#[derive(Deserialize, Debug)]
pub struct DreamForm {
    dream_text: String,
}

/// One analysis per minute per session. Stale entries are pruned on every
/// call so the map stays bounded by the sessions active in the last minute.
/// Returns the seconds left to wait, or records the attempt and allows it.
fn check_rate_limit(limits: &mut HashMap<String, Instant>, key: String) -> Option<u64> {
    limits.retain(|_, last| last.elapsed().as_secs() < RATE_LIMIT_SECONDS);
    if let Some(last) = limits.get(&key) {
        return Some(RATE_LIMIT_SECONDS - last.elapsed().as_secs());
    }
    limits.insert(key, Instant::now());
    None
}

#[axum::debug_handler]
pub async fn analyze_dream_form(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Form(form): Form<DreamForm>,
) -> Result<Html<String>, PageError> {
    let filter = DreamFilter::default();

    if form.dream_text.trim().is_empty() {
        let warning = "Lütfen analiz için bir rüya metni girin.".to_string();
        return render_dream_page(&state, &auth, &filter, None, Some(warning)).await;
    }

    if let Some(key) = auth.session_key() {
        let wait = {
            let mut limits = state.rate_limits.lock().unwrap_or_else(|e| e.into_inner());
            check_rate_limit(&mut limits, key)
        };
        if let Some(seconds) = wait {
            let warning = format!("Çok sık analiz denemesi! Lütfen {} saniye bekleyin.", seconds);
            return render_dream_page(&state, &auth, &filter, None, Some(warning)).await;
        }
    }

    let result = state.gemini.analyze_dream(&form.dream_text).await;

    // Guests get the analysis but nothing is persisted.
    if let Some(user) = auth.user() {
        state
            .dreams
            .add(user.id, &form.dream_text, &result)
            .await
            .map_err(PageError::Database)?;
    }

    let analysis_html = comrak::markdown_to_html(&result, &comrak::Options::default());
    render_dream_page(&state, &auth, &filter, Some(analysis_html), None).await
}

#[axum::debug_handler]
pub async fn delete_dream(
    Path(record_id): Path<i64>,
    State(state): State<Arc<AppState>>,
) -> Result<Redirect, PageError> {
    state
        .dreams
        .delete(record_id)
        .await
        .map_err(PageError::Database)?;

    Ok(Redirect::to("/dream"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    #[test]
    fn rate_limit_blocks_then_prunes_stale_entries() {
        let mut limits = HashMap::new();

        assert_eq!(check_rate_limit(&mut limits, "user-1".to_string()), None);
        let wait = check_rate_limit(&mut limits, "user-1".to_string());
        assert!(wait.is_some_and(|s| s > 0 && s <= RATE_LIMIT_SECONDS));

        // entries older than the window are dropped, not just ignored
        let stale = Instant::now() - Duration::from_secs(RATE_LIMIT_SECONDS + 5);
        limits.insert("user-1".to_string(), stale);
        limits.insert("guest-gone".to_string(), stale);
        assert_eq!(check_rate_limit(&mut limits, "user-1".to_string()), None);
        assert_eq!(limits.len(), 1);
        assert!(limits.contains_key("user-1"));
    }

    #[test]
    fn filter_normalizes_blank_and_bad_input() {
        let filter = DreamFilter {
            keyword: Some("  ".to_string()),
            date_start: Some("not-a-date".to_string()),
            date_end: None,
        };
        assert_eq!(filter.keyword(), None);
        assert_eq!(DreamFilter::date(&filter.date_start), None);
        assert!(!filter.is_active());

        let filter = DreamFilter {
            keyword: Some(" deniz ".to_string()),
            date_start: Some("2026-08-01".to_string()),
            date_end: None,
        };
        assert_eq!(filter.keyword(), Some("deniz"));
        assert_eq!(
            DreamFilter::date(&filter.date_start),
            NaiveDate::from_ymd_opt(2026, 8, 1)
        );
        assert!(filter.is_active());
    }
}
