use axum::{
    extract::{Extension, Path, State},
    response::{Html, Redirect},
    Form,
};

use serde::{Deserialize, Serialize};
use tera::Context;

use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    ai::{
        prompts::Persona,
        session::{ChatSession, Role},
    },
    data::model::CharacterTherapy,
    middleware::AuthContext,
    AppState,
};

use super::{render_page, PageError};

const HISTORY_LIMIT: i64 = 30;
const MAX_SESSIONS: usize = 1024;

/// Looks up or creates the session for `key`. Guest cookies are never
/// seen again once the browser drops them, so when the map is full an
/// arbitrary existing session is evicted to make room.
fn session_entry(
    sessions: &mut HashMap<String, ChatSession>,
    key: String,
    persona: Persona,
) -> &mut ChatSession {
    if !sessions.contains_key(&key) && sessions.len() >= MAX_SESSIONS {
        if let Some(evicted) = sessions.keys().next().cloned() {
            sessions.remove(&evicted);
        }
    }
    sessions
        .entry(key)
        .or_insert_with(|| ChatSession::for_persona(persona))
}

#[derive(Serialize)]
struct TurnView {
    role: String,
    html: String,
}

#[derive(Serialize)]
struct TherapyView {
    id: i64,
    created_at: String,
    character: String,
    user_input: String,
    response_html: String,
}

impl From<&CharacterTherapy> for TherapyView {
    fn from(record: &CharacterTherapy) -> Self {
        TherapyView {
            id: record.id,
            created_at: record.created_at.format("%d.%m.%Y %H:%M").to_string(),
            character: record.character.clone(),
            user_input: record.user_input.clone(),
            response_html: comrak::markdown_to_html(
                &record.ai_response,
                &comrak::Options::default(),
            ),
        }
    }
}

fn transcript_view(session: &ChatSession) -> Vec<TurnView> {
    session
        .transcript()
        .iter()
        .map(|turn| TurnView {
            role: match turn.role {
                Role::User => "user".to_string(),
                Role::Model => "model".to_string(),
            },
            html: comrak::markdown_to_html(&turn.content, &comrak::Options::default()),
        })
        .collect()
}

async fn render_therapy_page(
    state: &AppState,
    auth: &AuthContext,
    selected: Persona,
    transcript: Vec<TurnView>,
) -> Result<Html<String>, PageError> {
    let records: Vec<TherapyView> = match auth.user() {
        Some(user) => state
            .therapies
            .list(user.id, HISTORY_LIMIT)
            .await
            .map_err(PageError::Database)?
            .iter()
            .map(TherapyView::from)
            .collect(),
        None => Vec::new(),
    };

    let characters: Vec<&str> = Persona::ALL.iter().map(|p| p.name()).collect();

    let mut context = Context::new();
    context.insert("characters", &characters);
    context.insert("selected_character", selected.name());
    context.insert("transcript", &transcript);
    context.insert("records", &records);
    render_page(state, "views/therapy.html", context, auth)
}

#[axum::debug_handler]
pub async fn therapy(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Html<String>, PageError> {
    let (selected, transcript) = match auth.session_key() {
        Some(key) => {
            let mut sessions = state.sessions.lock().await;
            let session = session_entry(&mut sessions, key, Persona::SherlockHolmes);
            (
                session.persona().unwrap_or(Persona::Generic),
                transcript_view(session),
            )
        }
        None => (Persona::SherlockHolmes, Vec::new()),
    };

    render_therapy_page(&state, &auth, selected, transcript).await
}

#[derive(Deserialize, Debug)]
pub struct TherapyMessage {
    character: String,
    message: String,
}

#[axum::debug_handler]
pub async fn therapy_form(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Form(form): Form<TherapyMessage>,
) -> Result<Redirect, PageError> {
    let persona = Persona::from_name(&form.character);
    if form.message.trim().is_empty() {
        return Ok(Redirect::to("/therapy"));
    }

    let Some(key) = auth.session_key() else {
        return Ok(Redirect::to("/"));
    };

    // Snapshot the session so the map lock is not held across the Gemini
    // round-trip; every other session would stall behind it otherwise.
    let mut session = {
        let mut sessions = state.sessions.lock().await;
        let session = session_entry(&mut sessions, key.clone(), persona);

        // Switching character starts a fresh session with the new instruction.
        if session.persona() != Some(persona) {
            *session = ChatSession::for_persona(persona);
        }

        session.clone()
    };

    let reply = session.send(&state.gemini, &form.message).await;

    {
        let mut sessions = state.sessions.lock().await;
        sessions.insert(key, session);
    }

    if let Some(user) = auth.user() {
        state
            .therapies
            .add(user.id, persona.name(), &form.message, &reply)
            .await
            .map_err(PageError::Database)?;
    }

    Ok(Redirect::to("/therapy"))
}

#[derive(Deserialize, Debug)]
pub struct CharacterSelect {
    character: String,
}

#[axum::debug_handler]
pub async fn select_character(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Form(form): Form<CharacterSelect>,
) -> Redirect {
    if let Some(key) = auth.session_key() {
        let persona = Persona::from_name(&form.character);
        let mut sessions = state.sessions.lock().await;
        let session = session_entry(&mut sessions, key, persona);
        *session = ChatSession::for_persona(persona);
    }
    Redirect::to("/therapy")
}

#[axum::debug_handler]
pub async fn clear_therapy(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Redirect {
    if let Some(key) = auth.session_key() {
        let mut sessions = state.sessions.lock().await;
        if let Some(session) = sessions.get_mut(&key) {
            session.clear();
        }
    }
    Redirect::to("/therapy")
}

#[axum::debug_handler]
pub async fn delete_therapy(
    Path(record_id): Path<i64>,
    State(state): State<Arc<AppState>>,
) -> Result<Redirect, PageError> {
    state
        .therapies
        .delete(record_id)
        .await
        .map_err(PageError::Database)?;

    Ok(Redirect::to("/therapy"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_map_stays_bounded() {
        let mut sessions = HashMap::new();
        for i in 0..MAX_SESSIONS {
            session_entry(&mut sessions, format!("guest-{}", i), Persona::Generic);
        }
        assert_eq!(sessions.len(), MAX_SESSIONS);

        session_entry(&mut sessions, "guest-overflow".to_string(), Persona::Generic);
        assert_eq!(sessions.len(), MAX_SESSIONS);
        assert!(sessions.contains_key("guest-overflow"));

        // an existing key never evicts anything
        session_entry(&mut sessions, "guest-overflow".to_string(), Persona::Generic);
        assert_eq!(sessions.len(), MAX_SESSIONS);
    }
}
