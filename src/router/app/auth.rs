use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};

use serde::Deserialize;
use tera::Context;
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use std::sync::Arc;

use crate::{
    middleware::{AuthContext, SESSION_COOKIE},
    AppState,
};

use super::{render_page, PageError};

fn session_cookie(value: String) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, value)
        .path("/")
        .http_only(true)
        .finish()
}

fn render_entry(
    state: &AppState,
    login_error: Option<&str>,
    signup_error: Option<&str>,
) -> Result<Html<String>, PageError> {
    let mut context = Context::new();
    context.insert("login_error", &login_error);
    context.insert("signup_error", &signup_error);
    render_page(state, "views/entry.html", context, &AuthContext::Anonymous)
}

#[axum::debug_handler]
pub async fn entry(State(state): State<Arc<AppState>>) -> Result<Html<String>, PageError> {
    render_entry(&state, None, None)
}

#[derive(Deserialize, Debug)]
pub struct LogIn {
    username: String,
    password: String,
}

#[axum::debug_handler]
pub async fn login_form(
    cookies: Cookies,
    State(state): State<Arc<AppState>>,
    Form(log_in): Form<LogIn>,
) -> Result<Response, PageError> {
    let user = state
        .users
        .get_by_username(&log_in.username)
        .await
        .map_err(PageError::Database)?;

    let verified = user
        .as_ref()
        .map(|u| bcrypt::verify(&log_in.password, &u.password_hash).unwrap_or(false))
        .unwrap_or(false);

    match user {
        Some(user) if verified => {
            cookies.add(session_cookie(user.id.to_string()));
            Ok(Redirect::to("/").into_response())
        }
        _ => {
            let page = render_entry(&state, Some("Kullanıcı adı veya şifre hatalı!"), None)?;
            Ok(page.into_response())
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct SignUp {
    username: String,
    password: String,
    password_confirmation: String,
}

#[axum::debug_handler]
pub async fn form_signup(
    cookies: Cookies,
    State(state): State<Arc<AppState>>,
    Form(sign_up): Form<SignUp>,
) -> Result<Response, PageError> {
    let failure = |message: &str, state: &AppState| -> Result<Response, PageError> {
        let page = render_entry(state, None, Some(message))?;
        Ok(page.into_response())
    };

    if sign_up.username.trim().is_empty() || sign_up.password.is_empty() {
        return failure("Kullanıcı adı ve şifre alanları boş bırakılamaz.", &state);
    }
    if sign_up.password != sign_up.password_confirmation {
        return failure("Şifreler eşleşmiyor!", &state);
    }

    let taken = state
        .users
        .get_by_username(&sign_up.username)
        .await
        .map_err(PageError::Database)?;
    if taken.is_some() {
        return failure("Bu kullanıcı adı zaten alınmış!", &state);
    }

    let password_hash = match bcrypt::hash(&sign_up.password, bcrypt::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("password hashing failed: {}", e);
            return failure("Hesap oluşturulamadı, lütfen tekrar deneyin.", &state);
        }
    };

    match state.users.add_user(&sign_up.username, &password_hash).await {
        Ok(user) => {
            cookies.add(session_cookie(user.id.to_string()));
            Ok(Redirect::to("/").into_response())
        }
        // UNIQUE violation under a concurrent signup with the same name
        Err(e) => {
            tracing::error!("signup insert failed: {}", e);
            failure("Bu kullanıcı adı zaten alınmış!", &state)
        }
    }
}

/// A guest choosing to register gives up the guest session and lands on
/// the entry screen, where the signup form lives.
#[axum::debug_handler]
pub async fn signup_entry(
    cookies: Cookies,
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, PageError> {
    let mut cookie = session_cookie(String::new());
    cookie.make_removal();
    cookies.add(cookie);

    render_entry(&state, None, None)
}

#[axum::debug_handler]
pub async fn continue_as_guest(cookies: Cookies) -> Redirect {
    cookies.add(session_cookie(format!("guest-{}", Uuid::new_v4())));
    Redirect::to("/")
}

#[axum::debug_handler]
pub async fn logout(cookies: Cookies) -> Redirect {
    let mut cookie = session_cookie(String::new());
    cookie.make_removal();
    cookies.add(cookie);

    Redirect::to("/")
}

#[cfg(test)]
mod tests {
    #[test]
    fn guest_nav_links_to_the_signup_route() {
        let tera = tera::Tera::new("templates/**/*").unwrap();

        let mut context = tera::Context::new();
        context.insert("view", "");
        context.insert("current_user", &None::<crate::data::model::User>);
        context.insert("is_guest", &true);
        context.insert("display_name", "Misafir");

        let html = tera.render("views/main.html", &context).unwrap();
        assert!(html.contains(r#"href="/signup""#));
        assert!(html.contains("🚀 Kayıt Ol"));
        assert!(!html.contains(r#"href="/logout">🚀"#));
    }

    #[test]
    fn hashing_is_salted_and_verifiable() {
        // MIN_COST keeps the test fast; the handlers use DEFAULT_COST.
        // bcrypt keeps its MIN_COST (4) private, so mirror it here.
        const MIN_COST: u32 = 4;
        let first = bcrypt::hash("parola123", MIN_COST).unwrap();
        let second = bcrypt::hash("parola123", MIN_COST).unwrap();

        assert_ne!(first, second, "each hash embeds a fresh salt");
        assert!(bcrypt::verify("parola123", &first).unwrap());
        assert!(bcrypt::verify("parola123", &second).unwrap());
        assert!(!bcrypt::verify("yanlis-parola", &first).unwrap());
    }
}
