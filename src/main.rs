use axum::Router;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tera::Tera;
use tower_cookies::CookieManagerLayer;
use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

mod ai;
mod data;
mod middleware;
mod router;

use ai::gemini::GeminiClient;
use ai::session::ChatSession;
use data::repository::{DreamRepository, MoodRepository, TherapyRepository, UserRepository};
use middleware::{extract_auth, handle_error};
use router::app_router;

pub struct AppState {
    pub tera: Tera,
    pub users: UserRepository,
    pub dreams: DreamRepository,
    pub moods: MoodRepository,
    pub therapies: TherapyRepository,
    pub gemini: GeminiClient,
    /// Per-session chat transcripts, keyed by user id or guest cookie.
    /// Capped at a fixed number of sessions; the therapy handlers evict
    /// when full.
    pub sessions: tokio::sync::Mutex<HashMap<String, ChatSession>>,
    /// Last dream analysis per session, for the one-per-minute limit.
    /// Entries older than the window are pruned on every check.
    pub rate_limits: std::sync::Mutex<HashMap<String, Instant>>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dreammind=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_path =
        dotenv::var("DREAMMIND_DB_PATH").unwrap_or_else(|_| "dreammind.db".to_string());
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(options)
        .await
        .expect("can't connect to database");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("failed to run migrations");

    let pool = Arc::new(pool);

    let tera = match Tera::new("templates/**/*") {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("template parsing error(s): {}", e);
            std::process::exit(1);
        }
    };

    let state = AppState {
        tera,
        users: UserRepository { pool: pool.clone() },
        dreams: DreamRepository { pool: pool.clone() },
        moods: MoodRepository { pool: pool.clone() },
        therapies: TherapyRepository { pool: pool.clone() },
        gemini: GeminiClient::from_env(),
        sessions: tokio::sync::Mutex::new(HashMap::new()),
        rate_limits: std::sync::Mutex::new(HashMap::new()),
    };
    let shared_app_state = Arc::new(state);

    let static_files = ServeDir::new("assets");

    let app = Router::new()
        .nest_service("/assets", static_files)
        .nest("/", app_router(shared_app_state.clone()))
        .layer(axum::middleware::from_fn_with_state(
            shared_app_state.clone(),
            handle_error,
        ))
        .layer(axum::middleware::from_fn_with_state(
            shared_app_state.clone(),
            extract_auth,
        ))
        .layer(CookieManagerLayer::new());

    let addr: SocketAddr = dotenv::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()
        .expect("invalid BIND_ADDR");
    tracing::debug!("listening on {}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .expect("server error");
}
