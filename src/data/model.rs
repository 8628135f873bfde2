use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct DreamAnalysis {
    pub id: i64,
    pub user_id: i64,
    pub created_at: NaiveDateTime,
    pub dream_text: String,
    pub analysis_result: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct MoodRecord {
    pub id: i64,
    pub user_id: i64,
    pub created_at: NaiveDateTime,
    pub mood: String,
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct CharacterTherapy {
    pub id: i64,
    pub user_id: i64,
    pub created_at: NaiveDateTime,
    pub character: String,
    pub user_input: String,
    pub ai_response: String,
}

/// Count of mood records per label, for the analytics breakdown.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct MoodCount {
    pub mood: String,
    pub count: i64,
}

/// Latest recorded mood per calendar day, for the trend chart.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct MoodTrendPoint {
    pub day: String,
    pub mood: String,
}

/// The fixed set of moods the tracker form offers.
pub const MOODS: [&str; 13] = [
    "😊 Mutlu",
    "😢 Üzgün",
    "😠 Sinirli",
    "😨 Korkmuş",
    "🫥 Depresyonda",
    "😲 Şaşkın",
    "🤢 İğrenmiş",
    "😐 Nötr",
    "🥲 Duygusal",
    "💖 Heyecanlı",
    "😥 Kaygılı",
    "🥵 Başından aşağı kaynar sular dökülmüş",
    "🤒 Hasta",
];
