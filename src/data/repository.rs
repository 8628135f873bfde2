use std::sync::Arc;

use chrono::NaiveDate;
use sqlx::sqlite::SqlitePool;

use super::model::{CharacterTherapy, DreamAnalysis, MoodCount, MoodRecord, MoodTrendPoint, User};

#[derive(Clone)]
pub struct UserRepository {
    pub pool: Arc<SqlitePool>,
}

impl UserRepository {
    pub async fn get_by_username(&self, username: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&*self.pool)
            .await
    }

    pub async fn get_by_id(&self, id: i64) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
    }

    /// Fails with a UNIQUE violation if the username is already taken.
    pub async fn add_user(&self, username: &str, password_hash: &str) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES (?, ?) RETURNING *;
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&*self.pool)
        .await
    }
}

#[derive(Clone)]
pub struct DreamRepository {
    pub pool: Arc<SqlitePool>,
}

impl DreamRepository {
    pub async fn add(
        &self,
        user_id: i64,
        dream_text: &str,
        analysis_result: &str,
    ) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO dream_analysis (user_id, dream_text, analysis_result)
            VALUES (?, ?, ?) RETURNING id;
            "#,
        )
        .bind(user_id)
        .bind(dream_text)
        .bind(analysis_result)
        .fetch_one(&*self.pool)
        .await
    }

    pub async fn list(&self, user_id: i64, limit: i64) -> sqlx::Result<Vec<DreamAnalysis>> {
        sqlx::query_as::<_, DreamAnalysis>(
            r#"
            SELECT * FROM dream_analysis WHERE user_id = ?
            ORDER BY created_at DESC, id DESC LIMIT ?;
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&*self.pool)
        .await
    }

    /// Filtered history: scans the `scan` most recent records, keeps those
    /// matching the keyword (in the dream or its analysis) and the date
    /// range, and returns at most `limit` of them, newest first.
    pub async fn search(
        &self,
        user_id: i64,
        keyword: Option<&str>,
        date_start: Option<NaiveDate>,
        date_end: Option<NaiveDate>,
        scan: i64,
        limit: i64,
    ) -> sqlx::Result<Vec<DreamAnalysis>> {
        sqlx::query_as::<_, DreamAnalysis>(
            r#"
            SELECT * FROM (
                SELECT * FROM dream_analysis WHERE user_id = ?1
                ORDER BY created_at DESC, id DESC LIMIT ?2
            )
            WHERE (?3 IS NULL OR dream_text LIKE '%' || ?3 || '%'
                             OR analysis_result LIKE '%' || ?3 || '%')
              AND (?4 IS NULL OR date(created_at) >= ?4)
              AND (?5 IS NULL OR date(created_at) <= ?5)
            ORDER BY created_at DESC, id DESC LIMIT ?6;
            "#,
        )
        .bind(user_id)
        .bind(scan)
        .bind(keyword)
        .bind(date_start)
        .bind(date_end)
        .bind(limit)
        .fetch_all(&*self.pool)
        .await
    }

    /// Idempotent: deleting an id that does not exist is a no-op.
    pub async fn delete(&self, record_id: i64) -> sqlx::Result<u64> {
        let rows_affected = sqlx::query("DELETE FROM dream_analysis WHERE id = ?")
            .bind(record_id)
            .execute(&*self.pool)
            .await?
            .rows_affected();
        Ok(rows_affected)
    }

    pub async fn count(&self, user_id: i64) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM dream_analysis WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&*self.pool)
            .await
    }
}

#[derive(Clone)]
pub struct MoodRepository {
    pub pool: Arc<SqlitePool>,
}

impl MoodRepository {
    pub async fn add(&self, user_id: i64, mood: &str, note: Option<&str>) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO mood_record (user_id, mood, note)
            VALUES (?, ?, ?) RETURNING id;
            "#,
        )
        .bind(user_id)
        .bind(mood)
        .bind(note)
        .fetch_one(&*self.pool)
        .await
    }

    pub async fn list(&self, user_id: i64, limit: i64) -> sqlx::Result<Vec<MoodRecord>> {
        sqlx::query_as::<_, MoodRecord>(
            r#"
            SELECT * FROM mood_record WHERE user_id = ?
            ORDER BY created_at DESC, id DESC LIMIT ?;
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&*self.pool)
        .await
    }

    pub async fn delete(&self, record_id: i64) -> sqlx::Result<u64> {
        let rows_affected = sqlx::query("DELETE FROM mood_record WHERE id = ?")
            .bind(record_id)
            .execute(&*self.pool)
            .await?
            .rows_affected();
        Ok(rows_affected)
    }

    pub async fn count(&self, user_id: i64) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM mood_record WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&*self.pool)
            .await
    }

    /// One point per calendar day: the mood recorded last on that day,
    /// in chronological order, for the trend chart.
    pub async fn mood_trend(&self, user_id: i64) -> sqlx::Result<Vec<MoodTrendPoint>> {
        sqlx::query_as::<_, MoodTrendPoint>(
            r#"
            SELECT date(m.created_at) AS day, m.mood
            FROM mood_record m
            JOIN (
                SELECT MAX(id) AS id FROM mood_record
                WHERE user_id = ? GROUP BY date(created_at)
            ) latest ON m.id = latest.id
            ORDER BY day ASC;
            "#,
        )
        .bind(user_id)
        .fetch_all(&*self.pool)
        .await
    }

    pub async fn mood_distribution(&self, user_id: i64) -> sqlx::Result<Vec<MoodCount>> {
        sqlx::query_as::<_, MoodCount>(
            r#"
            SELECT mood, COUNT(*) AS count FROM mood_record
            WHERE user_id = ? GROUP BY mood ORDER BY count DESC, mood ASC;
            "#,
        )
        .bind(user_id)
        .fetch_all(&*self.pool)
        .await
    }
}

#[derive(Clone)]
pub struct TherapyRepository {
    pub pool: Arc<SqlitePool>,
}

impl TherapyRepository {
    pub async fn add(
        &self,
        user_id: i64,
        character: &str,
        user_input: &str,
        ai_response: &str,
    ) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO character_therapy (user_id, character, user_input, ai_response)
            VALUES (?, ?, ?, ?) RETURNING id;
            "#,
        )
        .bind(user_id)
        .bind(character)
        .bind(user_input)
        .bind(ai_response)
        .fetch_one(&*self.pool)
        .await
    }

    pub async fn list(&self, user_id: i64, limit: i64) -> sqlx::Result<Vec<CharacterTherapy>> {
        sqlx::query_as::<_, CharacterTherapy>(
            r#"
            SELECT * FROM character_therapy WHERE user_id = ?
            ORDER BY created_at DESC, id DESC LIMIT ?;
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&*self.pool)
        .await
    }

    pub async fn delete(&self, record_id: i64) -> sqlx::Result<u64> {
        let rows_affected = sqlx::query("DELETE FROM character_therapy WHERE id = ?")
            .bind(record_id)
            .execute(&*self.pool)
            .await?
            .rows_affected();
        Ok(rows_affected)
    }

    pub async fn count(&self, user_id: i64) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM character_therapy WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&*self.pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn setup() -> (Arc<SqlitePool>, i64) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let pool = Arc::new(pool);

        sqlx::migrate!().run(&*pool).await.unwrap();

        let users = UserRepository { pool: pool.clone() };
        let user = users.add_user("test", "not-a-real-hash").await.unwrap();

        (pool, user.id)
    }

    #[tokio::test]
    async fn test_get_by_username() {
        let (pool, _user_id) = setup().await;
        let users = UserRepository { pool: pool.clone() };

        let absent = users.get_by_username("alice").await.unwrap();
        assert!(absent.is_none());

        users.add_user("alice", "hash").await.unwrap();
        let found = users.get_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.username, "alice");
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let (pool, _user_id) = setup().await;
        let users = UserRepository { pool };

        users.add_user("bob", "hash").await.unwrap();
        let second = users.add_user("bob", "other-hash").await;
        assert!(second.is_err(), "duplicate username must be rejected");
    }

    #[tokio::test]
    async fn test_dreams_newest_first_with_limit() {
        let (pool, user_id) = setup().await;
        let dreams = DreamRepository { pool };

        for i in 0..5 {
            dreams
                .add(user_id, &format!("rüya {}", i), &format!("analiz {}", i))
                .await
                .unwrap();
        }

        let records = dreams.list(user_id, 3).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].dream_text, "rüya 4");
        assert_eq!(records[2].dream_text, "rüya 2");

        let all = dreams.list(user_id, 30).await.unwrap();
        assert_eq!(all.len(), 5);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (pool, user_id) = setup().await;
        let dreams = DreamRepository { pool };

        let id = dreams.add(user_id, "rüya", "analiz").await.unwrap();

        let first = dreams.delete(id).await.unwrap();
        assert_eq!(first, 1);
        let second = dreams.delete(id).await.unwrap();
        assert_eq!(second, 0);
    }

    #[tokio::test]
    async fn test_mood_roundtrip() {
        let (pool, user_id) = setup().await;
        let moods = MoodRepository { pool };

        moods
            .add(user_id, "😊 Mutlu", Some("good day"))
            .await
            .unwrap();

        let records = moods.list(user_id, 30).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].mood, "😊 Mutlu");
        assert_eq!(records[0].note.as_deref(), Some("good day"));
    }

    #[tokio::test]
    async fn test_dream_search_by_keyword_and_date() {
        let (pool, user_id) = setup().await;
        let dreams = DreamRepository { pool };

        dreams
            .add(user_id, "Uçtuğumu gördüm", "özgürlük teması")
            .await
            .unwrap();
        dreams
            .add(user_id, "Denizde yüzüyordum", "su sembolü")
            .await
            .unwrap();

        let by_dream = dreams
            .search(user_id, Some("deniz"), None, None, 90, 30)
            .await
            .unwrap();
        assert_eq!(by_dream.len(), 1);
        assert_eq!(by_dream[0].dream_text, "Denizde yüzüyordum");

        let by_analysis = dreams
            .search(user_id, Some("özgürlük"), None, None, 90, 30)
            .await
            .unwrap();
        assert_eq!(by_analysis.len(), 1);
        assert_eq!(by_analysis[0].dream_text, "Uçtuğumu gördüm");

        let no_match = dreams
            .search(user_id, Some("kabus"), None, None, 90, 30)
            .await
            .unwrap();
        assert!(no_match.is_empty());

        // created_at defaults to CURRENT_TIMESTAMP, which is UTC
        let today = chrono::Utc::now().date_naive();
        let from_today = dreams
            .search(user_id, None, Some(today), None, 90, 30)
            .await
            .unwrap();
        assert_eq!(from_today.len(), 2);

        let until_yesterday = dreams
            .search(
                user_id,
                None,
                None,
                Some(today - chrono::Duration::days(1)),
                90,
                30,
            )
            .await
            .unwrap();
        assert!(until_yesterday.is_empty());
    }

    #[tokio::test]
    async fn test_mood_trend_keeps_last_mood_per_day() {
        let (pool, user_id) = setup().await;
        let moods = MoodRepository { pool: pool.clone() };

        for (mood, created_at) in [
            ("😢 Üzgün", "2026-01-01 09:00:00"),
            ("😊 Mutlu", "2026-01-01 21:00:00"),
            ("😐 Nötr", "2026-01-02 10:00:00"),
        ] {
            sqlx::query("INSERT INTO mood_record (user_id, mood, created_at) VALUES (?, ?, ?)")
                .bind(user_id)
                .bind(mood)
                .bind(created_at)
                .execute(&*pool)
                .await
                .unwrap();
        }

        let trend = moods.mood_trend(user_id).await.unwrap();
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].day, "2026-01-01");
        assert_eq!(trend[0].mood, "😊 Mutlu");
        assert_eq!(trend[1].day, "2026-01-02");
        assert_eq!(trend[1].mood, "😐 Nötr");

        let other = UserRepository { pool: pool.clone() }
            .add_user("other", "hash")
            .await
            .unwrap();
        assert!(moods.mood_trend(other.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mood_distribution() {
        let (pool, user_id) = setup().await;
        let moods = MoodRepository { pool };

        for _ in 0..3 {
            moods.add(user_id, "😊 Mutlu", None).await.unwrap();
        }
        moods.add(user_id, "😢 Üzgün", None).await.unwrap();

        let distribution = moods.mood_distribution(user_id).await.unwrap();
        assert_eq!(distribution.len(), 2);
        assert_eq!(distribution[0].mood, "😊 Mutlu");
        assert_eq!(distribution[0].count, 3);
        assert_eq!(distribution[1].count, 1);
    }

    #[tokio::test]
    async fn test_lists_are_scoped_by_user() {
        let (pool, user_id) = setup().await;
        let users = UserRepository { pool: pool.clone() };
        let therapies = TherapyRepository { pool };

        let other = users.add_user("other", "hash").await.unwrap();

        therapies
            .add(user_id, "Sherlock Holmes", "soru", "yanıt")
            .await
            .unwrap();

        assert_eq!(therapies.list(other.id, 30).await.unwrap().len(), 0);
        assert_eq!(therapies.count(user_id).await.unwrap(), 1);
        assert_eq!(therapies.count(other.id).await.unwrap(), 0);
    }
}
