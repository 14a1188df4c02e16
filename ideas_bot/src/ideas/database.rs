use std::str::FromStr;

use chrono::Utc;
pub use sqlx::Error;
use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Executor, Row, Sqlite,
};
use teloxide::types::UserId;
use tokio::sync::Mutex;

use super::{sink::IdeaSink, types::Idea};
use crate::error::IdeaError;

type Pool = sqlx::Pool<Sqlite>;

/// Owns all submitted ideas.
///
/// Ideas live in an SQLite table. Writes are optionally mirrored into
/// an [`IdeaSink`]; the mirror failing never fails the write.
pub struct IdeaStore {
    pool: Pool,
    // Appends and deletes go one at a time, so that IDs and the
    // positions reported to the sink stay consistent.
    write_lock: Mutex<()>,
    sink: Option<Box<dyn IdeaSink>>,
}

impl IdeaStore {
    /// Open (or create) the database at `db_path`, like `sqlite:ideas.sqlite`.
    pub async fn new(db_path: &str, sink: Option<Box<dyn IdeaSink>>) -> Result<IdeaStore, Error> {
        if !Sqlite::database_exists(db_path).await.unwrap_or(false) {
            Sqlite::create_database(db_path).await?;
        }
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(
                SqliteConnectOptions::from_str(db_path)?
                    .busy_timeout(std::time::Duration::from_secs(60)),
            )
            .await?;

        // IDEAS:
        // id (key, i64, AUTOINCREMENT so that IDs of deleted ideas are never handed out again)
        // author_id (i64 because sqlite doesn't support u64; NULL if sent on behalf of a chat)
        // author_name (@username or first name, may be empty)
        // text (trimmed, never empty)
        // created_at (date+time in UTC)
        // mirrored (1 if the sink has a row for this idea, 0 otherwise)
        pool.execute(sqlx::query(
            "CREATE TABLE IF NOT EXISTS ideas (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                author_id INTEGER NULL,
                author_name TEXT NOT NULL,
                text TEXT NOT NULL,
                created_at TEXT NOT NULL,
                mirrored INTEGER NOT NULL DEFAULT 0
            ) STRICT;",
        ))
        .await?;

        if let Some(sink) = &sink {
            log::info!("Mirroring ideas to {}", sink.name());
        }

        Ok(IdeaStore {
            pool,
            write_lock: Mutex::new(()),
            sink,
        })
    }

    /// Store a new idea. Returns its ID.
    ///
    /// Fails with [`IdeaError::EmptyIdea`] if the text is blank.
    #[allow(clippy::cast_possible_wrap)]
    pub async fn append(
        &self,
        author_id: Option<UserId>,
        author_name: &str,
        text: &str,
    ) -> Result<i64, IdeaError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(IdeaError::EmptyIdea);
        }

        let _lock = self.write_lock.lock().await;

        let idea = Idea {
            id: 0,
            author_id,
            author_name: author_name.to_string(),
            text: text.to_string(),
            created_at: Utc::now(),
        };

        let id = sqlx::query(
            "INSERT INTO ideas (author_id, author_name, text, created_at)
            VALUES (?, ?, ?, ?);",
        )
        .bind(idea.author_id.map(|x| x.0 as i64))
        .bind(&idea.author_name)
        .bind(&idea.text)
        .bind(idea.created_at)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        if let Some(sink) = &self.sink {
            match sink.append_row(&idea.sink_row()).await {
                Ok(()) => {
                    sqlx::query("UPDATE ideas SET mirrored=1 WHERE id=?;")
                        .bind(id)
                        .execute(&self.pool)
                        .await?;
                }
                Err(e) => log::warn!("Failed to mirror idea #{id} to {}: {e}", sink.name()),
            }
        }

        Ok(id)
    }

    /// Up to `limit` most recent ideas, newest first.
    pub async fn list(&self, limit: usize) -> Result<Vec<Idea>, Error> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        sqlx::query(
            "SELECT id, author_id, author_name, text, created_at
            FROM ideas ORDER BY id DESC LIMIT ?;",
        )
        .bind(limit)
        .map(|row: SqliteRow| Idea::from_sqlite_row(&row))
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get(&self, id: i64) -> Result<Option<Idea>, Error> {
        sqlx::query("SELECT id, author_id, author_name, text, created_at FROM ideas WHERE id=?;")
            .bind(id)
            .map(|row: SqliteRow| Idea::from_sqlite_row(&row))
            .fetch_optional(&self.pool)
            .await
    }

    /// Permanently delete an idea. Returns what was deleted.
    ///
    /// Fails with [`IdeaError::NotFound`] if there's no such idea.
    pub async fn delete(&self, id: i64) -> Result<Idea, IdeaError> {
        let _lock = self.write_lock.lock().await;

        let Some(idea) = self.get(id).await? else {
            return Err(IdeaError::NotFound(id));
        };

        // Where this idea sits among the mirrored ones in creation order,
        // which is where the sink has it. None if the sink never got it.
        let position: Option<i64> = sqlx::query(
            "SELECT CASE WHEN mirrored=1
                THEN (SELECT COUNT(*) FROM ideas WHERE id<=?1 AND mirrored=1)
            END
            FROM ideas WHERE id=?1;",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?
        .get(0);

        sqlx::query("DELETE FROM ideas WHERE id=?;")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if let (Some(sink), Some(position)) = (&self.sink, position) {
            let position = u64::try_from(position).unwrap_or_default();
            if let Err(e) = sink.delete_row(position).await {
                log::warn!(
                    "Failed to delete idea #{id} (row {position}) from {}: {e}",
                    sink.name()
                );
            }
        }

        Ok(idea)
    }

    /// Amount of stored ideas.
    #[allow(clippy::cast_sign_loss)]
    pub async fn count(&self) -> Result<u64, Error> {
        let count: i64 = sqlx::query("SELECT COUNT(*) FROM ideas;")
            .fetch_one(&self.pool)
            .await?
            .get(0);
        Ok(count as u64)
    }
}
