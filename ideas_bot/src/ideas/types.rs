use std::borrow::Cow;

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};
use teloxide::types::{User, UserId};

/// Label used for ideas whose author has neither a username nor a name.
pub const ANONYMOUS_LABEL: &str = "Anonymous";

/// One submitted idea.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Idea {
    /// Permanent ID. Never reused, even after the idea is deleted.
    pub id: i64,
    /// Who sent it. `None` if it was sent on behalf of a chat.
    pub author_id: Option<UserId>,
    /// `@username` or first name of the author at the time of sending. May be empty.
    pub author_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Idea {
    #[allow(clippy::cast_sign_loss)]
    pub(super) fn from_sqlite_row(row: &SqliteRow) -> Idea {
        Idea {
            id: row.get(0),
            author_id: row.get::<Option<i64>, _>(1).map(|x| UserId(x as u64)),
            author_name: row.get(2),
            text: row.get(3),
            created_at: row.get(4),
        }
    }

    /// Name of the author fit for display.
    #[must_use]
    pub fn author_label(&self) -> &str {
        if self.author_name.is_empty() {
            ANONYMOUS_LABEL
        } else {
            &self.author_name
        }
    }

    /// The idea's text, cut down to at most `max_chars` characters.
    #[must_use]
    pub fn preview(&self, max_chars: usize) -> Cow<'_, str> {
        truncate_with_ellipsis(&self.text, max_chars)
    }

    /// This idea as a row for an external mirror.
    #[must_use]
    pub fn sink_row(&self) -> SinkRow {
        SinkRow {
            text: self.text.clone(),
            author_label: self.author_label().to_string(),
            author_id: self.author_id.map(|x| x.0),
            timestamp: self.created_at,
        }
    }
}

/// Makes a display label for a Telegram user: `@username`, or the first name.
#[must_use]
pub fn author_name_of(user: &User) -> String {
    if let Some(username) = &user.username {
        format!("@{username}")
    } else {
        user.first_name.clone()
    }
}

/// Cut `text` to `max_chars` characters, replacing the tail with "..." if it's too long.
#[must_use]
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> Cow<'_, str> {
    const ELLIPSIS: &str = "...";

    if text.chars().count() <= max_chars {
        return Cow::Borrowed(text);
    }

    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut output: String = text.chars().take(keep).collect();
    output.push_str(ELLIPSIS);
    Cow::Owned(output)
}

/// One row as it is written to a mirror: text, author label, author ID, timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinkRow {
    pub text: String,
    pub author_label: String,
    pub author_id: Option<u64>,
    pub timestamp: DateTime<Utc>,
}

impl SinkRow {
    /// The row as a list of JSON cells, in mirror column order.
    #[must_use]
    pub fn to_cells(&self) -> Vec<serde_json::Value> {
        vec![
            self.text.clone().into(),
            self.author_label.clone().into(),
            self.author_id
                .map_or_else(|| serde_json::Value::String(String::new()), Into::into),
            self.timestamp
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
                .into(),
        ]
    }
}
