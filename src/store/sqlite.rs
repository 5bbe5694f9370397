//! SQLite-backed message store.
//!
//! Error policy mirrors what callers can act on: reads are logged and
//! swallowed (a chat UI with no history is degraded, not broken), writes
//! are logged and propagated so the caller can tell the user persistence
//! failed.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, params};

use super::schema::apply_schema;
use crate::error::{ChatError, Result};
use crate::message::{ChatMessage, DetectedLanguage, Role};

/// Database filename within the data directory.
const DB_FILENAME: &str = "glossa.db";

/// Durable chat message store.
///
/// Thread-safe via an internal `Mutex<Connection>`. A disabled store
/// (no connection) short-circuits every operation: reads return empty,
/// writes succeed as no-ops. Inject it in contexts without storage
/// instead of sniffing the environment.
pub struct MessageStore {
    conn: Option<Mutex<Connection>>,
}

impl MessageStore {
    /// Open (or create) the database at `{data_dir}/glossa.db`.
    ///
    /// Applies the schema, upgrading older databases in place.
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        Self::open_path(&data_dir.join(DB_FILENAME))
    }

    /// Open (or create) the database at an explicit path.
    pub fn open_path(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(sql_err)?;
        apply_schema(&conn).map_err(sql_err)?;
        Ok(Self {
            conn: Some(Mutex::new(conn)),
        })
    }

    /// In-memory store, for tests and ephemeral sessions.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(sql_err)?;
        apply_schema(&conn).map_err(sql_err)?;
        Ok(Self {
            conn: Some(Mutex::new(conn)),
        })
    }

    /// No-op store for contexts without persistence.
    pub fn disabled() -> Self {
        Self { conn: None }
    }

    pub fn is_disabled(&self) -> bool {
        self.conn.is_none()
    }

    /// All persisted messages, ascending by timestamp.
    ///
    /// Read failures are logged and swallowed — returns empty.
    pub fn get_all_messages(&self) -> Vec<ChatMessage> {
        match self.query_messages(
            "SELECT id, role, content, timestamp, detected, origin_id \
             FROM messages ORDER BY timestamp ASC",
            params![],
        ) {
            Ok(messages) => messages,
            Err(e) => {
                tracing::error!(error = %e, "failed to load messages");
                Vec::new()
            }
        }
    }

    /// Upsert a message by id (insert-or-replace).
    ///
    /// Failures are logged and propagated: a silent write failure would
    /// corrupt the user's mental model of what was saved.
    pub fn save_message(&self, message: &ChatMessage) -> Result<()> {
        let Some(conn) = &self.conn else {
            return Ok(());
        };
        let conn = lock(conn)?;

        let detected = message
            .detected
            .as_ref()
            .map(|d| serde_json::to_string(d).unwrap_or_else(|_| "null".to_owned()));

        conn.execute(
            "INSERT OR REPLACE INTO messages (id, role, content, timestamp, detected, origin_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                message.id,
                role_to_str(message.role),
                message.content,
                message.timestamp,
                detected,
                message.origin_id,
            ],
        )
        .map_err(|e| {
            tracing::error!(id = %message.id, error = %e, "failed to save message");
            sql_err(e)
        })?;
        Ok(())
    }

    /// All messages derived from `origin_id`, via the secondary index.
    ///
    /// Empty on failure or absence.
    pub fn get_related_messages(&self, origin_id: &str) -> Vec<ChatMessage> {
        match self.query_messages(
            "SELECT id, role, content, timestamp, detected, origin_id \
             FROM messages WHERE origin_id = ?1 ORDER BY timestamp ASC",
            params![origin_id],
        ) {
            Ok(messages) => messages,
            Err(e) => {
                tracing::error!(origin_id, error = %e, "failed to load related messages");
                Vec::new()
            }
        }
    }

    /// Delete all messages. Failures are logged and propagated.
    pub fn clear_messages(&self) -> Result<()> {
        let Some(conn) = &self.conn else {
            return Ok(());
        };
        let conn = lock(conn)?;
        conn.execute("DELETE FROM messages", []).map_err(|e| {
            tracing::error!(error = %e, "failed to clear messages");
            sql_err(e)
        })?;
        Ok(())
    }

    fn query_messages(
        &self,
        sql: &str,
        query_params: impl rusqlite::Params,
    ) -> Result<Vec<ChatMessage>> {
        let Some(conn) = &self.conn else {
            return Ok(Vec::new());
        };
        let conn = lock(conn)?;
        let mut stmt = conn.prepare(sql).map_err(sql_err)?;
        let rows = stmt.query_map(query_params, row_to_message).map_err(sql_err)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row.map_err(sql_err)?);
        }
        Ok(messages)
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<std::sync::MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| ChatError::Store("connection mutex poisoned".to_owned()))
}

fn sql_err(e: rusqlite::Error) -> ChatError {
    ChatError::Store(e.to_string())
}

fn role_to_str(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatMessage> {
    let role: String = row.get(1)?;
    let detected: Option<String> = row.get(4)?;
    Ok(ChatMessage {
        id: row.get(0)?,
        role: if role == "assistant" {
            Role::Assistant
        } else {
            Role::User
        },
        content: row.get(2)?,
        timestamp: row.get(3)?,
        detected: detected
            .as_deref()
            .and_then(|raw| serde_json::from_str::<DetectedLanguage>(raw).ok()),
        origin_id: row.get(5)?,
    })
}
