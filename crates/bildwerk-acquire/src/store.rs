// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Persistent session table backed by SQLite.
//
// Every suspension point of an acquisition writes the session here, so a
// process evicted while the OS shows the camera or picker can pick the
// session up again by id. Image bytes are never stored; only references.

use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, params};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::outcome::Outcome;
use bildwerk_core::types::{CandidateRef, PickerConfig, Session, SessionId, SessionState};

/// SQLite schema for the sessions table.
const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS sessions (
        id TEXT PRIMARY KEY,
        config TEXT NOT NULL,
        state TEXT NOT NULL,
        source_reference TEXT,
        owned_temp_resources TEXT NOT NULL DEFAULT '[]',
        outcome TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
"#;

const SELECT_COLUMNS: &str = "SELECT id, config, state, source_reference, owned_temp_resources,
        outcome, created_at, updated_at FROM sessions";

/// Session table.
///
/// All methods are synchronous because `rusqlite` does not support async
/// natively. The acquirer keeps the store behind a mutex and never holds
/// the lock across an await point.
pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    /// Open (or create) the session database at the given path, in WAL mode.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| BildwerkError::Database(format!("open: {e}")))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| BildwerkError::Database(format!("WAL pragma: {e}")))?;

        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(|e| BildwerkError::Database(format!("create table: {e}")))?;

        info!("session database opened");
        Ok(Self { conn })
    }

    /// Open an in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| BildwerkError::Database(format!("open in-memory: {e}")))?;

        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(|e| BildwerkError::Database(format!("create table: {e}")))?;

        debug!("in-memory session database opened");
        Ok(Self { conn })
    }

    /// Insert a freshly created session.
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    pub fn insert(&self, session: &Session) -> Result<()> {
        let row = EncodedSession::from_session(session)?;
        self.conn
            .execute(
                "INSERT INTO sessions (id, config, state, source_reference,
                 owned_temp_resources, outcome, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    session.id.to_string(),
                    row.config,
                    row.state,
                    row.source_reference,
                    row.owned_temp_resources,
                    row.outcome,
                    timestamp(&session.created_at),
                    timestamp(&session.updated_at),
                ],
            )
            .map_err(|e| BildwerkError::Database(format!("insert session: {e}")))?;

        debug!("session inserted");
        Ok(())
    }

    /// Write back every mutable field of an existing session.
    ///
    /// A row that already reached `Finished` is never overwritten: the
    /// update is skipped and `false` is returned. Of several writers racing
    /// to finish one session, exactly one sees `true`.
    #[instrument(skip(self, session), fields(session_id = %session.id, state = ?session.state))]
    pub fn save(&self, session: &Session) -> Result<bool> {
        let row = EncodedSession::from_session(session)?;
        let rows = self
            .conn
            .execute(
                "UPDATE sessions SET state = ?1, source_reference = ?2,
                 owned_temp_resources = ?3, outcome = ?4, updated_at = ?5
                 WHERE id = ?6 AND state != ?7",
                params![
                    row.state,
                    row.source_reference,
                    row.owned_temp_resources,
                    row.outcome,
                    timestamp(&session.updated_at),
                    session.id.to_string(),
                    encode_state(SessionState::Finished)?,
                ],
            )
            .map_err(|e| BildwerkError::Database(format!("save session: {e}")))?;

        if rows == 0 {
            if self.get(&session.id)?.is_none() {
                return Err(BildwerkError::UnknownSession(session.id));
            }
            debug!("stored session already finished, save skipped");
            return Ok(false);
        }
        debug!("session saved");
        Ok(true)
    }

    /// Retrieve a single session by id. Returns `None` if it does not exist.
    #[instrument(skip(self), fields(session_id = %id))]
    pub fn get(&self, id: &SessionId) -> Result<Option<Session>> {
        let mut sessions = self.query(&format!("{SELECT_COLUMNS} WHERE id = ?1"), id.to_string())?;
        Ok(sessions.pop())
    }

    /// The oldest session that has not reached `Finished`, if any.
    pub fn active(&self) -> Result<Option<Session>> {
        let mut sessions = self.query(
            &format!("{SELECT_COLUMNS} WHERE state != ?1 ORDER BY created_at ASC LIMIT 1"),
            encode_state(SessionState::Finished)?,
        )?;
        Ok(sessions.pop())
    }

    /// All sessions in `state`, oldest first.
    #[instrument(skip(self))]
    pub fn in_state(&self, state: SessionState) -> Result<Vec<Session>> {
        let sessions = self.query(
            &format!("{SELECT_COLUMNS} WHERE state = ?1 ORDER BY created_at ASC"),
            encode_state(state)?,
        )?;
        debug!(count = sessions.len(), "sessions retrieved");
        Ok(sessions)
    }

    /// Delete a session. Idempotent.
    #[instrument(skip(self), fields(session_id = %id))]
    pub fn delete(&self, id: &SessionId) -> Result<()> {
        self.conn
            .execute("DELETE FROM sessions WHERE id = ?1", params![id.to_string()])
            .map_err(|e| BildwerkError::Database(format!("delete session: {e}")))?;
        debug!("session deleted");
        Ok(())
    }

    /// Drop finished sessions last touched before `before`. Returns the
    /// number of rows removed.
    #[instrument(skip(self), fields(before = %before))]
    pub fn purge_finished(&self, before: DateTime<Utc>) -> Result<usize> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM sessions WHERE state = ?1 AND updated_at < ?2",
                params![encode_state(SessionState::Finished)?, timestamp(&before)],
            )
            .map_err(|e| BildwerkError::Database(format!("purge sessions: {e}")))?;

        if removed > 0 {
            info!(removed, "finished sessions purged");
        }
        Ok(removed)
    }

    fn query(&self, sql: &str, param: String) -> Result<Vec<Session>> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| BildwerkError::Database(format!("prepare: {e}")))?;

        stmt.query_map(params![param], row_to_session)
            .map_err(|e| BildwerkError::Database(format!("query: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| BildwerkError::Database(format!("row parse: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// JSON columns of one session row.
struct EncodedSession {
    config: String,
    state: String,
    source_reference: Option<String>,
    owned_temp_resources: String,
    outcome: Option<String>,
}

impl EncodedSession {
    fn from_session(session: &Session) -> Result<Self> {
        let outcome = session
            .outcome
            .as_ref()
            .map(|o| serde_json::to_string(o))
            .transpose()
            .map_err(|e| BildwerkError::Database(format!("serialize outcome: {e}")))?;

        Ok(Self {
            config: serde_json::to_string(&session.config)
                .map_err(|e| BildwerkError::Database(format!("serialize config: {e}")))?,
            state: encode_state(session.state)?,
            source_reference: session
                .source_reference
                .as_ref()
                .map(|r| r.as_str().to_string()),
            owned_temp_resources: serde_json::to_string(&session.owned_temp_resources)
                .map_err(|e| BildwerkError::Database(format!("serialize temp resources: {e}")))?,
            outcome,
        })
    }
}

fn encode_state(state: SessionState) -> Result<String> {
    serde_json::to_string(&state)
        .map_err(|e| BildwerkError::Database(format!("serialize state: {e}")))
}

/// Fixed-width RFC 3339 so stored timestamps also sort as text.
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn conversion_error(
    column: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(err))
}

fn json_column<T: DeserializeOwned>(row: &rusqlite::Row<'_>, column: usize) -> rusqlite::Result<T> {
    let text: String = row.get(column)?;
    serde_json::from_str(&text).map_err(|e| conversion_error(column, e))
}

fn time_column(row: &rusqlite::Row<'_>, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, e))
}

/// Map a SQLite row to a `Session`. Column order follows `SELECT_COLUMNS`.
fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
    let id_str: String = row.get(0)?;
    let uuid = uuid::Uuid::parse_str(&id_str).map_err(|e| conversion_error(0, e))?;

    let config: PickerConfig = json_column(row, 1)?;
    let state: SessionState = json_column(row, 2)?;
    let source_reference: Option<String> = row.get(3)?;
    let owned_temp_resources: Vec<PathBuf> = json_column(row, 4)?;
    let outcome_json: Option<String> = row.get(5)?;
    let outcome: Option<Outcome> = outcome_json
        .map(|text| serde_json::from_str(&text))
        .transpose()
        .map_err(|e| conversion_error(5, e))?;

    Ok(Session {
        id: SessionId(uuid),
        config,
        state,
        source_reference: source_reference.map(CandidateRef::new),
        owned_temp_resources,
        outcome,
        created_at: time_column(row, 6)?,
        updated_at: time_column(row, 7)?,
    })
}
