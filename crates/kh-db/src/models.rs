//! Rust structs mapping to database tables.
//!
//! Each model implements `from_row` for constructing itself from a
//! `rusqlite::Row`.

use kh_core::{SessionId, UserId};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

/// Parse a UUID-based ID from a text column.
fn parse_id<T: From<Uuid>>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    let uuid = Uuid::parse_str(&s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(T::from(uuid))
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// Column list matching [`User::from_row`].
pub(crate) const USER_COLS: &str =
    "id, name, email, password_hash, profile_image, role, status, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    /// Filename relative to the profile picture storage directory.
    pub profile_image: String,
    pub role: i64,
    pub status: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            profile_image: row.get(4)?,
            role: row.get(5)?,
            status: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}

// ---------------------------------------------------------------------------
// AuthToken
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AuthToken {
    pub id: SessionId,
    pub user_id: UserId,
    pub token: String,
    pub expires_at: String,
}

impl AuthToken {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            user_id: parse_id(row, 1)?,
            token: row.get(2)?,
            expires_at: row.get(3)?,
        })
    }
}
