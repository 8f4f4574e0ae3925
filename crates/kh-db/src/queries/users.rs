//! User CRUD operations.

use chrono::Utc;
use kh_core::account::{DEFAULT_PROFILE_IMAGE, DEFAULT_ROLE, DEFAULT_STATUS};
use kh_core::{Error, Result, UserId};
use rusqlite::{Connection, OptionalExtension};

use crate::models::{User, USER_COLS};

/// Map a write error, turning the email UNIQUE violation into a conflict.
fn map_write_err(e: rusqlite::Error) -> Error {
    if e.to_string().contains("UNIQUE constraint failed") {
        Error::Conflict("This email already exists".into())
    } else {
        Error::database(e.to_string())
    }
}

/// Create a new user with the default role, status and profile picture.
pub fn create_user(
    conn: &Connection,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<User> {
    let id = UserId::new();
    let now = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO users (id, name, email, password_hash, profile_image, role, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        rusqlite::params![
            id.to_string(),
            name,
            email,
            password_hash,
            DEFAULT_PROFILE_IMAGE,
            DEFAULT_ROLE,
            DEFAULT_STATUS,
            now,
        ],
    )
    .map_err(map_write_err)?;

    Ok(User {
        id,
        name: name.to_string(),
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        profile_image: DEFAULT_PROFILE_IMAGE.to_string(),
        role: DEFAULT_ROLE,
        status: DEFAULT_STATUS,
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Get a user by primary key.
pub fn get_user_by_id(conn: &Connection, id: UserId) -> Result<Option<User>> {
    let q = format!("SELECT {USER_COLS} FROM users WHERE id = ?1");
    conn.query_row(&q, [id.to_string()], User::from_row)
        .optional()
        .map_err(|e| Error::database(e.to_string()))
}

/// Get a user by email (case-insensitive).
pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let q = format!("SELECT {USER_COLS} FROM users WHERE email = ?1");
    conn.query_row(&q, [email], User::from_row)
        .optional()
        .map_err(|e| Error::database(e.to_string()))
}

/// Whether `email` belongs to any user other than `except`.
pub fn email_exists(conn: &Connection, email: &str, except: Option<UserId>) -> Result<bool> {
    let except = except.map(|id| id.to_string()).unwrap_or_default();
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE email = ?1 AND id != ?2",
        rusqlite::params![email, except],
        |row| row.get(0),
    )
    .map_err(|e| Error::database(e.to_string()))
}

/// Update a user's name and email. Returns false if the user does not exist.
pub fn update_account(conn: &Connection, id: UserId, name: &str, email: &str) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE users SET name = ?1, email = ?2, updated_at = ?3 WHERE id = ?4",
            rusqlite::params![name, email, Utc::now().to_rfc3339(), id.to_string()],
        )
        .map_err(map_write_err)?;
    Ok(n > 0)
}

/// Update a user's password hash.
pub fn update_password(conn: &Connection, id: UserId, password_hash: &str) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![password_hash, Utc::now().to_rfc3339(), id.to_string()],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Read only the `profile_image` column of a user.
pub fn get_profile_image(conn: &Connection, id: UserId) -> Result<Option<String>> {
    conn.query_row(
        "SELECT profile_image FROM users WHERE id = ?1",
        [id.to_string()],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// Point a user at a new profile picture.
///
/// A single `UPDATE`, so readers observe either the old or the new filename.
pub fn set_profile_image(conn: &Connection, id: UserId, filename: &str) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE users SET profile_image = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![filename, Utc::now().to_rfc3339(), id.to_string()],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Delete a user by ID. Returns true if a row was deleted.
#[cfg(test)]
pub(crate) fn delete_user(conn: &Connection, id: UserId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM users WHERE id = ?1", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}
