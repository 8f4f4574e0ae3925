//! SQLite-backed [`ProfileRepository`].

use kh_core::{Error, Result, UserId};
use kh_db::pool::{get_conn, DbPool};
use kh_db::queries::users;

use crate::workflow::ProfileRepository;

/// Reads and writes `users.profile_image` through the connection pool.
#[derive(Clone)]
pub struct DbProfileRepository {
    db: DbPool,
}

impl DbProfileRepository {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

impl ProfileRepository for DbProfileRepository {
    fn profile_image(&self, user_id: UserId) -> Result<String> {
        let conn = get_conn(&self.db)?;
        users::get_profile_image(&conn, user_id)?.ok_or_else(|| Error::not_found("user", user_id))
    }

    fn set_profile_image(&self, user_id: UserId, filename: &str) -> Result<()> {
        let conn = get_conn(&self.db)?;
        if users::set_profile_image(&conn, user_id, filename)? {
            Ok(())
        } else {
            Err(Error::not_found("user", user_id))
        }
    }
}
