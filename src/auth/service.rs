use rusqlite::Connection;

use crate::auth::password;
use crate::db::models::UserSummary;
use crate::db::queries;
use crate::error::{AppError, AppResult};

/// Check credentials. `Ok(None)` covers both an unknown username and a wrong
/// password — callers get one generic outcome so usernames cannot be probed
/// through the login form.
pub fn login(conn: &Connection, username: &str, password: &str) -> AppResult<Option<UserSummary>> {
    let Some(record) = queries::find_user_by_username(conn, username)? else {
        return Ok(None);
    };

    if !password::verify(password, &record.password_hash) {
        return Ok(None);
    }

    Ok(Some(UserSummary {
        id: record.id,
        username: record.username,
    }))
}

/// Create an account. A taken username fails with `AppError::Conflict` — the
/// pre-check is the friendly fast path, the UNIQUE constraint on the insert
/// is the actual guarantee when two registrations race.
pub fn register(conn: &Connection, username: &str, password: &str) -> AppResult<UserSummary> {
    if queries::find_user_by_username(conn, username)?.is_some() {
        return Err(username_taken(username));
    }

    let password_hash = password::hash(password)?;

    let id = match queries::insert_user(conn, username, &password_hash) {
        Ok(id) => id,
        Err(e) if queries::is_unique_violation(&e) => return Err(username_taken(username)),
        Err(e) => return Err(e.into()),
    };

    if id < 1 {
        return Err(AppError::Internal("Failed to create user record".into()));
    }

    queries::find_user_by_id(conn, id)?
        .ok_or_else(|| AppError::Internal("Failed to create user record".into()))
}

fn username_taken(username: &str) -> AppError {
    AppError::Conflict(format!("User with username {username} already exists"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use r2d2::Pool;
    use r2d2_sqlite::SqliteConnectionManager;

    fn test_conn() -> r2d2::PooledConnection<SqliteConnectionManager> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).unwrap();
        {
            let conn = pool.get().unwrap();
            conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        }
        db::run_migrations(&pool).unwrap();
        pool.get().unwrap()
    }

    #[test]
    fn register_then_login_returns_same_id() {
        let conn = test_conn();
        let registered = register(&conn, "alice", "secret1").unwrap();
        let logged_in = login(&conn, "alice", "secret1").unwrap().unwrap();
        assert_eq!(registered, logged_in);
    }

    #[test]
    fn wrong_password_and_unknown_user_look_identical() {
        let conn = test_conn();
        register(&conn, "alice", "secret1").unwrap();

        let wrong_password = login(&conn, "alice", "wrong!").unwrap();
        let unknown_user = login(&conn, "mallory", "secret1").unwrap();
        assert_eq!(wrong_password, None);
        assert_eq!(unknown_user, None);
    }

    #[test]
    fn duplicate_registration_is_a_conflict() {
        let conn = test_conn();
        register(&conn, "alice", "secret1").unwrap();

        let err = register(&conn, "alice", "other-pw").unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref msg) if msg.contains("alice")));

        // Exactly one row survives
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM users WHERE username = 'alice'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn stored_hash_is_not_the_password() {
        let conn = test_conn();
        register(&conn, "alice", "secret1").unwrap();

        let record = crate::db::queries::find_user_by_username(&conn, "alice")
            .unwrap()
            .unwrap();
        assert_ne!(record.password_hash, "secret1");
        assert!(record.password_hash.starts_with("$2"));
    }
}
