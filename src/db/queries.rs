//! Fixed, named query shapes for the two tables. These run repeatedly with
//! different parameters, so each one is a stable statement that goes through
//! the connection's prepared-statement cache.

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::{Joke, JokeListItem, UserRecord, UserSummary};

const LIST_RECENT_JOKES: &str =
    "SELECT id, name FROM jokes ORDER BY createdAt DESC, id DESC LIMIT ?1";

const GET_JOKE_BY_ID: &str = "SELECT id, name, content FROM jokes WHERE id = ?1";

const GET_RANDOM_JOKE: &str = "SELECT id, name, content FROM jokes ORDER BY RANDOM() LIMIT 1";

const INSERT_JOKE: &str = "INSERT INTO jokes (jokesterId, name, content) VALUES (?1, ?2, ?3)";

const FIND_USER_BY_ID: &str = "SELECT id, username FROM users WHERE id = ?1";

const FIND_USER_BY_USERNAME: &str =
    "SELECT id, username, passwordHash FROM users WHERE username = ?1";

const INSERT_USER: &str = "INSERT INTO users (username, passwordHash) VALUES (?1, ?2)";

/// Newest jokes first, at most `limit` rows. The id tiebreak keeps the order
/// stable when several jokes land within the same second.
pub fn list_recent_jokes(conn: &Connection, limit: u32) -> rusqlite::Result<Vec<JokeListItem>> {
    let mut stmt = conn.prepare_cached(LIST_RECENT_JOKES)?;
    let rows = stmt.query_map(params![limit], |row| {
        Ok(JokeListItem {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;
    rows.collect()
}

pub fn get_joke_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<Joke>> {
    let mut stmt = conn.prepare_cached(GET_JOKE_BY_ID)?;
    stmt.query_row(params![id], |row| {
        Ok(Joke {
            id: row.get(0)?,
            name: row.get(1)?,
            content: row.get(2)?,
        })
    })
    .optional()
}

/// One uniformly-selected joke, or `None` when the table is empty.
pub fn get_random_joke(conn: &Connection) -> rusqlite::Result<Option<Joke>> {
    let mut stmt = conn.prepare_cached(GET_RANDOM_JOKE)?;
    stmt.query_row([], |row| {
        Ok(Joke {
            id: row.get(0)?,
            name: row.get(1)?,
            content: row.get(2)?,
        })
    })
    .optional()
}

/// Insert a joke and return its id. A `jokesterId` that does not reference
/// an existing user fails the whole insert (foreign keys are on).
pub fn insert_joke(
    conn: &Connection,
    name: &str,
    content: &str,
    jokester_id: i64,
) -> rusqlite::Result<i64> {
    let mut stmt = conn.prepare_cached(INSERT_JOKE)?;
    stmt.execute(params![jokester_id, name, content])?;
    Ok(conn.last_insert_rowid())
}

pub fn find_user_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<UserSummary>> {
    let mut stmt = conn.prepare_cached(FIND_USER_BY_ID)?;
    stmt.query_row(params![id], |row| {
        Ok(UserSummary {
            id: row.get(0)?,
            username: row.get(1)?,
        })
    })
    .optional()
}

/// Full row including the password hash — for the auth service only.
pub fn find_user_by_username(
    conn: &Connection,
    username: &str,
) -> rusqlite::Result<Option<UserRecord>> {
    let mut stmt = conn.prepare_cached(FIND_USER_BY_USERNAME)?;
    stmt.query_row(params![username], |row| {
        Ok(UserRecord {
            id: row.get(0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
        })
    })
    .optional()
}

pub fn insert_user(conn: &Connection, username: &str, password_hash: &str) -> rusqlite::Result<i64> {
    let mut stmt = conn.prepare_cached(INSERT_USER)?;
    stmt.execute(params![username, password_hash])?;
    Ok(conn.last_insert_rowid())
}

/// True when an insert failed because a UNIQUE constraint fired. The users
/// table relies on this as the actual uniqueness guarantee; the application
/// level pre-check is only a friendlier fast path.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::state::DbPool;
    use r2d2::Pool;
    use r2d2_sqlite::SqliteConnectionManager;

    fn test_pool() -> DbPool {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).unwrap();
        {
            let conn = pool.get().unwrap();
            conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        }
        db::run_migrations(&pool).unwrap();
        pool
    }

    fn seed_user(conn: &Connection, username: &str) -> i64 {
        insert_user(conn, username, "not-a-real-hash").unwrap()
    }

    #[test]
    fn insert_and_get_joke_round_trip() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let alice = seed_user(&conn, "alice");

        let id = insert_joke(&conn, "Cow", "Why did the cow cross the road?", alice).unwrap();
        let joke = get_joke_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(joke.name, "Cow");
        assert_eq!(joke.content, "Why did the cow cross the road?");
    }

    #[test]
    fn get_joke_by_id_misses_cleanly() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        assert_eq!(get_joke_by_id(&conn, 42).unwrap(), None);
    }

    #[test]
    fn insert_joke_rejects_unknown_jokester() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let result = insert_joke(&conn, "Orphan", "This joke has no author here", 999);
        assert!(result.is_err());
    }

    #[test]
    fn random_joke_comes_from_the_set() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let alice = seed_user(&conn, "alice");
        let mut ids = Vec::new();
        for i in 0..4 {
            ids.push(
                insert_joke(&conn, &format!("Joke {i}"), "A sufficiently long punchline", alice)
                    .unwrap(),
            );
        }

        for _ in 0..20 {
            let joke = get_random_joke(&conn).unwrap().unwrap();
            assert!(ids.contains(&joke.id));
        }
    }

    #[test]
    fn random_joke_on_empty_set_is_none() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        assert_eq!(get_random_joke(&conn).unwrap(), None);
    }

    #[test]
    fn recent_jokes_are_bounded_and_newest_first() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let alice = seed_user(&conn, "alice");

        let mut ids = Vec::new();
        for i in 0..6 {
            ids.push(
                insert_joke(&conn, &format!("Joke {i}"), "A sufficiently long punchline", alice)
                    .unwrap(),
            );
        }

        let recent = list_recent_jokes(&conn, 5).unwrap();
        assert_eq!(recent.len(), 5);
        // Newest first, and the oldest of the six has fallen off
        let listed: Vec<i64> = recent.iter().map(|j| j.id).collect();
        let mut expected: Vec<i64> = ids[1..].to_vec();
        expected.reverse();
        assert_eq!(listed, expected);
    }

    #[test]
    fn find_user_by_username_includes_hash() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        seed_user(&conn, "alice");

        let record = find_user_by_username(&conn, "alice").unwrap().unwrap();
        assert_eq!(record.username, "alice");
        assert_eq!(record.password_hash, "not-a-real-hash");
        assert_eq!(find_user_by_username(&conn, "bob").unwrap().map(|u| u.id), None);
    }

    #[test]
    fn duplicate_username_is_a_unique_violation() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        seed_user(&conn, "alice");

        let err = insert_user(&conn, "alice", "another-hash").unwrap_err();
        assert!(is_unique_violation(&err));
        // Unrelated errors are not mistaken for it
        assert!(!is_unique_violation(&rusqlite::Error::QueryReturnedNoRows));
    }
}
