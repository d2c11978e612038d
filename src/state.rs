use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::Sessions;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub sessions: Sessions,
}
