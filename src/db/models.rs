/// Public user fields, safe to hand to templates and sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
}

/// Full user row including the password hash. Stays inside the auth
/// service; never returned to handlers or templates.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joke {
    pub id: i64,
    pub name: String,
    pub content: String,
}

/// Sidebar entry: just enough to link to a joke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JokeListItem {
    pub id: i64,
    pub name: String,
}
