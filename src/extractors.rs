use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::SessionState;
use crate::db::models::UserSummary;
use crate::error::AppError;
use crate::state::AppState;

/// Extractor for pages that demand a logged-in user. The rejection is a
/// redirect to the login form carrying the current path as the return-to
/// target, not a bare 401.
pub struct RequireUserId(pub i64);

impl FromRequestParts<AppState> for RequireUserId {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match state.sessions.user_id(parts) {
            Some(id) => Ok(RequireUserId(id)),
            None => Err(AppError::LoginRedirect(parts.uri.path().to_string())),
        }
    }
}

/// Optional user extractor for pages anyone may view. Anonymous requests
/// resolve to `None`; a session whose user has vanished forces a logout.
pub struct MaybeUser(pub Option<UserSummary>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let conn = state.db.get()?;
        match state.sessions.current_user(parts, &conn)? {
            SessionState::Anonymous => Ok(MaybeUser(None)),
            SessionState::Authenticated(user) => Ok(MaybeUser(Some(user))),
            SessionState::Stale => Err(AppError::StaleSession),
        }
    }
}
