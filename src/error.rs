use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::auth::session::SESSION_COOKIE;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    /// Authentication required: send the client to the login form, carrying
    /// the page it was trying to reach.
    #[error("Login required")]
    LoginRedirect(String),

    /// The session cookie verified but its user is gone. Resolved by forced
    /// logout, never shown as an error.
    #[error("Stale session")]
    StaleSession,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Password hash error: {0}")]
    Password(#[from] bcrypt::BcryptError),

    #[error("Session token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub fn login_redirect_target(redirect_to: &str) -> String {
    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("redirectTo", redirect_to)
        .finish();
    format!("/login?{query}")
}

fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg).into_response(),
            AppError::LoginRedirect(redirect_to) => (
                StatusCode::SEE_OTHER,
                [(header::LOCATION, login_redirect_target(&redirect_to))],
                "",
            )
                .into_response(),
            AppError::StaleSession => (
                StatusCode::SEE_OTHER,
                [
                    (header::LOCATION, "/login".to_string()),
                    (header::SET_COOKIE, clear_session_cookie()),
                ],
                "",
            )
                .into_response(),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                internal()
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                internal()
            }
            AppError::Password(e) => {
                tracing::error!("Password hash error: {}", e);
                internal()
            }
            AppError::Token(e) => {
                tracing::error!("Session token error: {}", e);
                internal()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                internal()
            }
        }
    }
}

fn internal() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn response_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn not_found_returns_404() {
        assert_eq!(response_status(AppError::NotFound), StatusCode::NOT_FOUND);
    }

    #[test]
    fn conflict_returns_409() {
        assert_eq!(
            response_status(AppError::Conflict("taken".into())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn internal_returns_500() {
        assert_eq!(
            response_status(AppError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn login_redirect_preserves_return_path() {
        let response = AppError::LoginRedirect("/jokes/new".into()).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/login?redirectTo=%2Fjokes%2Fnew"
        );
    }

    #[test]
    fn stale_session_clears_cookie_and_redirects() {
        let response = AppError::StaleSession.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
        let cookie = response.headers().get(header::SET_COOKIE).unwrap();
        assert!(cookie.to_str().unwrap().contains("Max-Age=0"));
    }
}
