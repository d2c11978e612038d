use askama::Template;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;

use crate::auth::{service, Sessions};
use crate::error::{AppError, AppResult};
use crate::routes::home::Html;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login_submit))
        .route("/logout", get(logout_page).post(logout))
}

// -- Templates --

#[derive(Template)]
#[template(path = "pages/login.html")]
struct LoginTemplate {
    redirect_to: String,
    login_type: String,
    username: String,
    username_error: Option<String>,
    password_error: Option<String>,
    form_error: Option<String>,
}

impl LoginTemplate {
    fn fresh(redirect_to: String) -> Self {
        Self {
            redirect_to,
            login_type: "login".to_string(),
            username: String::new(),
            username_error: None,
            password_error: None,
            form_error: None,
        }
    }

    fn has_errors(&self) -> bool {
        self.username_error.is_some() || self.password_error.is_some() || self.form_error.is_some()
    }
}

// -- Request types --

#[derive(Deserialize)]
struct LoginQuery {
    #[serde(rename = "redirectTo")]
    redirect_to: Option<String>,
}

#[derive(Deserialize)]
struct LoginForm {
    #[serde(rename = "loginType")]
    login_type: Option<String>,
    username: Option<String>,
    password: Option<String>,
    #[serde(rename = "redirectTo")]
    redirect_to: Option<String>,
}

// -- Handlers --

/// GET /login — render the combined login/register form
async fn login_page(Query(query): Query<LoginQuery>) -> Html<LoginTemplate> {
    let redirect_to = query.redirect_to.unwrap_or_else(|| "/".to_string());
    Html(LoginTemplate::fresh(redirect_to))
}

/// POST /login — one form, two modes: `loginType` selects login or register
async fn login_submit(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let login_type = form.login_type.unwrap_or_default();
    let username = form.username.unwrap_or_default();
    let password = form.password.unwrap_or_default();
    let redirect_to = form.redirect_to.unwrap_or_default();

    let mut template = LoginTemplate {
        redirect_to: redirect_to.clone(),
        login_type: login_type.clone(),
        username: username.clone(),
        username_error: None,
        password_error: None,
        form_error: None,
    };

    if username.chars().count() < 3 {
        template.username_error = Some("Username must be at least 3 characters".to_string());
    }
    if password.chars().count() < 6 {
        template.password_error = Some("Password must be at least 6 characters".to_string());
    }
    if !redirect_to.starts_with('/') {
        template.form_error = Some("Invalid redirect target".to_string());
    } else if login_type != "login" && login_type != "register" {
        // A mode is chosen per submission; a missing or unknown one is a
        // validation failure, not a default.
        template.form_error = Some("Login type invalid".to_string());
    }
    if template.has_errors() {
        return Ok(form_feedback(template));
    }

    let conn = state.db.get()?;

    match login_type.as_str() {
        "login" => match service::login(&conn, &username, &password)? {
            Some(user) => session_redirect(&state.sessions, user.id, &redirect_to),
            None => {
                // One generic message for unknown username and wrong password
                template.form_error = Some("Username/Password is incorrect".to_string());
                Ok(form_feedback(template))
            }
        },
        _ => match service::register(&conn, &username, &password) {
            Ok(user) => session_redirect(&state.sessions, user.id, &redirect_to),
            Err(AppError::Conflict(msg)) => {
                template.form_error = Some(msg);
                Ok(form_feedback(template))
            }
            Err(e) => Err(e),
        },
    }
}

/// POST /logout — destroy the session and go back to login
async fn logout(State(state): State<AppState>) -> Response {
    (
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, "/login".to_string()),
            (header::SET_COOKIE, state.sessions.destroy_session()),
        ],
        "",
    )
        .into_response()
}

/// GET /logout — nothing to see here
async fn logout_page() -> Redirect {
    Redirect::to("/")
}

fn session_redirect(sessions: &Sessions, user_id: i64, redirect_to: &str) -> AppResult<Response> {
    let cookie = sessions.create_session(user_id)?;
    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, redirect_to.to_string()),
            (header::SET_COOKIE, cookie),
        ],
        "",
    )
        .into_response())
}

fn form_feedback(template: LoginTemplate) -> Response {
    (StatusCode::BAD_REQUEST, Html(template)).into_response()
}
