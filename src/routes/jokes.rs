use askama::Template;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use rusqlite::Connection;
use serde::Deserialize;

use crate::db::models::{Joke, JokeListItem, UserSummary};
use crate::db::queries;
use crate::error::{AppError, AppResult};
use crate::extractors::{MaybeUser, RequireUserId};
use crate::routes::home::Html;
use crate::state::AppState;

/// How many jokes the sidebar shows.
const SIDEBAR_JOKES: u32 = 5;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/jokes", get(random_joke))
        .route("/jokes/new", get(new_joke_form).post(create_joke))
        .route("/jokes/{id}", get(show_joke))
}

// -- Templates --

#[derive(Template)]
#[template(path = "jokes/random.html")]
struct RandomJokeTemplate {
    user: Option<UserSummary>,
    joke_list: Vec<JokeListItem>,
    joke: Option<Joke>,
}

#[derive(Template)]
#[template(path = "jokes/show.html")]
struct ShowJokeTemplate {
    user: Option<UserSummary>,
    joke_list: Vec<JokeListItem>,
    joke: Joke,
}

#[derive(Template)]
#[template(path = "jokes/new.html")]
struct NewJokeTemplate {
    user: Option<UserSummary>,
    joke_list: Vec<JokeListItem>,
    name: String,
    content: String,
    name_error: Option<String>,
    content_error: Option<String>,
}

#[derive(Deserialize)]
struct JokeForm {
    name: Option<String>,
    content: Option<String>,
}

fn sidebar(conn: &Connection) -> AppResult<Vec<JokeListItem>> {
    Ok(queries::list_recent_jokes(conn, SIDEBAR_JOKES)?)
}

// -- Handlers --

/// GET /jokes — a random joke next to the recent-jokes sidebar
async fn random_joke(State(state): State<AppState>, MaybeUser(user): MaybeUser) -> AppResult<Response> {
    let conn = state.db.get()?;
    let joke_list = sidebar(&conn)?;
    let joke = queries::get_random_joke(&conn)?;

    Ok(Html(RandomJokeTemplate {
        user,
        joke_list,
        joke,
    })
    .into_response())
}

/// GET /jokes/{id} — one joke, or 404 when the id doesn't exist
async fn show_joke(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let joke = queries::get_joke_by_id(&conn, id)?.ok_or(AppError::NotFound)?;
    let joke_list = sidebar(&conn)?;

    Ok(Html(ShowJokeTemplate {
        user,
        joke_list,
        joke,
    })
    .into_response())
}

/// GET /jokes/new — submission form, login required
async fn new_joke_form(
    State(state): State<AppState>,
    RequireUserId(_): RequireUserId,
    MaybeUser(user): MaybeUser,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let joke_list = sidebar(&conn)?;

    Ok(Html(NewJokeTemplate {
        user,
        joke_list,
        name: String::new(),
        content: String::new(),
        name_error: None,
        content_error: None,
    })
    .into_response())
}

/// POST /jokes/new — validate, insert, show the new joke
async fn create_joke(
    State(state): State<AppState>,
    RequireUserId(user_id): RequireUserId,
    MaybeUser(user): MaybeUser,
    Form(form): Form<JokeForm>,
) -> AppResult<Response> {
    let name = form.name.unwrap_or_default();
    let content = form.content.unwrap_or_default();

    let name_error =
        (name.chars().count() < 3).then(|| "Name must be at least 3 characters".to_string());
    let content_error = (content.chars().count() < 10)
        .then(|| "Content must be at least 10 characters".to_string());

    let conn = state.db.get()?;

    if name_error.is_some() || content_error.is_some() {
        let joke_list = sidebar(&conn)?;
        let template = NewJokeTemplate {
            user,
            joke_list,
            name,
            content,
            name_error,
            content_error,
        };
        return Ok((StatusCode::BAD_REQUEST, Html(template)).into_response());
    }

    let id = queries::insert_joke(&conn, &name, &content, user_id)?;
    Ok(Redirect::to(&format!("/jokes/{id}")).into_response())
}
