//! Account route handlers.
//!
//! Registration and password login. A successful login stores a
//! [`CurrentUser`] in the server-side session.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use super::{JsonBody, MessageResponse};
use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Login and registration body.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Body returned by a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub username: String,
}

/// Create an account.
///
/// POST /api/auth/register
#[tracing::instrument(skip_all, fields(username = %form.username))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(form): JsonBody<Credentials>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    state.auth().register(&form.username, &form.password).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Registration successful")),
    ))
}

/// Log in with username and password.
///
/// POST /api/auth/login
#[tracing::instrument(skip_all, fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    JsonBody(form): JsonBody<Credentials>,
) -> Result<Json<LoginResponse>> {
    let user = state.auth().login(&form.username, &form.password).await?;

    let current = CurrentUser {
        id: user.id,
        username: user.username.clone(),
    };
    set_current_user(&session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    set_sentry_user(&user.id, Some(user.username.as_str()));
    add_breadcrumb("auth", "Logged in", None);

    Ok(Json(LoginResponse {
        username: user.username.as_str().to_owned(),
    }))
}

/// End the session.
///
/// POST /api/auth/logout
pub async fn logout(session: Session) -> Result<Json<MessageResponse>> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();
    Ok(Json(MessageResponse::new("Logged out")))
}

/// The logged-in user.
///
/// GET /api/auth/me
pub async fn me(RequireAuth(user): RequireAuth) -> Json<CurrentUser> {
    Json(user)
}
