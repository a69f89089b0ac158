use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::credentials::{authenticate, LoginOutcome};
use crate::auth::session::{expired_session_cookie, session_cookie};
use crate::errors::AppError;
use crate::routes::success;
use crate::state::AppState;
use crate::storage::keys::ProfileName;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "profileName")]
    pub profile_name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub status: &'static str,
    pub message: String,
    pub profile_name: String,
    pub created: bool,
    pub token: String,
}

/// POST /api/v1/auth/login
///
/// Logs into an existing profile, or creates the profile on first use of a name.
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<LoginResponse>), AppError> {
    let (raw_name, password) = match (req.profile_name, req.password) {
        (Some(name), Some(password)) if !name.trim().is_empty() && !password.is_empty() => {
            (name, password)
        }
        _ => {
            return Err(AppError::Validation(
                "Please enter a profile name and password.".to_string(),
            ))
        }
    };

    let profile = ProfileName::parse(&raw_name)?;
    let outcome = authenticate(state.store.as_ref(), &profile, &password).await?;

    let token = state
        .sessions
        .issue(&profile)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("issuing session token: {e}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        HeaderValue::from_str(&session_cookie(&token, state.sessions.ttl_seconds()))
            .map_err(|e| AppError::Internal(anyhow::anyhow!("building session cookie: {e}")))?,
    );

    let (message, created) = match outcome {
        LoginOutcome::Verified => (format!("Welcome back, {profile}!"), false),
        LoginOutcome::Registered => (format!("New profile \"{profile}\" created. Welcome!"), true),
    };

    Ok((
        headers,
        Json(LoginResponse {
            status: "success",
            message,
            profile_name: profile.to_string(),
            created,
            token,
        }),
    ))
}

/// POST /api/v1/auth/logout
///
/// Sessions are stateless; this clears the cookie and the client drops its token.
pub async fn handle_logout() -> (HeaderMap, Json<Value>) {
    let mut headers = HeaderMap::new();
    if let Ok(cookie) = HeaderValue::from_str(&expired_session_cookie()) {
        headers.insert(SET_COOKIE, cookie);
    }
    (headers, success("You have been logged out."))
}
