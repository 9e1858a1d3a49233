//! Bridge from the session proxy to request extensions.
//!
//! Cookie sessions and login are handled by the proxy in front of this
//! service. It forwards the signed-in user's id, the session version and the
//! second-factor method as headers; this layer loads the user from adminusers
//! and exposes both to `user_is_authorised`.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use super::auth::SessionContext;
use crate::errors::AppError;
use crate::state::AppState;

pub const USER_HEADER: &str = "x-session-user-external-id";
pub const VERSION_HEADER: &str = "x-session-version";
pub const SECOND_FACTOR_HEADER: &str = "x-session-second-factor";

pub fn session_from_headers(headers: &HeaderMap) -> Option<SessionContext> {
    let version = headers
        .get(VERSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())?;
    let second_factor = headers
        .get(SECOND_FACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from);
    Some(SessionContext {
        version,
        second_factor,
    })
}

pub async fn load_session(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = req
        .headers()
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    if let Some(session) = session_from_headers(req.headers()) {
        req.extensions_mut().insert(session);
    }

    if let Some(user_id) = user_id {
        match state.adminusers.get_user_by_external_id(&user_id).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            // Unknown user: leave the request anonymous, auth rejects it.
            Err(e) if e.is_not_found() => {
                tracing::info!(user_external_id = %user_id, "session user not found");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(next.run(req).await)
}
