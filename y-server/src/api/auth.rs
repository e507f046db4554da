use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use y_types::{LoginRequest, SessionResponse};

use crate::db::repositories::AccountRepository;
use crate::middleware::CurrentToken;
use crate::password::verify_password_task;
use crate::session::clear_cookie;
use crate::state::AppState;

use super::{json_payload, ApiError, ApiResult};

const BAD_CREDENTIALS: &str = "Wrong username or password.";

/// POST /api/login - Check credentials and start a session
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let request = json_payload(payload)?;

    let credentials = state
        .db
        .with_connection(|conn| -> ApiResult<Option<(i64, String)>> {
            Ok(AccountRepository::new(conn).credentials_for(&request.username)?)
        })?;

    let verified = match credentials {
        Some((id, hash)) => verify_password_task(request.password.clone(), hash)
            .await?
            .then_some(id),
        None => None,
    };
    let Some(account_id) = verified else {
        tracing::debug!("Failed login for '{}'", request.username);
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.to_string()));
    };

    let token = state.db.with_transaction(|tx| -> ApiResult<String> {
        Ok(state.session_manager.create_session(tx, account_id)?)
    })?;

    let cookie = state.session_manager.session_cookie(&token);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse::for_account(account_id)),
    )
        .into_response())
}

/// POST /api/logout - End the current session, if any, and clear the cookie
pub async fn logout(
    State(state): State<AppState>,
    CurrentToken(token): CurrentToken,
) -> ApiResult<Response> {
    if let Some(token) = token {
        state.db.with_transaction(|tx| -> ApiResult<()> {
            state.session_manager.delete_session(tx, &token)?;
            Ok(())
        })?;
    }

    Ok((
        [(header::SET_COOKIE, clear_cookie())],
        Json(json!({ "msg": "Logged out" })),
    )
        .into_response())
}
