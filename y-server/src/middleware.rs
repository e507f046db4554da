use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::api::ApiError;
use crate::session::{token_from_headers, SessionError};
use crate::state::AppState;

/// What the session middleware found on the request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    /// No token, or a token that matches no live session
    Missing,
    Expired,
    Active { account_id: i64, token: String },
}

/// Validate the request's session token, slide its expiry, and re-issue the
/// cookie on the way out.
///
/// Every route sits behind this middleware; the extractors below decide
/// whether a missing session is an error for a given handler.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let status = match token_from_headers(request.headers()) {
        None => SessionStatus::Missing,
        Some(token) => match state.session_manager.validate_and_refresh(&token) {
            Ok(account_id) => SessionStatus::Active { account_id, token },
            Err(SessionError::Expired) => SessionStatus::Expired,
            Err(SessionError::NotFound) => SessionStatus::Missing,
            Err(e) => return ApiError::from(e).into_response(),
        },
    };

    request.extensions_mut().insert(status.clone());
    let mut response = next.run(request).await;

    // Handlers that log in or out set their own cookie
    if let SessionStatus::Active { token, .. } = status {
        if !response.headers().contains_key(header::SET_COOKIE) {
            let cookie = state.session_manager.session_cookie(&token);
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().insert(header::SET_COOKIE, value);
            }
        }
    }

    response
}

fn session_status(parts: &Parts) -> SessionStatus {
    parts
        .extensions
        .get::<SessionStatus>()
        .cloned()
        .unwrap_or(SessionStatus::Missing)
}

/// Id of the logged-in account for API handlers; rejects with 401 JSON
#[derive(Debug, Clone, Copy)]
pub struct AuthAccount(pub i64);

#[async_trait]
impl FromRequestParts<AppState> for AuthAccount {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, Self::Rejection> {
        match session_status(parts) {
            SessionStatus::Active { account_id, .. } => Ok(AuthAccount(account_id)),
            SessionStatus::Expired => Err(ApiError::from(SessionError::Expired)),
            SessionStatus::Missing => Err(ApiError::from(SessionError::NotFound)),
        }
    }
}

/// Id of the logged-in account for page handlers; redirects to the login page
#[derive(Debug, Clone, Copy)]
pub struct PageAccount(pub i64);

#[async_trait]
impl FromRequestParts<AppState> for PageAccount {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, Self::Rejection> {
        match session_status(parts) {
            SessionStatus::Active { account_id, .. } => Ok(PageAccount(account_id)),
            SessionStatus::Expired => Err(Redirect::to("/login?redirectReason=tknExp")),
            SessionStatus::Missing => Err(Redirect::to("/login?redirectReason=noTkn")),
        }
    }
}

/// Token of the current session, if one is active
#[derive(Debug, Clone)]
pub struct CurrentToken(pub Option<String>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentToken {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, Self::Rejection> {
        match session_status(parts) {
            SessionStatus::Active { token, .. } => Ok(CurrentToken(Some(token))),
            _ => Ok(CurrentToken(token_from_headers(&parts.headers))),
        }
    }
}
