//! Server-rendered browser pages.

pub mod render;
pub mod view;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use y_types::Account;

use crate::api::ApiError;
use crate::db::repositories::AccountRepository;
use crate::db::TransientError;
use crate::middleware::PageAccount;
use crate::permission::{check_content_permission, denial_message};
use crate::state::AppState;

use view::{FriendsView, ProfileView};

/// Why a page could not be shown
#[derive(Debug)]
pub enum PageError {
    Unauthorized(String),
    NotFound(String),
    /// The session points at an account that no longer exists
    LoggedOut,
    Api(ApiError),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                Html(render::error_page("Unauthorized", &message)),
            )
                .into_response(),
            PageError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                Html(render::error_page("Not Found", &message)),
            )
                .into_response(),
            PageError::LoggedOut => Redirect::to("/login?redirectReason=noTkn").into_response(),
            PageError::Api(err) => err.into_response(),
        }
    }
}

impl From<ApiError> for PageError {
    fn from(err: ApiError) -> Self {
        PageError::Api(err)
    }
}

impl From<anyhow::Error> for PageError {
    fn from(err: anyhow::Error) -> Self {
        PageError::Api(err.into())
    }
}

impl From<rusqlite::Error> for PageError {
    fn from(err: rusqlite::Error) -> Self {
        PageError::Api(err.into())
    }
}

impl TransientError for PageError {
    fn is_transient(&self) -> bool {
        matches!(self, PageError::Api(err) if err.is_transient())
    }
}

pub type PageResult<T> = Result<T, PageError>;

fn current_account(conn: &rusqlite::Connection, account_id: i64) -> PageResult<Account> {
    AccountRepository::new(conn)
        .get_by_id(account_id)?
        .ok_or(PageError::LoggedOut)
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(rename = "redirectReason")]
    pub redirect_reason: Option<String>,
}

/// GET /
pub async fn index() -> Redirect {
    Redirect::to("/login")
}

/// GET /login
pub async fn login(Query(query): Query<LoginQuery>) -> Html<String> {
    Html(render::login_page(query.redirect_reason.as_deref()))
}

/// GET /register and /signup
pub async fn register() -> Html<String> {
    Html(render::register_page())
}

/// GET /profile - The logged-in account's own timeline
pub async fn profile(
    State(state): State<AppState>,
    PageAccount(account_id): PageAccount,
) -> PageResult<Html<String>> {
    let view = state.db.with_connection(|conn| -> PageResult<ProfileView> {
        let account = current_account(conn, account_id)?;
        Ok(view::profile_view(conn, &account, &account)?)
    })?;

    Ok(Html(render::profile_page(&view)))
}

/// GET /timeline/:id - Another account's timeline, if the viewer may see it
pub async fn timeline(
    State(state): State<AppState>,
    PageAccount(account_id): PageAccount,
    Path(owner_id): Path<i64>,
) -> PageResult<Response> {
    if owner_id == account_id {
        return Ok(Redirect::to("/profile").into_response());
    }

    let view = state.db.with_connection(|conn| -> PageResult<ProfileView> {
        let viewer = current_account(conn, account_id)?;
        let owner = AccountRepository::new(conn)
            .get_by_id(owner_id)?
            .ok_or_else(|| PageError::NotFound("That account does not exist.".to_string()))?;

        let permission = check_content_permission(conn, &owner, viewer.id)?;
        if !permission.is_allowed() {
            tracing::debug!(
                "Account {} refused timeline {}: {:?}",
                viewer.id,
                owner.id,
                permission
            );
            return Err(PageError::Unauthorized(denial_message(permission).to_string()));
        }
        Ok(view::profile_view(conn, &owner, &viewer)?)
    })?;

    Ok(Html(render::profile_page(&view)).into_response())
}

/// GET /friends
pub async fn friends(
    State(state): State<AppState>,
    PageAccount(account_id): PageAccount,
) -> PageResult<Html<String>> {
    let view = state.db.with_connection(|conn| -> PageResult<FriendsView> {
        let account = current_account(conn, account_id)?;
        Ok(view::friends_view(conn, &account)?)
    })?;

    Ok(Html(render::friends_page(&view)))
}

/// GET /settings
pub async fn settings(
    State(state): State<AppState>,
    PageAccount(account_id): PageAccount,
) -> PageResult<Html<String>> {
    let account = state
        .db
        .with_connection(|conn| -> PageResult<Account> { current_account(conn, account_id) })?;

    Ok(Html(render::settings_page(&account)))
}
