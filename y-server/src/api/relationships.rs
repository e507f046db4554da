use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use rusqlite::Connection;

use y_types::{Account, FriendCode, FriendCodeRequest, RelationshipResponse};

use crate::db::repositories::AccountRepository;
use crate::friendship::{self, FriendshipResult};
use crate::middleware::AuthAccount;
use crate::state::AppState;

use super::{json_payload, ApiError, ApiResult};

/// Look up the live account a friend code points at
fn resolve(conn: &Connection, code: &FriendCode) -> ApiResult<Account> {
    AccountRepository::new(conn)
        .get_by_friend_code(code)?
        .ok_or_else(|| ApiError::BadRequest("No user found with that Friend Code.".to_string()))
}

fn friend_code(payload: Result<Json<FriendCodeRequest>, JsonRejection>) -> ApiResult<FriendCode> {
    let raw = json_payload(payload)?
        .friend_code
        .ok_or_else(|| ApiError::BadRequest("Need Friend Code of requested friend.".to_string()))?;
    Ok(FriendCode::parse(&raw)?)
}

/// Run one transition against the account behind `code` and report the
/// pair's state afterwards
fn transition<F>(
    state: &AppState,
    actor_id: i64,
    code: FriendCode,
    mut apply: F,
) -> ApiResult<Json<RelationshipResponse>>
where
    F: FnMut(&Connection, i64, i64) -> FriendshipResult<()>,
{
    let status = state.db.with_transaction(|tx| -> ApiResult<_> {
        let target = resolve(tx, &code)?;
        apply(tx, actor_id, target.id)?;
        Ok(friendship::relationship_status(tx, actor_id, target.id)?)
    })?;

    Ok(Json(RelationshipResponse {
        friend_code: code.to_string(),
        status,
    }))
}

/// POST /api/makeFriend
pub async fn make_friend(
    State(state): State<AppState>,
    AuthAccount(account_id): AuthAccount,
    payload: Result<Json<FriendCodeRequest>, JsonRejection>,
) -> ApiResult<Json<RelationshipResponse>> {
    let code = friend_code(payload)?;
    transition(&state, account_id, code, |conn, actor, target| {
        friendship::send_request(conn, actor, target).map(|_| ())
    })
}

/// POST /api/acceptFriend
pub async fn accept_friend(
    State(state): State<AppState>,
    AuthAccount(account_id): AuthAccount,
    payload: Result<Json<FriendCodeRequest>, JsonRejection>,
) -> ApiResult<Json<RelationshipResponse>> {
    let code = friend_code(payload)?;
    transition(&state, account_id, code, friendship::accept_request)
}

/// POST /api/declineFriend
pub async fn decline_friend(
    State(state): State<AppState>,
    AuthAccount(account_id): AuthAccount,
    payload: Result<Json<FriendCodeRequest>, JsonRejection>,
) -> ApiResult<Json<RelationshipResponse>> {
    let code = friend_code(payload)?;
    transition(&state, account_id, code, friendship::decline_request)
}

/// POST /api/removeFriend
pub async fn remove_friend(
    State(state): State<AppState>,
    AuthAccount(account_id): AuthAccount,
    payload: Result<Json<FriendCodeRequest>, JsonRejection>,
) -> ApiResult<Json<RelationshipResponse>> {
    let code = friend_code(payload)?;
    transition(&state, account_id, code, friendship::remove_friend)
}

/// POST /api/blockUser
pub async fn block_user(
    State(state): State<AppState>,
    AuthAccount(account_id): AuthAccount,
    payload: Result<Json<FriendCodeRequest>, JsonRejection>,
) -> ApiResult<Json<RelationshipResponse>> {
    let code = friend_code(payload)?;
    transition(&state, account_id, code, friendship::block)
}

/// POST /api/unblockUser
pub async fn unblock_user(
    State(state): State<AppState>,
    AuthAccount(account_id): AuthAccount,
    payload: Result<Json<FriendCodeRequest>, JsonRejection>,
) -> ApiResult<Json<RelationshipResponse>> {
    let code = friend_code(payload)?;
    transition(&state, account_id, code, friendship::unblock)
}

/// GET /api/relationship/:friend_code
pub async fn get_relationship(
    State(state): State<AppState>,
    AuthAccount(account_id): AuthAccount,
    Path(raw_code): Path<String>,
) -> ApiResult<Json<RelationshipResponse>> {
    let code = FriendCode::parse(&raw_code)?;
    let status = state.db.with_connection(|conn| -> ApiResult<_> {
        let target = resolve(conn, &code)?;
        Ok(friendship::relationship_status(conn, account_id, target.id)?)
    })?;

    Ok(Json(RelationshipResponse {
        friend_code: code.to_string(),
        status,
    }))
}
