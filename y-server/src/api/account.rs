use axum::{
    extract::{rejection::FormRejection, Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Form, Json,
};

use y_types::{
    Account, DeleteAccountRequest, ImageSlot, SessionResponse, UpdateBioRequest,
    UpdatePasswordRequest, UpdateVisibilityRequest,
};

use crate::db::repositories::{
    now, AccountRepository, ImageRepository, NewAccount, NewImage, RelationshipRepository,
};
use crate::images::{validate_image, MultipartForm};
use crate::middleware::AuthAccount;
use crate::password::{hash_password_task, verify_password_task};
use crate::session::clear_cookie;
use crate::state::AppState;

use super::{check_name_len, check_text_len, form_payload, ApiError, ApiResult, INVALID_REQUEST};

const ACCOUNT_GONE: &str = "Your account does not exist.";

/// Validated profile/cover uploads found in a multipart form
fn account_images(
    form: &MultipartForm,
    max_bytes: usize,
) -> ApiResult<Vec<(ImageSlot, NewImage)>> {
    let mut images = Vec::new();
    for slot in [ImageSlot::Profile, ImageSlot::Cover] {
        if let Some(file) = form.single_file(slot.field_name())? {
            images.push((slot, validate_image(file, max_bytes, None)?));
        }
    }
    Ok(images)
}

fn required<'a>(form: &'a MultipartForm, name: &str) -> ApiResult<&'a str> {
    form.text(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(INVALID_REQUEST.to_string()))
}

/// POST /api/account - Register and log in
pub async fn create_account(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Response> {
    let form = MultipartForm::read(multipart).await?;

    let username = required(&form, "username")?;
    let password = form
        .text("password")
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest(INVALID_REQUEST.to_string()))?;
    let first_name = required(&form, "fName")?;
    let last_name = required(&form, "lName")?;
    let bio = form.text("bio").map(str::trim).filter(|b| !b.is_empty());
    let is_public = form.text("public") == Some("public");

    check_name_len(username, "Username")?;
    check_name_len(first_name, "First name")?;
    check_name_len(last_name, "Last name")?;
    if let Some(bio) = bio {
        check_text_len(bio, "Bio")?;
    }

    let images = account_images(&form, state.options.max_image_bytes)?;
    let password_hash =
        hash_password_task(password.to_string(), state.options.bcrypt_cost).await?;

    let (account, token) = state.db.with_transaction(|tx| -> ApiResult<(Account, String)> {
        let accounts = AccountRepository::new(tx);
        if accounts.username_taken(username)? {
            return Err(ApiError::BadRequest(
                "An account already exists with that user name.".to_string(),
            ));
        }

        let image_repo = ImageRepository::new(tx);
        let mut new_account = NewAccount {
            username: username.to_string(),
            password_hash: password_hash.clone(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            bio: bio.map(str::to_string),
            is_public,
            profile_image_id: None,
            cover_image_id: None,
        };
        for (slot, image) in &images {
            let id = image_repo.create(image)?;
            match slot {
                ImageSlot::Profile => new_account.profile_image_id = Some(id),
                ImageSlot::Cover => new_account.cover_image_id = Some(id),
            }
        }

        let account = accounts.create(&new_account)?;
        let token = state.session_manager.create_session(tx, account.id)?;
        Ok((account, token))
    })?;

    tracing::info!("Created account {} ({})", account.id, account.username);
    let cookie = state.session_manager.session_cookie(&token);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse::for_account(account.id)),
    )
        .into_response())
}

/// GET /api/account - The logged-in account
pub async fn get_account(
    State(state): State<AppState>,
    AuthAccount(account_id): AuthAccount,
) -> ApiResult<Json<Account>> {
    let account = state
        .db
        .with_connection(|conn| -> ApiResult<Option<Account>> {
            Ok(AccountRepository::new(conn).get_by_id(account_id)?)
        })?
        .ok_or_else(|| ApiError::NotFound(ACCOUNT_GONE.to_string()))?;

    Ok(Json(account))
}

/// DELETE /api/account - Soft-delete the logged-in account after a password check
pub async fn delete_account(
    State(state): State<AppState>,
    AuthAccount(account_id): AuthAccount,
    payload: Result<Form<DeleteAccountRequest>, FormRejection>,
) -> ApiResult<Response> {
    let request = form_payload(payload)?;
    let password = request
        .password
        .ok_or_else(|| ApiError::BadRequest("Password required.".to_string()))?;

    let hash = state
        .db
        .with_connection(|conn| -> ApiResult<Option<String>> {
            Ok(AccountRepository::new(conn).password_hash(account_id)?)
        })?
        .ok_or_else(|| ApiError::NotFound(ACCOUNT_GONE.to_string()))?;
    if !verify_password_task(password, hash).await? {
        return Err(ApiError::BadRequest(
            "The password you entered is incorrect.".to_string(),
        ));
    }

    state.db.with_transaction(|tx| -> ApiResult<()> {
        let accounts = AccountRepository::new(tx);
        let at = now();
        accounts.soft_delete(account_id, &at)?;
        let edges = RelationshipRepository::new(tx).soft_delete_all_for(account_id, &at)?;
        state.session_manager.delete_sessions_for(tx, account_id)?;
        tracing::info!(
            "Deleted account {} and {} relationship edges",
            account_id,
            edges
        );
        Ok(())
    })?;

    Ok(([(header::SET_COOKIE, clear_cookie())], "Done").into_response())
}

/// POST /api/account/updateBio
pub async fn update_bio(
    State(state): State<AppState>,
    AuthAccount(account_id): AuthAccount,
    payload: Result<Form<UpdateBioRequest>, FormRejection>,
) -> ApiResult<&'static str> {
    let request = form_payload(payload)?;
    let bio = request
        .new_bio
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty());
    if let Some(bio) = bio {
        check_text_len(bio, "Bio")?;
    }

    state.db.with_transaction(|tx| -> ApiResult<()> {
        let accounts = AccountRepository::new(tx);
        if accounts.get_by_id(account_id)?.is_none() {
            return Err(ApiError::NotFound(ACCOUNT_GONE.to_string()));
        }
        accounts.update_bio(account_id, bio)?;
        Ok(())
    })?;

    Ok("Okay")
}

/// POST /api/account/updateImages - Replace profile and/or cover image
pub async fn update_images(
    State(state): State<AppState>,
    AuthAccount(account_id): AuthAccount,
    multipart: Multipart,
) -> ApiResult<&'static str> {
    let form = MultipartForm::read(multipart).await?;
    let images = account_images(&form, state.options.max_image_bytes)?;

    state.db.with_transaction(|tx| -> ApiResult<()> {
        let accounts = AccountRepository::new(tx);
        if accounts.get_by_id(account_id)?.is_none() {
            return Err(ApiError::NotFound(ACCOUNT_GONE.to_string()));
        }
        let image_repo = ImageRepository::new(tx);
        for (slot, image) in &images {
            let image_id = image_repo.create(image)?;
            accounts.set_image(account_id, *slot, image_id)?;
        }
        Ok(())
    })?;

    Ok("Okay")
}

/// POST /api/account/updatePassword
pub async fn update_password(
    State(state): State<AppState>,
    AuthAccount(account_id): AuthAccount,
    payload: Result<Form<UpdatePasswordRequest>, FormRejection>,
) -> ApiResult<&'static str> {
    let request = form_payload(payload)?;
    let (current, new) = match (request.current_password, request.new_password) {
        (Some(current), Some(new)) if !new.is_empty() => (current, new),
        _ => return Err(ApiError::BadRequest("Incorrect arguments.".to_string())),
    };

    let stored = state
        .db
        .with_connection(|conn| -> ApiResult<Option<String>> {
            Ok(AccountRepository::new(conn).password_hash(account_id)?)
        })?
        .ok_or_else(|| ApiError::NotFound(ACCOUNT_GONE.to_string()))?;
    if !verify_password_task(current, stored).await? {
        return Err(ApiError::BadRequest(
            "The password you entered is incorrect.".to_string(),
        ));
    }

    let new_hash = hash_password_task(new, state.options.bcrypt_cost).await?;
    state.db.with_transaction(|tx| -> ApiResult<()> {
        AccountRepository::new(tx).update_password_hash(account_id, &new_hash)?;
        Ok(())
    })?;

    tracing::info!("Account {} changed its password", account_id);
    Ok("Okay")
}

/// POST /api/account/updateVisibility - `public` of "public" or "true" makes the account public
pub async fn update_visibility(
    State(state): State<AppState>,
    AuthAccount(account_id): AuthAccount,
    payload: Result<Form<UpdateVisibilityRequest>, FormRejection>,
) -> ApiResult<&'static str> {
    let request = form_payload(payload)?;
    let is_public = matches!(request.public.as_deref(), Some("public") | Some("true"));

    state.db.with_transaction(|tx| -> ApiResult<()> {
        let accounts = AccountRepository::new(tx);
        if accounts.get_by_id(account_id)?.is_none() {
            return Err(ApiError::NotFound(ACCOUNT_GONE.to_string()));
        }
        accounts.set_visibility(account_id, is_public)?;
        Ok(())
    })?;

    Ok("Okay")
}
