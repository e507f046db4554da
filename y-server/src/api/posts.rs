use axum::{
    extract::{rejection::FormRejection, Multipart, Path, State},
    Form, Json,
};
use rusqlite::Connection;

use y_types::{
    Account, CreateReactionRequest, CreateReplyRequest, CreatedResponse, EditContentRequest, Post,
    Reply,
};

use crate::db::repositories::{
    now, AccountRepository, CascadeCounts, ImageRepository, NewPost, PostRepository, ReactionRepository,
    ReplyRepository,
};
use crate::images::{validate_image, MultipartForm, POST_IMAGE_MIMETYPES};
use crate::middleware::AuthAccount;
use crate::permission::{check_content_permission, creation_denial};
use crate::state::AppState;

use super::{
    check_text_len, form_payload, parse_id, parse_optional_id, ApiError, ApiResult,
    INVALID_REQUEST,
};

const NO_PERMISSION: &str = "You lack the permission to perform this action.";

/// Refuse unless `actor_id` may add `action` content to `owner`'s timeline
fn ensure_may_create(conn: &Connection, owner: &Account, actor_id: i64, action: &str) -> ApiResult<()> {
    let permission = check_content_permission(conn, owner, actor_id)?;
    match creation_denial(permission, action) {
        Some(message) => Err(ApiError::BadRequest(message)),
        None => Ok(()),
    }
}

/// The live post `post_id` together with its live timeline owner
fn live_post_and_owner(conn: &Connection, post_id: i64, gone: &str) -> ApiResult<(Post, Account)> {
    let post = PostRepository::new(conn)
        .get(post_id)?
        .ok_or_else(|| ApiError::BadRequest(gone.to_string()))?;
    let owner = AccountRepository::new(conn)
        .get_by_id(post.posted_on_id)?
        .ok_or_else(|| ApiError::BadRequest(gone.to_string()))?;
    Ok((post, owner))
}

/// Whether `actor_id` may remove content under `post_id`: its author or the
/// owner of the timeline it sits on
fn may_moderate(conn: &Connection, post_id: i64, author_id: i64, actor_id: i64) -> ApiResult<bool> {
    if author_id == actor_id {
        return Ok(true);
    }
    let post = PostRepository::new(conn).get_any(post_id)?;
    Ok(post.is_some_and(|p| p.posted_on_id == actor_id))
}

fn required_text(raw: Option<String>) -> ApiResult<String> {
    raw.filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(INVALID_REQUEST.to_string()))
}

/// POST /api/post - Create a post, optionally sharing another post or attaching one image
pub async fn create_post(
    State(state): State<AppState>,
    AuthAccount(account_id): AuthAccount,
    multipart: Multipart,
) -> ApiResult<Json<CreatedResponse>> {
    let form = MultipartForm::read(multipart).await?;

    let text = form
        .text("textContent")
        .filter(|t| !t.trim().is_empty())
        .map(str::to_string);
    let shared_post_id = parse_optional_id(form.text("sharedPostId"))?;
    let posted_on_id = parse_id(form.text("postedOnID"))?;
    let image = match form.single_file("pic")? {
        Some(file) => Some(validate_image(
            file,
            state.options.max_image_bytes,
            Some(POST_IMAGE_MIMETYPES),
        )?),
        None => None,
    };

    // A post needs at least one of text, a shared post or an image
    if text.is_none() && shared_post_id.is_none() && image.is_none() {
        return Err(ApiError::BadRequest(INVALID_REQUEST.to_string()));
    }
    if let Some(text) = &text {
        check_text_len(text, "Post")?;
    }

    let post = state.db.with_transaction(|tx| -> ApiResult<Post> {
        let target = AccountRepository::new(tx)
            .get_by_id(posted_on_id)?
            .ok_or_else(|| ApiError::BadRequest("Can't find that person to post on.".to_string()))?;
        ensure_may_create(tx, &target, account_id, "post")?;

        let posts = PostRepository::new(tx);
        if let Some(shared_id) = shared_post_id {
            if posts.get(shared_id)?.is_none() {
                return Err(ApiError::BadRequest(
                    "The post you are trying to share has been deleted.".to_string(),
                ));
            }
        }

        let associated_image_id = match &image {
            Some(image) => Some(ImageRepository::new(tx).create(image)?),
            None => None,
        };

        Ok(posts.create(&NewPost {
            poster_id: account_id,
            posted_on_id: target.id,
            text_content: text.clone(),
            shared_post_id,
            associated_image_id,
        })?)
    })?;

    tracing::debug!(
        "Account {} posted {} on timeline {}",
        account_id,
        post.id,
        post.posted_on_id
    );
    Ok(Json(CreatedResponse::ok(post.id)))
}

/// POST /api/post/edit/:id - Authors may change their post's text
pub async fn edit_post(
    State(state): State<AppState>,
    AuthAccount(account_id): AuthAccount,
    Path(post_id): Path<i64>,
    payload: Result<Form<EditContentRequest>, FormRejection>,
) -> ApiResult<&'static str> {
    let text = form_payload(payload)?
        .text_content
        .ok_or_else(|| ApiError::BadRequest(INVALID_REQUEST.to_string()))?;
    check_text_len(&text, "Post")?;

    state.db.with_transaction(|tx| -> ApiResult<()> {
        let posts = PostRepository::new(tx);
        posts
            .get(post_id)?
            .filter(|p| p.poster_id == account_id)
            .ok_or_else(|| ApiError::NotFound("Unable to find that post".to_string()))?;
        posts.update_text(post_id, Some(&text), &now())?;
        Ok(())
    })?;

    Ok("OK")
}

/// DELETE /api/post/:id - Soft-delete a post with its replies and reactions
pub async fn delete_post(
    State(state): State<AppState>,
    AuthAccount(account_id): AuthAccount,
    Path(post_id): Path<i64>,
) -> ApiResult<&'static str> {
    let counts = state.db.with_transaction(|tx| -> ApiResult<CascadeCounts> {
        let posts = PostRepository::new(tx);
        let post = posts
            .get(post_id)?
            .ok_or_else(|| ApiError::NotFound("Unable to find the post to delete.".to_string()))?;
        if post.poster_id != account_id && post.posted_on_id != account_id {
            return Err(ApiError::Unauthorized(NO_PERMISSION.to_string()));
        }
        Ok(posts.soft_delete_cascade(post_id, &now())?)
    })?;

    tracing::debug!(
        "Deleted post {} with {} replies and {} reactions",
        post_id,
        counts.replies,
        counts.reactions
    );
    Ok("Done")
}

/// POST /api/reply
pub async fn create_reply(
    State(state): State<AppState>,
    AuthAccount(account_id): AuthAccount,
    payload: Result<Form<CreateReplyRequest>, FormRejection>,
) -> ApiResult<Json<CreatedResponse>> {
    let request = form_payload(payload)?;
    let text = required_text(request.text_content)?;
    let post_id = parse_id(request.resp_to.as_deref())?;
    check_text_len(&text, "Reply")?;

    let reply = state.db.with_transaction(|tx| -> ApiResult<Reply> {
        let (post, owner) = live_post_and_owner(
            tx,
            post_id,
            "The post you are trying to respond to has been deleted.",
        )?;
        ensure_may_create(tx, &owner, account_id, "reply")?;
        Ok(ReplyRepository::new(tx).create(post.id, account_id, &text)?)
    })?;

    Ok(Json(CreatedResponse::ok(reply.id)))
}

/// POST /api/reply/edit/:id
pub async fn edit_reply(
    State(state): State<AppState>,
    AuthAccount(account_id): AuthAccount,
    Path(reply_id): Path<i64>,
    payload: Result<Form<EditContentRequest>, FormRejection>,
) -> ApiResult<&'static str> {
    let text = required_text(form_payload(payload)?.text_content)?;
    check_text_len(&text, "Reply")?;

    state.db.with_transaction(|tx| -> ApiResult<()> {
        let replies = ReplyRepository::new(tx);
        replies
            .get(reply_id)?
            .filter(|r| r.poster_id == account_id)
            .ok_or_else(|| ApiError::NotFound("Unable to find that reply".to_string()))?;
        replies.update_text(reply_id, &text, &now())?;
        Ok(())
    })?;

    Ok("OK")
}

/// DELETE /api/reply/:id - The reply's author or the timeline owner may delete it
pub async fn delete_reply(
    State(state): State<AppState>,
    AuthAccount(account_id): AuthAccount,
    Path(reply_id): Path<i64>,
) -> ApiResult<&'static str> {
    state.db.with_transaction(|tx| -> ApiResult<()> {
        let replies = ReplyRepository::new(tx);
        let reply = replies
            .get(reply_id)?
            .ok_or_else(|| ApiError::NotFound("Unable to find reply to delete.".to_string()))?;
        if !may_moderate(tx, reply.responding_to, reply.poster_id, account_id)? {
            return Err(ApiError::Unauthorized(NO_PERMISSION.to_string()));
        }
        replies.soft_delete(reply_id, &now())?;
        Ok(())
    })?;

    Ok("Done")
}

/// POST /api/reaction - React to a post.
///
/// Reacting twice keeps the first reaction; reacting again after withdrawing
/// brings the old reaction back.
pub async fn create_reaction(
    State(state): State<AppState>,
    AuthAccount(account_id): AuthAccount,
    payload: Result<Form<CreateReactionRequest>, FormRejection>,
) -> ApiResult<Json<CreatedResponse>> {
    let request = form_payload(payload)?;
    let reaction_type = parse_id(request.reaction_type.as_deref())?;
    let post_id = parse_id(request.resp_to.as_deref())?;

    let reaction_id = state.db.with_transaction(|tx| -> ApiResult<i64> {
        let (post, owner) = live_post_and_owner(
            tx,
            post_id,
            "The post you are trying to react to has been deleted.",
        )?;
        ensure_may_create(tx, &owner, account_id, "react")?;

        let reactions = ReactionRepository::new(tx);
        if let Some(existing) = reactions.live_by_poster(post.id, account_id)? {
            return Ok(existing.id);
        }
        if let Some(withdrawn) = reactions.latest_deleted_by_poster(post.id, account_id)? {
            reactions.restore(withdrawn.id, reaction_type)?;
            return Ok(withdrawn.id);
        }
        Ok(reactions.create(post.id, account_id, reaction_type)?.id)
    })?;

    Ok(Json(CreatedResponse::ok(reaction_id)))
}

/// DELETE /api/reaction/:id
pub async fn delete_reaction(
    State(state): State<AppState>,
    AuthAccount(account_id): AuthAccount,
    Path(reaction_id): Path<i64>,
) -> ApiResult<&'static str> {
    state.db.with_transaction(|tx| -> ApiResult<()> {
        let reactions = ReactionRepository::new(tx);
        let reaction = reactions
            .get(reaction_id)?
            .ok_or_else(|| ApiError::NotFound("Unable to find reaction to delete.".to_string()))?;
        if !may_moderate(tx, reaction.responding_to, reaction.poster_id, account_id)? {
            return Err(ApiError::Unauthorized(NO_PERMISSION.to_string()));
        }
        reactions.soft_delete(reaction_id, &now())?;
        Ok(())
    })?;

    Ok("Done")
}
