//! Friend request and block transitions between two accounts.
//!
//! Every function here expects to run inside one immediate transaction so
//! the checks and the writes that follow them see the same state.

use rusqlite::Connection;
use thiserror::Error;

use y_types::RelationshipStatus;

use crate::db::repositories::{now, RelationshipRepository};

#[derive(Debug, Error)]
pub enum FriendshipError {
    #[error("You entered your Friend Code. You need someone else's to be friends")]
    OwnCode,

    #[error("You can't do that to your own account.")]
    SelfTarget,

    #[error("You already sent this user a friend request in the past.")]
    AlreadyRequested,

    #[error("You are already friends with this user.")]
    AlreadyFriends,

    #[error("You have blocked this user. Unblock them first.")]
    YouBlocked,

    #[error("The user you are trying to friend has blocked you.")]
    BlockedByTarget,

    #[error("There is no pending friend request from this user.")]
    NoPendingRequest,

    #[error("You are not friends with this user.")]
    NotFriends,

    #[error("You have already blocked this user.")]
    AlreadyBlocked,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type FriendshipResult<T> = Result<T, FriendshipError>;

/// What sending a friend request ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// A new pending request was recorded
    Requested,
    /// The target had already asked, so the two are now friends
    Accepted,
}

/// Ask `target_id` to be friends with `actor_id`.
///
/// When `target_id` already has a pending request towards `actor_id`,
/// that request is accepted instead of creating a second one.
pub fn send_request(
    conn: &Connection,
    actor_id: i64,
    target_id: i64,
) -> FriendshipResult<SendOutcome> {
    if actor_id == target_id {
        return Err(FriendshipError::OwnCode);
    }
    let edges = RelationshipRepository::new(conn);

    if let Some(edge) = edges.live_edge(actor_id, target_id)? {
        return Err(if edge.is_block() {
            FriendshipError::YouBlocked
        } else if edge.confirmed_relation {
            FriendshipError::AlreadyFriends
        } else {
            FriendshipError::AlreadyRequested
        });
    }

    match edges.live_edge(target_id, actor_id)? {
        Some(edge) if edge.is_block() => Err(FriendshipError::BlockedByTarget),
        Some(edge) => {
            edges.confirm(edge.id)?;
            edges.insert(actor_id, target_id, true, true)?;
            tracing::info!("Accounts {} and {} are now friends", actor_id, target_id);
            Ok(SendOutcome::Accepted)
        }
        None => {
            edges.insert(actor_id, target_id, true, false)?;
            tracing::debug!("Account {} sent a friend request to {}", actor_id, target_id);
            Ok(SendOutcome::Requested)
        }
    }
}

/// Accept the pending request `requester_id` sent to `actor_id`
pub fn accept_request(conn: &Connection, actor_id: i64, requester_id: i64) -> FriendshipResult<()> {
    if actor_id == requester_id {
        return Err(FriendshipError::SelfTarget);
    }
    let edges = RelationshipRepository::new(conn);

    let request = edges
        .live_edge(requester_id, actor_id)?
        .filter(|edge| edge.is_pending())
        .ok_or(FriendshipError::NoPendingRequest)?;

    edges.confirm(request.id)?;
    edges.insert(actor_id, requester_id, true, true)?;
    tracing::info!("Accounts {} and {} are now friends", actor_id, requester_id);
    Ok(())
}

/// Turn down the pending request `requester_id` sent to `actor_id`
pub fn decline_request(
    conn: &Connection,
    actor_id: i64,
    requester_id: i64,
) -> FriendshipResult<()> {
    let edges = RelationshipRepository::new(conn);

    let request = edges
        .live_edge(requester_id, actor_id)?
        .filter(|edge| edge.is_pending())
        .ok_or(FriendshipError::NoPendingRequest)?;

    edges.soft_delete(request.id, &now())?;
    Ok(())
}

/// End a confirmed friendship from either side
pub fn remove_friend(conn: &Connection, actor_id: i64, friend_id: i64) -> FriendshipResult<()> {
    if actor_id == friend_id {
        return Err(FriendshipError::SelfTarget);
    }
    let edges = RelationshipRepository::new(conn);

    let forward = edges.live_edge(actor_id, friend_id)?;
    let backward = edges.live_edge(friend_id, actor_id)?;
    let are_friends = forward.is_some_and(|e| e.is_confirmed_friend())
        && backward.is_some_and(|e| e.is_confirmed_friend());
    if !are_friends {
        return Err(FriendshipError::NotFriends);
    }

    edges.soft_delete_friend_edges(actor_id, friend_id, &now())?;
    tracing::info!("Accounts {} and {} are no longer friends", actor_id, friend_id);
    Ok(())
}

/// Block `target_id`, ending any friendship or pending request between the two
pub fn block(conn: &Connection, actor_id: i64, target_id: i64) -> FriendshipResult<()> {
    if actor_id == target_id {
        return Err(FriendshipError::SelfTarget);
    }
    let edges = RelationshipRepository::new(conn);

    if edges
        .live_edge(actor_id, target_id)?
        .is_some_and(|e| e.is_block())
    {
        return Err(FriendshipError::AlreadyBlocked);
    }

    edges.soft_delete_friend_edges(actor_id, target_id, &now())?;
    edges.insert(actor_id, target_id, false, false)?;
    tracing::info!("Account {} blocked {}", actor_id, target_id);
    Ok(())
}

/// Lift a block; a missing block is not an error
pub fn unblock(conn: &Connection, actor_id: i64, target_id: i64) -> FriendshipResult<()> {
    let edges = RelationshipRepository::new(conn);

    if let Some(edge) = edges.live_edge(actor_id, target_id)? {
        if edge.is_block() {
            edges.soft_delete(edge.id, &now())?;
            tracing::info!("Account {} unblocked {}", actor_id, target_id);
        }
    }
    Ok(())
}

/// The pair's state as seen by `viewer_id`
pub fn relationship_status(
    conn: &Connection,
    viewer_id: i64,
    other_id: i64,
) -> FriendshipResult<RelationshipStatus> {
    if viewer_id == other_id {
        return Ok(RelationshipStatus::Self_);
    }
    let edges = RelationshipRepository::new(conn);
    let forward = edges.live_edge(viewer_id, other_id)?;
    let backward = edges.live_edge(other_id, viewer_id)?;

    let status = match (forward, backward) {
        (Some(f), _) if f.is_block() => RelationshipStatus::Blocked,
        (_, Some(b)) if b.is_block() => RelationshipStatus::BlockedBy,
        (Some(f), Some(b)) if f.is_confirmed_friend() && b.is_confirmed_friend() => {
            RelationshipStatus::Confirmed
        }
        (Some(f), _) if f.is_pending() => RelationshipStatus::PendingOutgoing,
        (_, Some(b)) if b.is_pending() => RelationshipStatus::PendingIncoming,
        _ => RelationshipStatus::None,
    };
    Ok(status)
}
