use anyhow::Result;
use rusqlite::Connection;

use y_types::{Account, ContentPermission};

use crate::db::repositories::RelationshipRepository;

/// Decide whether `actor_id` may add posts, replies or reactions to
/// `target`'s timeline.
///
/// Owners may always post on their own timeline. A private timeline is
/// closed to everyone else; a public one is open to confirmed friends.
pub fn check_content_permission(
    conn: &Connection,
    target: &Account,
    actor_id: i64,
) -> Result<ContentPermission> {
    if target.id == actor_id {
        return Ok(ContentPermission::Allowed);
    }
    if target.is_deleted() {
        return Ok(ContentPermission::NotFriends);
    }
    if !target.is_public {
        return Ok(ContentPermission::TargetPrivate);
    }

    let edge = RelationshipRepository::new(conn).live_edge(target.id, actor_id)?;
    if edge.is_some_and(|e| e.is_confirmed_friend()) {
        Ok(ContentPermission::Allowed)
    } else {
        Ok(ContentPermission::NotFriends)
    }
}

/// Message explaining why `action` ("post", "reply", "react") was refused,
/// or `None` when it is allowed
pub fn creation_denial(permission: ContentPermission, action: &str) -> Option<String> {
    match permission {
        ContentPermission::Allowed => None,
        ContentPermission::TargetPrivate => {
            Some(format!("You do not have permission to {} right now.", action))
        }
        // No full stop on the post message
        ContentPermission::NotFriends if action == "post" => {
            Some("You are not friends. You cannot post".to_string())
        }
        ContentPermission::NotFriends => {
            Some(format!("You are not friends. You cannot {}.", action))
        }
    }
}

/// Message shown when a timeline page is refused
pub fn denial_message(permission: ContentPermission) -> &'static str {
    match permission {
        ContentPermission::Allowed => "",
        ContentPermission::TargetPrivate => "Profile is private.",
        ContentPermission::NotFriends => "You are not friends.",
    }
}
