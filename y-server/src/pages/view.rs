use std::collections::BTreeSet;

use anyhow::Result;
use rusqlite::Connection;

use y_types::{Account, Post, PostableMap, SharedPostPreview, TimelineEntry};

use crate::db::repositories::{
    AccountRepository, PostRepository, ReactionRepository, RelationshipRepository, ReplyRepository,
};

/// Everything a profile or timeline page shows
#[derive(Debug, Clone)]
pub struct ProfileView {
    /// Whose timeline this is
    pub owner: Account,
    /// Who is looking at it
    pub viewer: Account,
    pub friends: Vec<Account>,
    pub timeline: Vec<TimelineEntry>,
    pub postable: PostableMap,
}

impl ProfileView {
    pub fn is_own_profile(&self) -> bool {
        self.owner.id == self.viewer.id
    }
}

#[derive(Debug, Clone)]
pub struct FriendsView {
    pub account: Account,
    pub friends: Vec<Account>,
    pub pending: Vec<Account>,
    pub outgoing: Vec<Account>,
    pub blocked: Vec<Account>,
}

/// Build `viewer`'s view of `owner`'s timeline.
///
/// Callers check content permission first; this only assembles data.
pub fn profile_view(conn: &Connection, owner: &Account, viewer: &Account) -> Result<ProfileView> {
    let accounts = AccountRepository::new(conn);
    let friends = accounts.friends_of(owner.id)?;

    // Shared posts are always visible on one's own profile
    let viewer_friends = if owner.id == viewer.id {
        None
    } else {
        Some(RelationshipRepository::new(conn).friend_ids(viewer.id)?)
    };

    let posts = PostRepository::new(conn).timeline(owner.id)?;
    let timeline = process_timeline(conn, posts, viewer.id, viewer_friends.as_deref())?;
    let postable = postable_map(conn, owner, &friends, &timeline)?;

    Ok(ProfileView {
        owner: owner.clone(),
        viewer: viewer.clone(),
        friends,
        timeline,
        postable,
    })
}

pub fn friends_view(conn: &Connection, account: &Account) -> Result<FriendsView> {
    let accounts = AccountRepository::new(conn);
    Ok(FriendsView {
        account: account.clone(),
        friends: accounts.friends_of(account.id)?,
        pending: accounts.pending_requests_for(account.id)?,
        outgoing: accounts.outgoing_requests_of(account.id)?,
        blocked: accounts.blocked_by(account.id)?,
    })
}

/// Attach live replies, reactions and the shared-post preview to each post.
///
/// `viewer_friends` is `None` when the viewer is on their own profile.
pub fn process_timeline(
    conn: &Connection,
    posts: Vec<Post>,
    viewer_id: i64,
    viewer_friends: Option<&[i64]>,
) -> Result<Vec<TimelineEntry>> {
    let replies = ReplyRepository::new(conn);
    let reactions = ReactionRepository::new(conn);
    let post_repo = PostRepository::new(conn);

    let mut entries = Vec::with_capacity(posts.len());
    for post in posts {
        let post_replies = replies.live_for_post(post.id)?;
        let post_reactions = reactions.live_for_post(post.id)?;
        let user_reaction_id = post_reactions
            .iter()
            .find(|r| r.poster_id == viewer_id)
            .map(|r| r.id);

        let shared_post = match post.shared_post_id {
            Some(shared_id) => post_repo
                .get(shared_id)?
                .filter(|shared| {
                    post.poster_id == viewer_id
                        || shared.poster_id == viewer_id
                        || viewer_friends.map_or(true, |ids| ids.contains(&shared.poster_id))
                })
                .map(|shared| SharedPostPreview {
                    id: shared.id,
                    text_content: shared.text_content,
                    image_id: shared.associated_image_id,
                    posted_on_id: shared.posted_on_id,
                    created_at: shared.created_at,
                }),
            None => None,
        };

        entries.push(TimelineEntry {
            num_likes: post_reactions.len(),
            user_reacted: user_reaction_id.is_some(),
            user_reaction_id,
            replies: post_replies,
            reactions: post_reactions,
            shared_post,
            post,
        });
    }
    Ok(entries)
}

/// Names and avatars for the owner, the owner's friends, and anyone else who
/// wrote something on the rendered timeline
pub fn postable_map(
    conn: &Connection,
    owner: &Account,
    friends: &[Account],
    timeline: &[TimelineEntry],
) -> Result<PostableMap> {
    let mut postable = PostableMap::new();
    postable.insert(owner.id, owner.postable_entry());
    for friend in friends {
        postable.insert(friend.id, friend.postable_entry());
    }

    let authors = timeline.iter().flat_map(|entry| {
        std::iter::once(entry.post.poster_id).chain(entry.replies.iter().map(|r| r.poster_id))
    });
    let missing: BTreeSet<i64> = authors.filter(|id| !postable.contains_key(id)).collect();

    // Former friends and deleted accounts keep their names on old posts
    let accounts = AccountRepository::new(conn);
    for id in missing {
        if let Some(account) = accounts.get_by_id_any(id)? {
            postable.insert(id, account.postable_entry());
        }
    }
    Ok(postable)
}
