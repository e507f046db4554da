use anyhow::{Context, Result};
use rusqlite::Connection;

use super::connection::Database;
use super::repositories::{
    AccountRepository, NewAccount, NewPost, PostRepository, ReactionRepository, ReplyRepository,
};
use crate::friendship;
use crate::password::hash_password;

/// Password shared by every demo account
pub const DEMO_PASSWORD: &str = "password";

/// (username, first name, last name, bio, public)
const DEMO_ACCOUNTS: &[(&str, &str, &str, &str, bool)] = &[
    ("alice", "Alice", "Archer", "Climbing, coffee, and code.", true),
    ("bob", "Bob", "Baker", "Bread enthusiast.", false),
    ("carol", "Carol", "Cooper", "New here!", true),
];

impl Database {
    /// Insert a small demo network: alice and bob are friends, carol has a
    /// pending request to alice, and alice's timeline has a few posts.
    ///
    /// Returns `false` without touching anything when the demo accounts
    /// already exist.
    pub fn seed_demo_data(&self, bcrypt_cost: u32) -> Result<bool> {
        let password_hash = hash_password(DEMO_PASSWORD, bcrypt_cost)?;

        self.with_transaction(|tx| -> Result<bool> {
            if AccountRepository::new(tx).username_taken(DEMO_ACCOUNTS[0].0)? {
                tracing::debug!("Demo accounts already present, skipping seed");
                return Ok(false);
            }
            seed(tx, &password_hash)?;
            Ok(true)
        })
    }
}

fn seed(conn: &Connection, password_hash: &str) -> Result<()> {
    let accounts = AccountRepository::new(conn);
    let mut ids = Vec::with_capacity(DEMO_ACCOUNTS.len());
    for (username, first_name, last_name, bio, is_public) in DEMO_ACCOUNTS {
        let account = accounts.create(&NewAccount {
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            bio: Some(bio.to_string()),
            is_public: *is_public,
            profile_image_id: None,
            cover_image_id: None,
        })?;
        ids.push(account.id);
    }
    let (alice, bob, carol) = (ids[0], ids[1], ids[2]);

    friendship::send_request(conn, alice, bob).context("Failed to seed friend request")?;
    friendship::accept_request(conn, bob, alice).context("Failed to seed friendship")?;
    friendship::send_request(conn, carol, alice).context("Failed to seed pending request")?;

    let posts = PostRepository::new(conn);
    let welcome = posts.create(&NewPost {
        poster_id: alice,
        posted_on_id: alice,
        text_content: Some("Hello, Y! First post.".to_string()),
        shared_post_id: None,
        associated_image_id: None,
    })?;
    posts.create(&NewPost {
        poster_id: bob,
        posted_on_id: alice,
        text_content: Some("Welcome aboard!".to_string()),
        shared_post_id: None,
        associated_image_id: None,
    })?;
    posts.create(&NewPost {
        poster_id: bob,
        posted_on_id: bob,
        text_content: None,
        shared_post_id: Some(welcome.id),
        associated_image_id: None,
    })?;

    ReplyRepository::new(conn).create(welcome.id, bob, "Glad you made it.")?;
    ReactionRepository::new(conn).create(welcome.id, bob, 1)?;

    tracing::info!("Seeded {} demo accounts", ids.len());
    Ok(())
}
