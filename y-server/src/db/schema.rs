/// SQL schema for the Y database
/// Rows are never removed by the application: every content table carries a
/// nullable `deleted_at` that user-facing queries filter on.
pub const SCHEMA: &str = r#"
-- Images (blobs referenced by accounts and posts)
CREATE TABLE IF NOT EXISTS images (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    data BLOB NOT NULL,
    name TEXT NOT NULL,
    mimetype TEXT NOT NULL,
    created_at TEXT NOT NULL,
    deleted_at TEXT
);

-- Accounts
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL CHECK(length(username) <= 32),
    password_hash TEXT NOT NULL,
    first_name TEXT NOT NULL CHECK(length(first_name) <= 32),
    last_name TEXT NOT NULL CHECK(length(last_name) <= 32),
    bio TEXT CHECK(bio IS NULL OR length(bio) <= 400),
    profile_image_id INTEGER REFERENCES images(id),
    cover_image_id INTEGER REFERENCES images(id),
    is_public INTEGER NOT NULL DEFAULT 0,
    friend_code TEXT NOT NULL CHECK(length(friend_code) = 8),
    created_at TEXT NOT NULL,
    deleted_at TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_accounts_friend_code ON accounts(friend_code);
CREATE UNIQUE INDEX IF NOT EXISTS idx_accounts_username ON accounts(username);

-- Directed relationship edges (friend requests, friendships, blocks)
CREATE TABLE IF NOT EXISTS relationships (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_acc_id INTEGER NOT NULL REFERENCES accounts(id),
    second_acc_id INTEGER NOT NULL REFERENCES accounts(id),
    confirmed_relation INTEGER NOT NULL DEFAULT 0,
    is_friend_relation INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    deleted_at TEXT,
    CHECK(first_acc_id != second_acc_id)
);

-- At most one live edge per ordered pair
CREATE UNIQUE INDEX IF NOT EXISTS idx_relationships_live_pair
    ON relationships(first_acc_id, second_acc_id) WHERE deleted_at IS NULL;
CREATE INDEX IF NOT EXISTS idx_relationships_second ON relationships(second_acc_id);

-- Posts on a timeline
CREATE TABLE IF NOT EXISTS posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    poster_id INTEGER NOT NULL REFERENCES accounts(id),
    posted_on_id INTEGER NOT NULL REFERENCES accounts(id),
    text_content TEXT CHECK(text_content IS NULL OR length(text_content) <= 400),
    shared_post_id INTEGER REFERENCES posts(id),
    associated_image_id INTEGER REFERENCES images(id),
    created_at TEXT NOT NULL,
    edited_at TEXT,
    deleted_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_posts_posted_on ON posts(posted_on_id, id DESC);

-- Replies to posts
CREATE TABLE IF NOT EXISTS replies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    responding_to INTEGER NOT NULL REFERENCES posts(id),
    poster_id INTEGER NOT NULL REFERENCES accounts(id),
    text_content TEXT NOT NULL CHECK(length(text_content) <= 400),
    created_at TEXT NOT NULL,
    edited_at TEXT,
    deleted_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_replies_post ON replies(responding_to);

-- Reactions to posts
CREATE TABLE IF NOT EXISTS reactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    responding_to INTEGER NOT NULL REFERENCES posts(id),
    poster_id INTEGER NOT NULL REFERENCES accounts(id),
    reaction_type INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    deleted_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_reactions_post ON reactions(responding_to);

-- Login sessions
CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY,
    account_id INTEGER NOT NULL REFERENCES accounts(id),
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sessions_account_id ON sessions(account_id);
CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
"#;

/// Tables that carry a `deleted_at` column, in audit display order
pub const SOFT_DELETE_TABLES: &[&str] = &[
    "accounts",
    "relationships",
    "posts",
    "replies",
    "reactions",
    "images",
];
