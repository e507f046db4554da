// End-to-end tests driving the full router in memory

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::Duration;
use serde_json::{json, Value};
use tower::ServiceExt;

use y_server::app::router;
use y_server::db::Database;
use y_server::state::{AppState, ServiceOptions};

const BOUNDARY: &str = "y-test-boundary";

struct TestApp {
    router: Router,
    db: Database,
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body should be JSON")
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    fn location(&self) -> Option<&str> {
        self.headers.get(header::LOCATION).and_then(|v| v.to_str().ok())
    }

    /// `name=value` part of the Set-Cookie header
    fn cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }
}

fn setup() -> TestApp {
    let db = Database::in_memory().expect("Failed to create test database");
    let options = ServiceOptions {
        bcrypt_cost: 4,
        ..ServiceOptions::default()
    };
    let state = AppState::new(db.clone(), Duration::minutes(10), options);
    TestApp {
        router: router(state),
        db,
    }
}

/// A file part: (field name, file name, content type, contents)
type FilePart<'a> = (&'a str, &'a str, &'a str, &'a str);

fn multipart_body(fields: &[(&str, &str)], files: &[FilePart<'_>]) -> String {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            BOUNDARY, name, value
        ));
    }
    for (name, file_name, content_type, contents) in files {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n{}\r\n",
            BOUNDARY, name, file_name, content_type, contents
        ));
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));
    body
}

impl TestApp {
    async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        content_type: Option<&str>,
        body: String,
    ) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let request = builder.body(Body::from(body)).unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        Reply {
            status,
            headers,
            body: body.to_vec(),
        }
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Reply {
        self.send(Method::GET, uri, cookie, None, String::new()).await
    }

    async fn post_json(&self, uri: &str, cookie: Option<&str>, body: Value) -> Reply {
        self.send(
            Method::POST,
            uri,
            cookie,
            Some("application/json"),
            body.to_string(),
        )
        .await
    }

    async fn post_form(&self, uri: &str, cookie: &str, body: &str) -> Reply {
        self.send(
            Method::POST,
            uri,
            Some(cookie),
            Some("application/x-www-form-urlencoded"),
            body.to_string(),
        )
        .await
    }

    async fn post_multipart(&self, uri: &str, cookie: Option<&str>, fields: &[(&str, &str)]) -> Reply {
        self.post_multipart_files(uri, cookie, fields, &[]).await
    }

    async fn post_multipart_files(
        &self,
        uri: &str,
        cookie: Option<&str>,
        fields: &[(&str, &str)],
        files: &[FilePart<'_>],
    ) -> Reply {
        self.send(
            Method::POST,
            uri,
            cookie,
            Some(&format!("multipart/form-data; boundary={}", BOUNDARY)),
            multipart_body(fields, files),
        )
        .await
    }

    async fn delete(&self, uri: &str, cookie: &str) -> Reply {
        self.send(Method::DELETE, uri, Some(cookie), None, String::new())
            .await
    }

    /// Register an account and return its id, session cookie and friend code
    async fn register(&self, username: &str, public: bool) -> (i64, String, String) {
        let visibility = if public { "public" } else { "private" };
        let reply = self
            .post_multipart(
                "/api/account",
                None,
                &[
                    ("username", username),
                    ("password", "hunter22"),
                    ("fName", username),
                    ("lName", "Tester"),
                    ("bio", "hello"),
                    ("public", visibility),
                ],
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.text());
        let cookie = reply.cookie().expect("registration should set a cookie");
        let id = reply.json()["accountID"].as_i64().unwrap();

        let account = self.get("/api/account", Some(&cookie)).await.json();
        let code = account["friendCode"].as_str().unwrap().to_string();
        (id, cookie, code)
    }

    async fn befriend(&self, cookie_a: &str, code_a: &str, cookie_b: &str, code_b: &str) {
        let sent = self
            .post_json("/api/makeFriend", Some(cookie_a), json!({ "friendCode": code_b }))
            .await;
        assert_eq!(sent.status, StatusCode::OK, "{}", sent.text());
        let accepted = self
            .post_json("/api/acceptFriend", Some(cookie_b), json!({ "friendCode": code_a }))
            .await;
        assert_eq!(accepted.json()["status"]["type"], "confirmed");
    }

    async fn create_post(&self, cookie: &str, on: i64, text: &str) -> Reply {
        self.post_multipart(
            "/api/post",
            Some(cookie),
            &[("textContent", text), ("postedOnID", &on.to_string())],
        )
        .await
    }

    async fn reply_to(&self, cookie: &str, post_id: i64) -> Reply {
        self.post_form("/api/reply", cookie, &format!("textContent=hey&respTo={}", post_id))
            .await
    }

    async fn react_to(&self, cookie: &str, post_id: i64, reaction_type: i64) -> Reply {
        self.post_form(
            "/api/reaction",
            cookie,
            &format!("reactionType={}&respTo={}", reaction_type, post_id),
        )
        .await
    }

    fn count(&self, sql: &str) -> i64 {
        let conn = self.db.connection().unwrap();
        conn.query_row(sql, [], |row| row.get(0)).unwrap()
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();
    let reply = app.get("/health", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.text(), "OK");
}

#[tokio::test]
async fn test_register_login_logout() {
    let app = setup();
    let (id, cookie, code) = app.register("alice", true).await;
    assert_eq!(code.len(), 8);

    let account = app.get("/api/account", Some(&cookie)).await;
    assert_eq!(account.status, StatusCode::OK);
    assert_eq!(account.json()["id"], id);
    assert_eq!(account.json()["username"], "alice");
    // Authenticated requests re-issue the cookie
    assert!(account.cookie().is_some());

    let wrong = app
        .post_json("/api/login", None, json!({ "username": "alice", "password": "nope" }))
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.json()["message"], "Wrong username or password.");

    let login = app
        .post_json(
            "/api/login",
            None,
            json!({ "username": "alice", "password": "hunter22" }),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.json()["accountID"], id);
    let fresh = login.cookie().unwrap();

    let logout = app
        .send(Method::POST, "/api/logout", Some(&fresh), None, String::new())
        .await;
    assert_eq!(logout.status, StatusCode::OK);
    assert!(logout.headers[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .contains("Max-Age=0"));

    let after = app.get("/api/account", Some(&fresh)).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
    // The registration session is still valid
    assert_eq!(app.get("/api/account", Some(&cookie)).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_duplicate_username_is_rejected() {
    let app = setup();
    app.register("alice", true).await;
    let again = app
        .post_multipart(
            "/api/account",
            None,
            &[
                ("username", "alice"),
                ("password", "x"),
                ("fName", "A"),
                ("lName", "B"),
            ],
        )
        .await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        again.json()["message"],
        "An account already exists with that user name."
    );
}

#[tokio::test]
async fn test_api_requires_session() {
    let app = setup();
    let reply = app.get("/api/account", None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.json()["error"], "Unauthorized");

    let bogus = app
        .get("/api/account", Some("access_token_cookie=not-a-session"))
        .await;
    assert_eq!(bogus.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_friend_request_flow() {
    let app = setup();
    let (_, alice, alice_code) = app.register("alice", true).await;
    let (_, bob, bob_code) = app.register("bob", true).await;

    let sent = app
        .post_json("/api/makeFriend", Some(&alice), json!({ "friendCode": bob_code }))
        .await;
    assert_eq!(sent.json()["status"]["type"], "pending_outgoing");

    let again = app
        .post_json("/api/makeFriend", Some(&alice), json!({ "friendCode": bob_code }))
        .await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);

    let seen_by_bob = app
        .get(&format!("/api/relationship/{}", alice_code), Some(&bob))
        .await;
    assert_eq!(seen_by_bob.json()["status"]["type"], "pending_incoming");

    // Asking back accepts the pending request
    let reciprocal = app
        .post_json("/api/makeFriend", Some(&bob), json!({ "friendCode": alice_code }))
        .await;
    assert_eq!(reciprocal.json()["status"]["type"], "confirmed");
    assert_eq!(
        app.count("SELECT COUNT(*) FROM relationships WHERE deleted_at IS NULL AND confirmed_relation = 1"),
        2
    );

    let blocked = app
        .post_json("/api/blockUser", Some(&bob), json!({ "friendCode": alice_code }))
        .await;
    assert_eq!(blocked.json()["status"]["type"], "blocked");

    let refused = app
        .post_json("/api/makeFriend", Some(&alice), json!({ "friendCode": bob_code }))
        .await;
    assert_eq!(refused.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        refused.json()["message"],
        "The user you are trying to friend has blocked you."
    );

    let unblocked = app
        .post_json("/api/unblockUser", Some(&bob), json!({ "friendCode": alice_code }))
        .await;
    assert_eq!(unblocked.json()["status"]["type"], "none");
}

#[tokio::test]
async fn test_friend_code_errors() {
    let app = setup();
    let (_, alice, alice_code) = app.register("alice", true).await;

    let missing = app.post_json("/api/makeFriend", Some(&alice), json!({})).await;
    assert_eq!(missing.json()["message"], "Need Friend Code of requested friend.");

    let unknown = app
        .post_json("/api/makeFriend", Some(&alice), json!({ "friendCode": "ZZZZ9999" }))
        .await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);

    let own = app
        .post_json(
            "/api/makeFriend",
            Some(&alice),
            json!({ "friendCode": alice_code.to_lowercase() }),
        )
        .await;
    assert_eq!(
        own.json()["message"],
        "You entered your Friend Code. You need someone else's to be friends"
    );
}

#[tokio::test]
async fn test_posting_requires_permission() {
    let app = setup();
    let (alice_id, alice, alice_code) = app.register("alice", true).await;
    let (bob_id, bob, bob_code) = app.register("bob", true).await;
    let (carol_id, _, _) = app.register("carol", false).await;

    let private = app.create_post(&alice, carol_id, "hi carol").await;
    assert_eq!(private.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        private.json()["message"],
        "You do not have permission to post right now."
    );

    let stranger = app.create_post(&alice, bob_id, "hi bob").await;
    assert_eq!(
        stranger.json()["message"],
        "You are not friends. You cannot post"
    );

    let own = app.create_post(&alice, alice_id, "my own wall").await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.json()["message"], "OK");

    app.befriend(&alice, &alice_code, &bob, &bob_code).await;
    let friendly = app.create_post(&alice, bob_id, "hi friend").await;
    assert_eq!(friendly.status, StatusCode::OK, "{}", friendly.text());

    let nothing = app
        .post_multipart(
            "/api/post",
            Some(&alice),
            &[("postedOnID", &bob_id.to_string())],
        )
        .await;
    assert_eq!(nothing.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_post_cascades() {
    let app = setup();
    let (alice_id, alice, alice_code) = app.register("alice", true).await;
    let (_, bob, bob_code) = app.register("bob", true).await;
    app.befriend(&alice, &alice_code, &bob, &bob_code).await;

    let post_id = app.create_post(&alice, alice_id, "soon gone").await.json()["id"]
        .as_i64()
        .unwrap();
    let reply = app
        .post_form("/api/reply", &bob, &format!("textContent=nice&respTo={}", post_id))
        .await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.text());
    let reaction = app
        .post_form("/api/reaction", &bob, &format!("reactionType=1&respTo={}", post_id))
        .await;
    let reaction_id = reaction.json()["id"].as_i64().unwrap();

    // Reacting twice hands back the same reaction
    let twice = app
        .post_form("/api/reaction", &bob, &format!("reactionType=1&respTo={}", post_id))
        .await;
    assert_eq!(twice.json()["id"], reaction_id);

    // Only the author or timeline owner may delete
    let denied = app.delete(&format!("/api/post/{}", post_id), &bob).await;
    assert_eq!(denied.status, StatusCode::UNAUTHORIZED);

    let deleted = app.delete(&format!("/api/post/{}", post_id), &alice).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.text(), "Done");

    assert_eq!(
        app.count("SELECT COUNT(*) FROM replies WHERE deleted_at IS NULL"),
        0
    );
    assert_eq!(
        app.count("SELECT COUNT(*) FROM reactions WHERE deleted_at IS NULL"),
        0
    );
    assert_eq!(app.count("SELECT COUNT(*) FROM replies"), 1);

    let late = app
        .post_form("/api/reply", &bob, &format!("textContent=late&respTo={}", post_id))
        .await;
    assert_eq!(late.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        late.json()["message"],
        "The post you are trying to respond to has been deleted."
    );

    let gone = app.delete(&format!("/api/post/{}", post_id), &alice).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_account_requires_password() {
    let app = setup();
    let (_, alice, _) = app.register("alice", true).await;

    let wrong = app
        .send(
            Method::DELETE,
            "/api/account",
            Some(&alice),
            Some("application/x-www-form-urlencoded"),
            "password=wrong".to_string(),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::BAD_REQUEST);

    let right = app
        .send(
            Method::DELETE,
            "/api/account",
            Some(&alice),
            Some("application/x-www-form-urlencoded"),
            "password=hunter22".to_string(),
        )
        .await;
    assert_eq!(right.status, StatusCode::OK);
    assert_eq!(app.get("/api/account", Some(&alice)).await.status, StatusCode::UNAUTHORIZED);

    let login = app
        .post_json(
            "/api/login",
            None,
            json!({ "username": "alice", "password": "hunter22" }),
        )
        .await;
    assert_eq!(login.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_pages_redirect_without_session() {
    let app = setup();

    let index = app.get("/", None).await;
    assert!(index.status.is_redirection());
    assert_eq!(index.location(), Some("/login"));

    let profile = app.get("/profile", None).await;
    assert!(profile.status.is_redirection());
    assert_eq!(profile.location(), Some("/login?redirectReason=noTkn"));

    let login = app.get("/login?redirectReason=noTkn", None).await;
    assert_eq!(login.status, StatusCode::OK);
    assert!(login.text().contains("Please log in"));

    assert_eq!(app.get("/signup", None).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_expired_session_redirects_with_reason() {
    let app = setup();
    let (_, alice, _) = app.register("alice", true).await;
    app.db
        .connection()
        .unwrap()
        .execute(
            "UPDATE sessions SET expires_at = '2000-01-01T00:00:00.000000Z'",
            [],
        )
        .unwrap();

    let profile = app.get("/profile", Some(&alice)).await;
    assert_eq!(profile.location(), Some("/login?redirectReason=tknExp"));

    let api = app.get("/api/account", Some(&alice)).await;
    assert_eq!(api.status, StatusCode::UNAUTHORIZED);
    assert_eq!(api.json()["message"], "Token has expired");
}

#[tokio::test]
async fn test_timeline_pages() {
    let app = setup();
    let (alice_id, alice, alice_code) = app.register("alice", true).await;
    let (bob_id, bob, bob_code) = app.register("bob", true).await;
    let (carol_id, _, _) = app.register("carol", false).await;

    let own = app.get(&format!("/timeline/{}", alice_id), Some(&alice)).await;
    assert_eq!(own.location(), Some("/profile"));

    let private = app.get(&format!("/timeline/{}", carol_id), Some(&alice)).await;
    assert_eq!(private.status, StatusCode::UNAUTHORIZED);
    assert!(private.text().contains("Profile is private."));

    let stranger = app.get(&format!("/timeline/{}", bob_id), Some(&alice)).await;
    assert_eq!(stranger.status, StatusCode::UNAUTHORIZED);
    assert!(stranger.text().contains("You are not friends."));

    app.befriend(&alice, &alice_code, &bob, &bob_code).await;
    app.create_post(&bob, bob_id, "<b>bold</b> move").await;

    let friend = app.get(&format!("/timeline/{}", bob_id), Some(&alice)).await;
    assert_eq!(friend.status, StatusCode::OK);
    let html = friend.text();
    assert!(html.contains("&lt;b&gt;bold&lt;/b&gt; move"));
    assert!(!html.contains("<b>bold</b>"));

    let profile = app.get("/profile", Some(&alice)).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert!(profile.text().contains(&alice_code));

    let friends = app.get("/friends", Some(&alice)).await;
    assert!(friends.text().contains(&format!("/timeline/{}", bob_id)));

    let missing = app.get("/timeline/9999", Some(&alice)).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_image_only_post() {
    let app = setup();
    let (alice_id, alice, _) = app.register("alice", true).await;

    // Browsers send an empty textContent alongside the file
    let reply = app
        .post_multipart_files(
            "/api/post",
            Some(&alice),
            &[("textContent", ""), ("postedOnID", &alice_id.to_string())],
            &[("pic", "a.png", "image/png", "8 bytes!")],
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.text());
    assert_eq!(
        app.count("SELECT COUNT(*) FROM posts WHERE text_content IS NULL AND associated_image_id IS NOT NULL"),
        1
    );

    // A gif is not accepted as a post attachment
    let gif = app
        .post_multipart_files(
            "/api/post",
            Some(&alice),
            &[("textContent", ""), ("postedOnID", &alice_id.to_string())],
            &[("pic", "a.gif", "image/gif", "GIF89a")],
        )
        .await;
    assert_eq!(gif.status, StatusCode::BAD_REQUEST);
    assert_eq!(gif.json()["message"], "File must be .jpg or .png!");
}

#[tokio::test]
async fn test_replies_and_reactions_require_permission() {
    let app = setup();
    let (_, alice, _) = app.register("alice", true).await;
    let (bob_id, bob, _) = app.register("bob", true).await;
    let (carol_id, carol, carol_code) = app.register("carol", false).await;
    let (_, dave, dave_code) = app.register("dave", true).await;
    app.befriend(&dave, &dave_code, &carol, &carol_code).await;

    let private_post = app.create_post(&carol, carol_id, "dear diary").await.json()["id"]
        .as_i64()
        .unwrap();
    let public_post = app.create_post(&bob, bob_id, "hello world").await.json()["id"]
        .as_i64()
        .unwrap();

    // A private timeline is closed to strangers and friends alike
    for cookie in [&alice, &dave] {
        let reply = app.reply_to(cookie, private_post).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            reply.json()["message"],
            "You do not have permission to reply right now."
        );

        let reaction = app.react_to(cookie, private_post, 1).await;
        assert_eq!(reaction.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            reaction.json()["message"],
            "You do not have permission to react right now."
        );
    }

    // A public timeline is closed to non-friends
    let reply = app.reply_to(&alice, public_post).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["message"], "You are not friends. You cannot reply.");

    let reaction = app.react_to(&alice, public_post, 1).await;
    assert_eq!(reaction.status, StatusCode::BAD_REQUEST);
    assert_eq!(reaction.json()["message"], "You are not friends. You cannot react.");

    assert_eq!(app.count("SELECT COUNT(*) FROM replies"), 0);
    assert_eq!(app.count("SELECT COUNT(*) FROM reactions"), 0);

    // The owner may still respond on a private timeline
    assert_eq!(app.reply_to(&carol, private_post).await.status, StatusCode::OK);
    assert_eq!(app.react_to(&carol, private_post, 1).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_sharing_posts() {
    let app = setup();
    let (alice_id, alice, _) = app.register("alice", true).await;
    let (bob_id, bob, _) = app.register("bob", true).await;

    let original = app.create_post(&bob, bob_id, "worth sharing").await.json()["id"]
        .as_i64()
        .unwrap();

    let shared = app
        .post_multipart(
            "/api/post",
            Some(&alice),
            &[
                ("textContent", ""),
                ("sharedPostId", &original.to_string()),
                ("postedOnID", &alice_id.to_string()),
            ],
        )
        .await;
    assert_eq!(shared.status, StatusCode::OK, "{}", shared.text());
    let shared_id = shared.json()["id"].as_i64().unwrap();
    assert_eq!(
        app.count(&format!(
            "SELECT shared_post_id FROM posts WHERE id = {}",
            shared_id
        )),
        original
    );

    let deleted = app.delete(&format!("/api/post/{}", original), &bob).await;
    assert_eq!(deleted.status, StatusCode::OK);

    let late = app
        .post_multipart(
            "/api/post",
            Some(&alice),
            &[
                ("textContent", "still good"),
                ("sharedPostId", &original.to_string()),
                ("postedOnID", &alice_id.to_string()),
            ],
        )
        .await;
    assert_eq!(late.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        late.json()["message"],
        "The post you are trying to share has been deleted."
    );
}

#[tokio::test]
async fn test_reacting_again_restores_withdrawn_reaction() {
    let app = setup();
    let (alice_id, alice, alice_code) = app.register("alice", true).await;
    let (_, bob, bob_code) = app.register("bob", true).await;
    app.befriend(&alice, &alice_code, &bob, &bob_code).await;

    let post_id = app.create_post(&alice, alice_id, "react to me").await.json()["id"]
        .as_i64()
        .unwrap();
    let first = app.react_to(&bob, post_id, 1).await.json()["id"]
        .as_i64()
        .unwrap();

    let withdrawn = app.delete(&format!("/api/reaction/{}", first), &bob).await;
    assert_eq!(withdrawn.status, StatusCode::OK);
    assert_eq!(
        app.count("SELECT COUNT(*) FROM reactions WHERE deleted_at IS NULL"),
        0
    );

    let again = app.react_to(&bob, post_id, 2).await;
    assert_eq!(again.status, StatusCode::OK);
    assert_eq!(again.json()["id"], first);
    assert_eq!(app.count("SELECT COUNT(*) FROM reactions"), 1);
    assert_eq!(
        app.count(&format!(
            "SELECT reaction_type FROM reactions WHERE id = {} AND deleted_at IS NULL",
            first
        )),
        2
    );
}
