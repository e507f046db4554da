//! HTML for the browser pages.
//!
//! Every piece of user-supplied text goes through [`escape`] before it is
//! written into markup.

use std::fmt::Write;

use y_types::{Account, PostableMap, TimelineEntry};

use super::view::{FriendsView, ProfileView};

/// Escape text for use in element content and quoted attribute values
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, nav: bool, body: &str) -> String {
    let nav = if nav {
        r#"<nav><a href="/profile">Profile</a> <a href="/friends">Friends</a> <a href="/settings">Settings</a> <button id="logout" data-action="/api/logout">Log out</button></nav>"#
    } else {
        ""
    };
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{} | Y</title>\n</head>\n<body>\n{}\n<main>\n{}</main>\n</body>\n</html>\n",
        escape(title),
        nav,
        body
    )
}

/// Text shown above the login form for a `redirectReason`
pub fn redirect_reason_message(reason: &str) -> Option<&'static str> {
    match reason {
        "noTkn" => Some("Please log in to continue."),
        "tknExp" => Some("Your session expired. Please log in again."),
        _ => None,
    }
}

pub fn login_page(reason: Option<&str>) -> String {
    let mut body = String::from("<h1>Log in</h1>\n");
    if let Some(message) = reason.and_then(redirect_reason_message) {
        let _ = writeln!(body, "<p class=\"notice\">{}</p>", message);
    }
    body.push_str(
        r#"<form id="login" data-action="/api/login">
<label>Username <input name="username" maxlength="32" required></label>
<label>Password <input name="password" type="password" required></label>
<button type="submit">Log in</button>
</form>
<p><a href="/register">Create an account</a></p>
"#,
    );
    layout("Log in", false, &body)
}

pub fn register_page() -> String {
    let body = r#"<h1>Sign up</h1>
<form id="register" method="post" action="/api/account" enctype="multipart/form-data">
<label>Username <input name="username" maxlength="32" required></label>
<label>Password <input name="password" type="password" required></label>
<label>First name <input name="fName" maxlength="32" required></label>
<label>Last name <input name="lName" maxlength="32" required></label>
<label>Bio <textarea name="bio" maxlength="400"></textarea></label>
<label><input type="checkbox" name="public" value="public"> Public profile</label>
<label>Profile image <input type="file" name="profile-image" accept="image/*"></label>
<label>Cover image <input type="file" name="cover-image" accept="image/*"></label>
<button type="submit">Sign up</button>
</form>
<p><a href="/login">Already have an account?</a></p>
"#;
    layout("Sign up", false, body)
}

fn image_tag(image_id: Option<i64>, class: &str) -> String {
    match image_id {
        Some(id) => format!("<img class=\"{}\" src=\"/api/images/{}\" alt=\"\">", class, id),
        None => String::new(),
    }
}

fn account_link(account: &Account) -> String {
    format!(
        "<a href=\"/timeline/{}\">{}</a>",
        account.id,
        escape(&account.display_name())
    )
}

fn postable_name(postable: &PostableMap, id: i64) -> String {
    postable
        .get(&id)
        .map(|entry| escape(&entry.name))
        .unwrap_or_else(|| "Unknown user".to_string())
}

fn render_entry(out: &mut String, entry: &TimelineEntry, postable: &PostableMap) {
    let post = &entry.post;
    let _ = writeln!(
        out,
        "<article class=\"post\" data-post-id=\"{}\">\n<header>{} <time>{}</time>{}</header>",
        post.id,
        postable_name(postable, post.poster_id),
        post.created_at.format("%Y-%m-%d %H:%M"),
        if post.edited_at.is_some() { " (edited)" } else { "" }
    );
    if let Some(text) = &post.text_content {
        let _ = writeln!(out, "<p>{}</p>", escape(text));
    }
    out.push_str(&image_tag(post.associated_image_id, "post-image"));

    if let Some(shared) = &entry.shared_post {
        let _ = writeln!(
            out,
            "<blockquote class=\"shared\" data-post-id=\"{}\" data-timeline=\"{}\">",
            shared.id, shared.posted_on_id
        );
        if let Some(text) = &shared.text_content {
            let _ = writeln!(out, "<p>{}</p>", escape(text));
        }
        out.push_str(&image_tag(shared.image_id, "post-image"));
        let _ = writeln!(
            out,
            "<time>{}</time>\n</blockquote>",
            shared.created_at.format("%Y-%m-%d %H:%M")
        );
    } else if post.shared_post_id.is_some() {
        out.push_str("<blockquote class=\"shared unavailable\">This post is unavailable.</blockquote>\n");
    }

    let _ = writeln!(
        out,
        "<footer><span class=\"likes\">{} like{}</span> <button class=\"like\" data-reacted=\"{}\" data-reaction-id=\"{}\">{}</button></footer>",
        entry.num_likes,
        if entry.num_likes == 1 { "" } else { "s" },
        entry.user_reacted,
        entry.user_reaction_id.map(|id| id.to_string()).unwrap_or_default(),
        if entry.user_reacted { "Unlike" } else { "Like" }
    );

    if !entry.replies.is_empty() {
        out.push_str("<ul class=\"replies\">\n");
        for reply in &entry.replies {
            let _ = writeln!(
                out,
                "<li data-reply-id=\"{}\"><strong>{}</strong> {}</li>",
                reply.id,
                postable_name(postable, reply.poster_id),
                escape(&reply.text_content)
            );
        }
        out.push_str("</ul>\n");
    }
    out.push_str("</article>\n");
}

pub fn profile_page(view: &ProfileView) -> String {
    let owner = &view.owner;
    let mut body = String::new();

    body.push_str(&image_tag(owner.cover_image_id, "cover"));
    body.push_str(&image_tag(owner.profile_image_id, "avatar"));
    let _ = writeln!(
        body,
        "<h1>{}</h1>\n<p class=\"username\">@{}</p>",
        escape(&owner.display_name()),
        escape(&owner.username)
    );
    if let Some(bio) = &owner.bio {
        let _ = writeln!(body, "<p class=\"bio\">{}</p>", escape(bio));
    }
    if view.is_own_profile() {
        let _ = writeln!(
            body,
            "<p class=\"friend-code\">Friend code: <code>{}</code></p>",
            escape(&owner.friend_code)
        );
    }

    body.push_str("<section class=\"friends\">\n<h2>Friends</h2>\n<ul>\n");
    for friend in &view.friends {
        let _ = writeln!(body, "<li>{}</li>", account_link(friend));
    }
    body.push_str("</ul>\n</section>\n");

    let _ = writeln!(
        body,
        "<form id=\"new-post\" method=\"post\" action=\"/api/post\" enctype=\"multipart/form-data\">\n<input type=\"hidden\" name=\"postedOnID\" value=\"{}\">\n<textarea name=\"textContent\" maxlength=\"400\"></textarea>\n<input type=\"file\" name=\"pic\" accept=\"image/jpeg,image/png\">\n<button type=\"submit\">Post</button>\n</form>",
        owner.id
    );

    body.push_str("<section class=\"timeline\">\n");
    if view.timeline.is_empty() {
        body.push_str("<p>Nothing here yet.</p>\n");
    }
    for entry in &view.timeline {
        render_entry(&mut body, entry, &view.postable);
    }
    body.push_str("</section>\n");

    layout(&owner.display_name(), true, &body)
}

fn account_list(out: &mut String, heading: &str, accounts: &[Account], action: Option<(&str, &str)>) {
    let _ = writeln!(out, "<section>\n<h2>{}</h2>\n<ul>", heading);
    if accounts.is_empty() {
        out.push_str("<li class=\"empty\">None</li>\n");
    }
    for account in accounts {
        let button = match action {
            Some((endpoint, label)) => format!(
                " <button data-action=\"{}\" data-friend-code=\"{}\">{}</button>",
                endpoint,
                escape(&account.friend_code),
                label
            ),
            None => String::new(),
        };
        let _ = writeln!(out, "<li>{}{}</li>", account_link(account), button);
    }
    out.push_str("</ul>\n</section>\n");
}

pub fn friends_page(view: &FriendsView) -> String {
    let mut body = String::from("<h1>Friends</h1>\n");
    let _ = writeln!(
        body,
        "<p>Your friend code: <code>{}</code></p>\n<form id=\"add-friend\" data-action=\"/api/makeFriend\">\n<input name=\"friendCode\" maxlength=\"8\" required>\n<button type=\"submit\">Send request</button>\n</form>",
        escape(&view.account.friend_code)
    );

    account_list(&mut body, "Friends", &view.friends, Some(("/api/removeFriend", "Remove")));
    account_list(&mut body, "Requests", &view.pending, Some(("/api/acceptFriend", "Accept")));
    account_list(&mut body, "Sent requests", &view.outgoing, None);
    account_list(&mut body, "Blocked", &view.blocked, Some(("/api/unblockUser", "Unblock")));

    layout("Friends", true, &body)
}

pub fn settings_page(account: &Account) -> String {
    let mut body = String::from("<h1>Settings</h1>\n");
    let _ = writeln!(
        body,
        "<form method=\"post\" action=\"/api/account/updateBio\">\n<label>Bio <textarea name=\"new-bio\" maxlength=\"400\">{}</textarea></label>\n<button type=\"submit\">Save bio</button>\n</form>",
        escape(account.bio.as_deref().unwrap_or_default())
    );
    body.push_str(
        r#"<form method="post" action="/api/account/updateImages" enctype="multipart/form-data">
<label>Profile image <input type="file" name="profile-image" accept="image/*"></label>
<label>Cover image <input type="file" name="cover-image" accept="image/*"></label>
<button type="submit">Upload</button>
</form>
<form method="post" action="/api/account/updatePassword">
<label>Current password <input name="current-password" type="password" required></label>
<label>New password <input name="new-password" type="password" required></label>
<button type="submit">Change password</button>
</form>
"#,
    );
    let _ = writeln!(
        body,
        "<form method=\"post\" action=\"/api/account/updateVisibility\">\n<label><input type=\"checkbox\" name=\"public\" value=\"public\"{}> Public profile</label>\n<button type=\"submit\">Save</button>\n</form>",
        if account.is_public { " checked" } else { "" }
    );
    body.push_str(
        r#"<form id="delete-account" data-action="/api/account" data-method="DELETE">
<label>Password <input name="password" type="password" required></label>
<button type="submit">Delete account</button>
</form>
"#,
    );
    layout("Settings", true, &body)
}

/// Page shown when a request is refused
pub fn error_page(status: &str, message: &str) -> String {
    let body = format!(
        "<h1>{}</h1>\n<p>{}</p>\n<p><a href=\"/profile\">Back to your profile</a></p>\n",
        escape(status),
        escape(message)
    );
    layout(status, true, &body)
}
