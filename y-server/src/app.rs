use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::middleware::session_middleware;
use crate::pages;
use crate::state::AppState;

/// Build the full application: JSON API, browser pages and health check,
/// all behind the session middleware
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Pages
        .route("/", get(pages::index))
        .route("/login", get(pages::login))
        .route("/register", get(pages::register))
        .route("/signup", get(pages::register))
        .route("/profile", get(pages::profile))
        .route("/timeline/:id", get(pages::timeline))
        .route("/friends", get(pages::friends))
        .route("/settings", get(pages::settings))
        // Account routes
        .route(
            "/api/account",
            post(api::account::create_account)
                .get(api::account::get_account)
                .delete(api::account::delete_account),
        )
        .route("/api/account/updateBio", post(api::account::update_bio))
        .route("/api/account/updateImages", post(api::account::update_images))
        .route("/api/account/updatePassword", post(api::account::update_password))
        .route("/api/account/updateVisibility", post(api::account::update_visibility))
        .route("/api/images/:id", get(api::images::get_image))
        // Authentication routes
        .route("/api/login", post(api::auth::login))
        .route("/api/logout", post(api::auth::logout))
        // Relationship routes
        .route("/api/makeFriend", post(api::relationships::make_friend))
        .route("/api/acceptFriend", post(api::relationships::accept_friend))
        .route("/api/declineFriend", post(api::relationships::decline_friend))
        .route("/api/removeFriend", post(api::relationships::remove_friend))
        .route("/api/blockUser", post(api::relationships::block_user))
        .route("/api/unblockUser", post(api::relationships::unblock_user))
        .route(
            "/api/relationship/:friend_code",
            get(api::relationships::get_relationship),
        )
        // Post, reply and reaction routes
        .route("/api/post", post(api::posts::create_post))
        .route("/api/post/edit/:id", post(api::posts::edit_post))
        .route("/api/post/:id", delete(api::posts::delete_post))
        .route("/api/reply", post(api::posts::create_reply))
        .route("/api/reply/edit/:id", post(api::posts::edit_reply))
        .route("/api/reply/:id", delete(api::posts::delete_reply))
        .route("/api/reaction", post(api::posts::create_reaction))
        .route("/api/reaction/:id", delete(api::posts::delete_reaction))
        .layer(middleware::from_fn_with_state(state.clone(), session_middleware))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn health_check() -> &'static str {
    "OK"
}
