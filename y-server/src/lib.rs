// Library exports for y-server
// This allows other crates in the workspace (and integration tests) to use y-server modules

pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod friendship;
pub mod images;
pub mod middleware;
pub mod pages;
pub mod password;
pub mod permission;
pub mod session;
pub mod state;
