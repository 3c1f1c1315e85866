pub mod health;
pub mod home;

use axum::{routing::get, Router};

/// Application routes, without the guard.
pub fn router() -> Router {
    Router::new()
        .route("/", get(home::index))
        .route("/health", get(health::check))
}
