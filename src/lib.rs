pub mod api;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod web;

pub use domain::models::GuardConfig;
pub use infrastructure::secure_guard::{secure_guard_middleware, SecureGuard};

/// Build the demo application: the API routes behind the guard.
pub fn app(guard: GuardConfig) -> axum::Router {
    SecureGuard::new(guard).wrap(api::router())
}
