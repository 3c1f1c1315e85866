pub mod guard_service;
pub mod models;
