pub mod secure_guard;
pub mod security_headers;
