use axum::http::HeaderMap;

/// Plain-text landing page showing which host the guard let through.
pub async fn index(headers: HeaderMap) -> String {
    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown host");
    format!("Hello from {}", host)
}
