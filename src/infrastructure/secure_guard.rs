use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};

use crate::domain::guard_service::{self, GuardError};
use crate::domain::models::GuardConfig;
use crate::infrastructure::security_headers::security_header_map;
use crate::web::templates::RedirectTemplate;

/// Header set by the fronting proxy/load balancer with the client-facing scheme.
pub const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Wraps routers with the guard pipeline.
#[derive(Debug, Clone)]
pub struct SecureGuard {
    config: Arc<GuardConfig>,
}

impl SecureGuard {
    pub fn new(config: GuardConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Put the guard in front of every route of `router`.
    ///
    /// The guard runs inside axum's method routing, so a redirect or
    /// rejection for a method the route does not serve still carries the
    /// `Allow` header axum adds to such responses.
    pub fn wrap<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(middleware::from_fn_with_state(
            self.config.clone(),
            secure_guard_middleware,
        ))
    }
}

/// Host as declared by the client: the `Host` header, or the URI authority
/// for HTTP/2 requests. Missing or unreadable hosts read as empty.
pub fn request_host(req: &Request) -> String {
    req.headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| req.uri().authority().map(|a| a.as_str().to_string()))
        .unwrap_or_default()
}

fn forwarded_proto(headers: &HeaderMap) -> Option<&str> {
    headers.get(FORWARDED_PROTO)?.to_str().ok()
}

/// Secure guard middleware
///
/// Outside testing mode, insecure requests are redirected to
/// `https://{host}` and requests for hosts outside the allow-list are
/// rejected. Accepted requests reach the wrapped handler and their response
/// carries the security headers ahead of whatever the handler wrote.
pub async fn secure_guard_middleware(
    State(config): State<Arc<GuardConfig>>,
    req: Request,
    next: Next,
) -> Response {
    let host = request_host(&req);

    if let Err(err) = guard_service::evaluate(&config, forwarded_proto(req.headers()), &host) {
        return guard_response(err, req.method());
    }

    let guard_headers = security_header_map();
    let mut response = next.run(req).await;
    stamp_headers(response.headers_mut(), guard_headers);
    response
}

/// Put `guard_headers` first and append the handler's own headers after them.
fn stamp_headers(headers: &mut HeaderMap, guard_headers: HeaderMap) {
    let mut merged = guard_headers;
    merged.reserve(headers.len());
    for (name, value) in headers.iter() {
        merged.append(name.clone(), value.clone());
    }
    *headers = merged;
}

/// Terminal response for a guard failure. Redirects for `GET` and `HEAD`
/// carry a short HTML link to the target.
pub fn guard_response(err: GuardError, method: &Method) -> Response {
    match err {
        GuardError::InsecureTransport { target } => redirect(&target, method),
        bad_host @ GuardError::BadHost { .. } => bad_host.into_response(),
    }
}

fn redirect(target: &str, method: &Method) -> Response {
    let location = match HeaderValue::from_str(target) {
        Ok(value) => value,
        Err(_) => return (StatusCode::BAD_REQUEST, "Invalid host").into_response(),
    };

    let body = if *method == Method::GET || *method == Method::HEAD {
        RedirectTemplate { target }.render().ok()
    } else {
        None
    };

    let mut response = match body {
        Some(html) => (
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/html; charset=utf-8"),
            )],
            html,
        )
            .into_response(),
        None => Response::default(),
    };

    *response.status_mut() = StatusCode::TEMPORARY_REDIRECT;
    response.headers_mut().insert(header::LOCATION, location);
    response
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        match self {
            GuardError::InsecureTransport { target } => redirect(&target, &Method::GET),
            // TODO: answer 400 (or 421) once clients no longer rely on the 500.
            GuardError::BadHost { suggestion, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                [
                    (
                        header::CONTENT_TYPE,
                        HeaderValue::from_static("text/plain; charset=utf-8"),
                    ),
                    (
                        header::X_CONTENT_TYPE_OPTIONS,
                        HeaderValue::from_static("nosniff"),
                    ),
                ],
                guard_service::bad_host_message(suggestion.as_deref()),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::get};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    fn app(config: GuardConfig, calls: Arc<AtomicUsize>) -> Router {
        let router = Router::new().route(
            "/",
            get(move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    "hello"
                }
            }),
        );
        SecureGuard::new(config).wrap(router)
    }

    fn request(method: Method, host: &str, proto: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder()
            .method(method)
            .uri("/")
            .header(header::HOST, host);
        if let Some(proto) = proto {
            builder = builder.header(FORWARDED_PROTO, proto);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_request_host_prefers_host_header() {
        let req = axum::http::Request::builder()
            .uri("http://authority.test/path")
            .header(header::HOST, "header.test:8080")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_host(&req), "header.test:8080");
    }

    #[test]
    fn test_request_host_falls_back_to_authority() {
        let req = axum::http::Request::builder()
            .uri("https://authority.test/path")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_host(&req), "authority.test");

        let req = axum::http::Request::builder()
            .uri("/path")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_host(&req), "");
    }

    #[tokio::test]
    async fn test_get_redirect_has_html_body() {
        let calls = Arc::new(AtomicUsize::new(0));
        let response = app(GuardConfig::default(), calls.clone())
            .oneshot(request(Method::GET, "example.com", Some("http")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "https://example.com");
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        assert_eq!(
            body_text(response).await.trim_end(),
            "<a href=\"https://example.com\">Temporary Redirect</a>."
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_post_redirect_has_empty_body() {
        let calls = Arc::new(AtomicUsize::new(0));
        let response = app(GuardConfig::default(), calls.clone())
            .oneshot(request(Method::POST, "example.com", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "https://example.com");
        // "/" only serves GET, so axum's method routing adds its Allow header.
        assert_eq!(response.headers()[header::ALLOW], "GET,HEAD");
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
        assert!(body_text(response).await.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bad_host_is_plain_text_500() {
        let calls = Arc::new(AtomicUsize::new(0));
        let response = app(GuardConfig::enforcing(["example.com"]), calls.clone())
            .oneshot(request(Method::GET, "other.com", Some("https")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert!(response.headers().get("content-security-policy").is_none());
        assert_eq!(
            body_text(response).await,
            "This is a bad host. Try: example.com"
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bad_host_without_suggestion() {
        let response = GuardError::BadHost {
            host: "other.com".to_string(),
            suggestion: None,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "This is a bad host.");
    }

    #[test]
    fn test_stamp_headers_puts_guard_headers_first() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        headers.insert("x-frame-options", HeaderValue::from_static("SAMEORIGIN"));

        stamp_headers(&mut headers, security_header_map());

        let frame: Vec<_> = headers.get_all("x-frame-options").iter().collect();
        assert_eq!(frame, vec!["DENY", "SAMEORIGIN"]);
        assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
        assert_eq!(
            headers.keys().next().map(|k| k.as_str()),
            Some("strict-transport-security")
        );
    }

    #[tokio::test]
    async fn test_redirect_body_escapes_target() {
        let response = app(GuardConfig::default(), Arc::new(AtomicUsize::new(0)))
            .oneshot(request(Method::GET, "a\"b<c>", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "https://a\"b<c>");
        let body = body_text(response).await;
        assert!(body.contains("a&quot;b&lt;c&gt;"), "unescaped body: {}", body);
        assert!(!body.contains("<c>"));
    }

    #[tokio::test]
    async fn test_insecure_transport_error_matches_get_redirect() {
        let response = GuardError::InsecureTransport {
            target: "https://example.com".to_string(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "https://example.com");
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        assert_eq!(
            body_text(response).await.trim_end(),
            "<a href=\"https://example.com\">Temporary Redirect</a>."
        );
    }
}
