//! Router builder for the bookshelf HTTP server

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use tower_http::{
    request_id::{MakeRequestUuid, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};

pub const CORS_ALLOW_ORIGIN: &str = "*";
pub const CORS_ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const CORS_ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// Builder for constructing the main HTTP router.
///
/// Layers only wrap what is already registered, so add routes and
/// [`RouterBuilder::with_not_found`] before any `with_*` middleware.
pub struct RouterBuilder {
    router: Router,
}

impl RouterBuilder {
    /// Create a new router builder
    pub fn new() -> Self {
        Self {
            router: Router::new(),
        }
    }

    /// Add a route to the router
    pub fn route(mut self, path: &str, route: axum::routing::MethodRouter) -> Self {
        self.router = self.router.route(path, route);
        self
    }

    /// Merge a module's router at the root path
    pub fn merge_module(mut self, module_name: &str, module_router: Router) -> Self {
        tracing::debug!(module = module_name, "merging module routes");
        self.router = self.router.merge(module_router);
        self
    }

    /// Route unknown paths, unregistered methods on known paths, `HEAD`, and
    /// any request carrying a query string to 404
    pub fn with_not_found(mut self) -> Self {
        self.router = self
            .router
            .fallback(not_found)
            .method_not_allowed_fallback(not_found)
            .layer(middleware::from_fn(require_exact_match));
        self
    }

    /// Add tracing middleware
    pub fn with_tracing(mut self) -> Self {
        self.router = self.router.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
        );
        self
    }

    /// Answer `OPTIONS` on any path with 204 and attach the CORS headers to
    /// every response, preflight included
    pub fn with_cors(mut self) -> Self {
        self.router = self
            .router
            .layer(middleware::from_fn(answer_preflight))
            .layer(SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static(CORS_ALLOW_ORIGIN),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(CORS_ALLOW_METHODS),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(CORS_ALLOW_HEADERS),
            ));
        self
    }

    /// Add request ID middleware
    pub fn with_request_id(mut self) -> Self {
        self.router = self
            .router
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));
        self
    }

    /// Build the final router
    pub fn build(self) -> Router {
        self.router
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Fallback for every unmatched method/path pair
pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found\n").into_response()
}

/// Routes match the full request target, so `/books?page=2` is not `/books`.
/// axum serves `HEAD` from `GET` routes; no route here registers `HEAD`.
async fn require_exact_match(request: Request, next: Next) -> Response {
    if request.method() == Method::HEAD || request.uri().query().is_some() {
        return not_found().await;
    }
    next.run(request).await
}

async fn answer_preflight(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        routing::{get, post},
    };
    use tower::ServiceExt;

    fn request(method: Method, uri: &str) -> Request {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn sample_router(cors: bool) -> Router {
        let builder = RouterBuilder::new()
            .route("/items", get(|| async { "items" }))
            .merge_module("test", Router::new().route("/add", post(|| async { "added" })))
            .with_not_found();
        let builder = if cors { builder.with_cors() } else { builder };
        builder.with_tracing().with_request_id().build()
    }

    #[tokio::test]
    async fn test_registered_route_is_served() {
        let response = sample_router(true)
            .oneshot(request(Method::GET, "/items"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(body_text(response).await, "items");
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        for uri in ["/unknown", "/items/", "/add/"] {
            let response = sample_router(true)
                .oneshot(request(Method::GET, uri))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body_text(response).await, "Not Found\n");
        }
    }

    #[tokio::test]
    async fn test_wrong_method_is_not_found() {
        for (method, uri) in [
            (Method::POST, "/items"),
            (Method::GET, "/add"),
            (Method::DELETE, "/items"),
        ] {
            let response = sample_router(true)
                .oneshot(request(method.clone(), uri))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method} {uri}");
            assert_eq!(body_text(response).await, "Not Found\n");
        }
    }

    #[tokio::test]
    async fn test_head_is_not_found() {
        for uri in ["/items", "/nowhere"] {
            let response = sample_router(true)
                .oneshot(request(Method::HEAD, uri))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_query_string_is_not_found() {
        for (method, uri) in [
            (Method::GET, "/items?page=2"),
            (Method::GET, "/items?"),
            (Method::POST, "/add?x=1"),
        ] {
            let response = sample_router(true)
                .oneshot(request(method.clone(), uri))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{method} {uri}");
            assert_eq!(response.headers()["access-control-allow-origin"], "*");
            assert_eq!(body_text(response).await, "Not Found\n");
        }
    }

    #[tokio::test]
    async fn test_preflight_with_query_string() {
        let response = sample_router(true)
            .oneshot(request(Method::OPTIONS, "/items?x=1"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_preflight_on_any_path() {
        for uri in ["/items", "/nowhere"] {
            let response = sample_router(true)
                .oneshot(request(Method::OPTIONS, uri))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::NO_CONTENT);
            let headers = response.headers();
            assert_eq!(headers["access-control-allow-origin"], "*");
            assert_eq!(headers["access-control-allow-methods"], "GET, POST, OPTIONS");
            assert_eq!(
                headers["access-control-allow-headers"],
                "Content-Type, Authorization"
            );
            assert!(!headers.contains_key("content-type"));
            assert!(body_text(response).await.is_empty());
        }
    }

    #[tokio::test]
    async fn test_cors_headers_on_not_found() {
        let response = sample_router(true)
            .oneshot(request(Method::GET, "/unknown"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_options_without_cors_is_not_found() {
        let response = sample_router(false)
            .oneshot(request(Method::OPTIONS, "/items"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(!response
            .headers()
            .contains_key("access-control-allow-origin"));
    }
}
