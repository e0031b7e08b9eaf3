/// Hardening headers stamped onto every response
///
/// The API only ever answers with JSON, so the content policy forbids every
/// resource type and framing outright. HSTS is added only when the server is
/// known to sit behind TLS.

use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::Response,
};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tower::{Layer, Service};

static ALWAYS: [(HeaderName, &str); 5] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (header::REFERRER_POLICY, "strict-origin-when-cross-origin"),
    (
        header::CONTENT_SECURITY_POLICY,
        "default-src 'none'; frame-ancestors 'none'",
    ),
    (
        HeaderName::from_static("permissions-policy"),
        "geolocation=(), microphone=(), camera=(), payment=(), usb=()",
    ),
];

const TRANSPORT_SECURITY: &str = "max-age=31536000; includeSubDomains";

fn stamp(headers: &mut HeaderMap, behind_tls: bool) {
    for (name, value) in &ALWAYS {
        headers.insert(name.clone(), HeaderValue::from_static(*value));
    }
    if behind_tls {
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(TRANSPORT_SECURITY),
        );
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SecurityHeadersLayer {
    behind_tls: bool,
}

impl SecurityHeadersLayer {
    /// `behind_tls` enables `Strict-Transport-Security`; pass the production flag.
    pub fn new(behind_tls: bool) -> Self {
        Self { behind_tls }
    }
}

impl<S> Layer<S> for SecurityHeadersLayer {
    type Service = SecurityHeaders<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecurityHeaders {
            inner,
            behind_tls: self.behind_tls,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SecurityHeaders<S> {
    inner: S,
    behind_tls: bool,
}

impl<S> Service<Request> for SecurityHeaders<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let behind_tls = self.behind_tls;
        let pending = self.inner.call(request);

        Box::pin(async move {
            let mut response = pending.await?;
            stamp(response.headers_mut(), behind_tls);
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::get, Router};
    use tower::ServiceExt;

    async fn response_headers(behind_tls: bool) -> HeaderMap {
        let app = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(SecurityHeadersLayer::new(behind_tls));

        app.oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap()
            .headers()
            .clone()
    }

    #[tokio::test]
    async fn test_every_response_is_stamped() {
        let headers = response_headers(false).await;

        for (name, value) in &ALWAYS {
            assert_eq!(headers[name], *value, "{name}");
        }
    }

    #[tokio::test]
    async fn test_transport_security_follows_flag() {
        let plain = response_headers(false).await;
        let tls = response_headers(true).await;

        assert!(!plain.contains_key(header::STRICT_TRANSPORT_SECURITY));
        assert_eq!(tls[header::STRICT_TRANSPORT_SECURITY], TRANSPORT_SECURITY);
    }

    #[test]
    fn test_stamp_overwrites_existing_values() {
        let mut headers = HeaderMap::new();
        headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));

        stamp(&mut headers, false);

        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    }
}
