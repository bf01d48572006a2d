use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::errors::ApiError;
use crate::core::redis::WindowState;
use crate::core::state::AppState;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Fixed-window limit per client IP over the API prefix. Requests pass when
/// Redis cannot answer.
pub(crate) async fn limit_by_ip(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let settings = state.settings().rate_limit();
    if !settings.enabled {
        return next.run(request).await;
    }

    let peer = request.extensions().get::<ConnectInfo<SocketAddr>>().map(|info| info.0);
    let client = client_ip(request.headers(), peer, settings.trust_proxy);
    let key = format!("rate-limit:{client}");

    match state.redis().hit_window(&key, settings.max_requests, settings.window_seconds).await {
        Ok(window) if window.allowed => {
            let mut response = next.run(request).await;
            insert_window_headers(response.headers_mut(), &window);
            response
        }
        Ok(window) => {
            metrics::counter!("rate_limited_total").increment(1);
            tracing::warn!(client = %client, "Rate limit exceeded");
            let mut response = ApiError::TooManyRequests(
                "Too many requests from this IP, please try again later.",
            )
            .into_response();
            insert_window_headers(response.headers_mut(), &window);
            response.headers_mut().insert(header::RETRY_AFTER, HeaderValue::from(window.reset_after));
            response
        }
        Err(err) => {
            tracing::warn!(error = %err, "Rate limiter unavailable; allowing request");
            next.run(request).await
        }
    }
}

fn insert_window_headers(headers: &mut HeaderMap, window: &WindowState) {
    headers.insert(HeaderName::from_static("ratelimit-limit"), HeaderValue::from(window.limit));
    headers
        .insert(HeaderName::from_static("ratelimit-remaining"), HeaderValue::from(window.remaining));
    headers
        .insert(HeaderName::from_static("ratelimit-reset"), HeaderValue::from(window.reset_after));
}

/// The socket peer. The first `x-forwarded-for` hop is used only when the
/// service runs behind a trusted proxy.
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    let forwarded = trust_proxy
        .then(|| headers.get(FORWARDED_FOR))
        .flatten()
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .map(str::to_string);

    forwarded
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
    use tower::ServiceExt;

    use super::client_ip;
    use crate::test_support;

    fn forwarded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn peer_address_keys_the_bucket_by_default() {
        let peer = Some("203.0.113.9:4000".parse().expect("addr"));

        let first = client_ip(&forwarded("1.1.1.1"), peer, false);
        let second = client_ip(&forwarded("2.2.2.2"), peer, false);

        assert_eq!(first, "203.0.113.9");
        assert_eq!(first, second);
        assert_eq!(client_ip(&HeaderMap::new(), None, false), "unknown");
    }

    #[test]
    fn trusted_proxy_uses_first_forwarded_hop() {
        let peer = Some("127.0.0.1:4000".parse().expect("addr"));

        assert_eq!(client_ip(&forwarded(" 203.0.113.7 , 10.0.0.1"), peer, true), "203.0.113.7");
        assert_eq!(client_ip(&forwarded(" , 10.0.0.1"), peer, true), "127.0.0.1");
        assert_eq!(client_ip(&HeaderMap::new(), peer, true), "127.0.0.1");
    }

    #[tokio::test]
    async fn requests_over_the_window_get_429() {
        let guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("RATE_LIMIT_MAX", "2");
        let ctx = test_support::setup_test_context_locked(guard).await;

        let mut statuses = Vec::new();
        let mut remaining = Vec::new();
        for hop in ["198.51.100.20", "198.51.100.21", "198.51.100.22"] {
            let mut request =
                test_support::json_request(Method::GET, "/api/courses", None, None);
            request.headers_mut().insert("x-forwarded-for", HeaderValue::from_static(hop));
            let response = ctx.app.clone().oneshot(request).await.expect("response");
            statuses.push(response.status());
            remaining.push(
                response
                    .headers()
                    .get("ratelimit-remaining")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string),
            );
        }
        std::env::remove_var("RATE_LIMIT_MAX");

        assert_eq!(statuses, vec![StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]);
        assert_eq!(
            remaining,
            vec![Some("1".to_string()), Some("0".to_string()), Some("0".to_string())]
        );
    }
}
