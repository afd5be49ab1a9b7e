//! HTTP response building module
//!
//! Builders for the handful of responses the site produces. A builder
//! that fails logs the error and falls back to a bare response.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE, LOCATION};
use hyper::{Response, StatusCode};

use crate::error::RequestError;

pub type HttpResponse = Response<Full<Bytes>>;

const NOT_FOUND_TEXT: &str = "404 Not Found";

/// Build a 200 (or other status) response carrying file content
pub fn build_content_response(
    status: StatusCode,
    content: Vec<u8>,
    content_type: &str,
    is_head: bool,
) -> HttpResponse {
    let content_length = content.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(content)
    };

    Response::builder()
        .status(status)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build plain-text 404 Not Found response (used when no 404 page exists)
pub fn build_404_response(is_head: bool) -> HttpResponse {
    build_content_response(
        StatusCode::NOT_FOUND,
        NOT_FOUND_TEXT.as_bytes().to_vec(),
        "text/plain",
        is_head,
    )
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> HttpResponse {
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header("Content-Type", "text/plain")
        .header("Allow", "GET, HEAD, POST")
        .body(Full::new(Bytes::from("405 Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from("405 Method Not Allowed")))
        })
}

/// Build the 4xx response for a rejected contact submission
pub fn build_request_error_response(err: &RequestError) -> HttpResponse {
    let status = err.status();
    let text = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Bad Request")
    );

    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from(text)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Location used when the configured redirect target is not a valid header
const FALLBACK_LOCATION: &str = "/";

/// Build 302 redirect response
///
/// Always a 302: an unusable `target` is logged and replaced by `/`.
pub fn build_redirect_response(target: &str) -> HttpResponse {
    Response::builder()
        .status(StatusCode::FOUND)
        .header(LOCATION, target)
        .header(CONTENT_TYPE, "text/plain")
        .body(Full::new(Bytes::from("Redirecting...")))
        .unwrap_or_else(|e| {
            log_build_error("302", &e);
            let mut response = Response::new(Full::new(Bytes::from("Redirecting...")));
            *response.status_mut() = StatusCode::FOUND;
            response
                .headers_mut()
                .insert(LOCATION, HeaderValue::from_static(FALLBACK_LOCATION));
            response
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_bytes(response: HttpResponse) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_redirect_response() {
        let response = build_redirect_response("/message.html");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()["Location"], "/message.html");
    }

    #[test]
    fn test_invalid_redirect_target_still_redirects() {
        let response = build_redirect_response("/bad\nlocation");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()["Location"], FALLBACK_LOCATION);
    }

    #[tokio::test]
    async fn test_head_content_response_has_no_body() {
        let response =
            build_content_response(StatusCode::OK, b"<h1>hi</h1>".to_vec(), "text/html", true);
        assert_eq!(response.headers()["Content-Length"], "11");
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_request_error_response() {
        let response = build_request_error_response(&RequestError::MissingContentLength);
        assert_eq!(response.status(), StatusCode::LENGTH_REQUIRED);
        assert_eq!(body_bytes(response).await, "411 Length Required");
    }

    #[tokio::test]
    async fn test_404_response() {
        let response = build_404_response(false);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_bytes(response).await, NOT_FOUND_TEXT);
    }
}
