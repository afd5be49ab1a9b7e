//! Contact form relay sender
//!
//! A POST body is read in full and forwarded verbatim as one datagram.
//! The browser always gets a redirect; relay failures are only logged.

use http_body_util::{BodyExt, Limited};
use hyper::body::{Body, Bytes, Incoming};
use hyper::header::{HeaderMap, CONTENT_LENGTH};
use hyper::Request;

use crate::config::AppState;
use crate::error::RequestError;
use crate::http::{self, HttpResponse};
use crate::logger;

/// Validate the Content-Length header against `max_body_size`
pub fn content_length(headers: &HeaderMap, max_body_size: u64) -> Result<u64, RequestError> {
    let value = headers
        .get(CONTENT_LENGTH)
        .ok_or(RequestError::MissingContentLength)?;
    let text = value.to_str().map_err(|_| {
        RequestError::InvalidContentLength(String::from_utf8_lossy(value.as_bytes()).into_owned())
    })?;
    let size = text
        .trim()
        .parse::<u64>()
        .map_err(|_| RequestError::InvalidContentLength(text.to_string()))?;

    if size > max_body_size {
        return Err(RequestError::BodyTooLarge {
            size,
            max: max_body_size,
        });
    }
    Ok(size)
}

/// Read at most `length` bytes of `body`
pub async fn read_body<B>(body: B, length: u64) -> Result<Bytes, RequestError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let limit = usize::try_from(length).unwrap_or(usize::MAX);
    Limited::new(body, limit)
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| RequestError::BodyRead(e.to_string()))
}

/// Handle a contact form POST
pub async fn handle_contact_post(req: Request<Incoming>, state: &AppState) -> HttpResponse {
    let length = match content_length(req.headers(), state.config.http.max_body_size) {
        Ok(length) => length,
        Err(e) => {
            logger::log_warning(&format!("Rejected contact submission: {e}"));
            return http::build_request_error_response(&e);
        }
    };

    let body = match read_body(req.into_body(), length).await {
        Ok(body) => body,
        Err(e) => {
            logger::log_warning(&format!("Rejected contact submission: {e}"));
            return http::build_request_error_response(&e);
        }
    };

    // The redirect does not depend on whether the datagram was delivered
    if let Err(e) = state.relay.forward(&body).await {
        logger::log_relay_error(&e);
    }

    http::build_redirect_response(&state.config.site.redirect_location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use hyper::header::HeaderValue;

    fn headers_with_length(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_content_length_valid() {
        assert_eq!(content_length(&headers_with_length("26"), 1024), Ok(26));
    }

    #[test]
    fn test_content_length_missing() {
        assert_eq!(
            content_length(&HeaderMap::new(), 1024),
            Err(RequestError::MissingContentLength)
        );
    }

    #[test]
    fn test_content_length_invalid() {
        assert_eq!(
            content_length(&headers_with_length("twelve"), 1024),
            Err(RequestError::InvalidContentLength("twelve".to_string()))
        );
    }

    #[test]
    fn test_content_length_too_large() {
        assert_eq!(
            content_length(&headers_with_length("4096"), 1024),
            Err(RequestError::BodyTooLarge {
                size: 4096,
                max: 1024
            })
        );
    }

    #[tokio::test]
    async fn test_read_body() {
        let body = Full::new(Bytes::from_static(b"name=Jane&message=Hi+there"));
        let bytes = read_body(body, 26).await.unwrap();
        assert_eq!(bytes, "name=Jane&message=Hi+there");
    }

    #[tokio::test]
    async fn test_read_body_over_limit() {
        let body = Full::new(Bytes::from_static(b"name=Jane&message=Hi+there"));
        assert!(matches!(
            read_body(body, 4).await,
            Err(RequestError::BodyRead(_))
        ));
    }
}
