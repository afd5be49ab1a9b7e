//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: GET/HEAD go to the page
//! loader, POST on the contact path goes to the relay, everything else
//! is rejected.

use hyper::body::{Body, Incoming};
use hyper::header::{HeaderName, REFERER, USER_AGENT};
use hyper::{Method, Request, StatusCode, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use super::contact;
use super::pages::{Lookup, PageLoader};
use crate::config::AppState;
use crate::http::{self, HttpResponse};
use crate::logger::{self, AccessLogEntry};

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<Incoming>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<HttpResponse, Infallible> {
    let started = Instant::now();
    let mut entry = state.access_log.then(|| access_entry(&req, peer_addr));

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let mut response = match method {
        Method::GET | Method::HEAD => {
            serve_content(&state.pages, &path, method == Method::HEAD).await
        }
        Method::POST if path == state.config.site.contact_path => {
            contact::handle_contact_post(req, &state).await
        }
        _ => {
            logger::log_warning(&format!("Method not allowed: {method} {path}"));
            http::build_405_response()
        }
    };

    if let Ok(server_name) = state.config.http.server_name.parse() {
        response.headers_mut().insert(hyper::header::SERVER, server_name);
    }

    if let Some(entry) = entry.as_mut() {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// GET/HEAD dispatch: page or static file, else the 404 page
pub async fn serve_content(pages: &PageLoader, path: &str, is_head: bool) -> HttpResponse {
    match pages.resolve(path).await {
        Lookup::Found(page) => {
            http::build_content_response(StatusCode::OK, page.content, page.content_type, is_head)
        }
        Lookup::NotFound => match pages.not_found_page().await {
            Some(page) => http::build_content_response(
                StatusCode::NOT_FOUND,
                page.content,
                page.content_type,
                is_head,
            ),
            None => http::build_404_response(is_head),
        },
    }
}

fn access_entry(req: &Request<Incoming>, peer_addr: SocketAddr) -> AccessLogEntry {
    let header = |name: HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = version_label(req.version()).to_string();
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
