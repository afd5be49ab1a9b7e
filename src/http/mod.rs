//! HTTP protocol layer module
//!
//! Content-Type lookup and response builders, independent of routing.

pub mod mime;
pub mod response;

pub use response::{
    build_404_response, build_405_response, build_content_response, build_redirect_response,
    build_request_error_response, HttpResponse,
};
