//! HTTP request handling
//!
//! Routing, site content loading, static files and the contact form relay.

pub mod contact;
pub mod pages;
pub mod router;
pub mod static_files;

pub use router::handle_request;
