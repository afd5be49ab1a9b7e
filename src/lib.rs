//! Personal site server with a contact form relay.
//!
//! GET requests are answered from the site directory. Contact form POSTs
//! are forwarded as UDP datagrams to a relay receiver, which decodes each
//! one and merges it into a JSON file on disk.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod relay;
pub mod server;
pub mod store;
