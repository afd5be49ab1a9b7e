// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub relay: RelayConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub site: SiteConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

/// HTTP listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Datagram relay configuration
///
/// The HTTP side sends to `host:port` and the receiver binds the same
/// address, so both halves always agree on the destination.
#[derive(Debug, Deserialize, Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    /// Largest datagram payload kept by the receiver; longer ones are cut
    pub buffer_size: usize,
}

/// Merge store configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub data_file: String,
}

/// Site content and contact form configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SiteConfig {
    /// Directory holding pages and static assets
    #[serde(default = "default_site_root")]
    pub root: String,
    /// Path that accepts contact form POSTs
    #[serde(default = "default_contact_path")]
    pub contact_path: String,
    /// `Location` sent back after a contact POST
    #[serde(default = "default_redirect_location")]
    pub redirect_location: String,
    /// Page served with 404 status, relative to `root`
    #[serde(default = "default_not_found_page")]
    pub not_found_page: String,
    /// Fixed page routes (exact path match)
    #[serde(default = "default_pages")]
    pub pages: Vec<PageRoute>,
}

/// A single page route: request path -> file under the site root
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct PageRoute {
    pub path: String,
    pub file: String,
}

fn default_site_root() -> String {
    "site".to_string()
}

fn default_contact_path() -> String {
    "/contact".to_string()
}

fn default_redirect_location() -> String {
    "/message.html".to_string()
}

fn default_not_found_page() -> String {
    "error404.html".to_string()
}

fn default_pages() -> Vec<PageRoute> {
    [
        ("/", "index.html"),
        ("/message.html", "message.html"),
        ("/contact", "contact.html"),
    ]
    .into_iter()
    .map(|(path, file)| PageRoute {
        path: path.to_string(),
        file: file.to_string(),
    })
    .collect()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root: default_site_root(),
            contact_path: default_contact_path(),
            redirect_location: default_redirect_location(),
            not_found_page: default_not_found_page(),
            pages: default_pages(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common or json)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub max_body_size: u64,
}
