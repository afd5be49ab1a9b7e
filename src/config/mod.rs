// Configuration module entry point
// Loads the static configuration and owns the shared application state

mod state;
mod types;

use hyper::header::HeaderValue;
use std::net::SocketAddr;

pub use state::AppState;
pub use types::{
    Config, HttpConfig, LoggingConfig, PageRoute, PerformanceConfig, RelayConfig, ServerConfig,
    SiteConfig, StorageConfig,
};

/// Default configuration file name (extension resolved by the config crate)
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// The file is optional; environment variables prefixed with `SITE`
    /// override it, using `__` between nested keys (`SITE_RELAY__PORT`).
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("SITE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("relay.host", "127.0.0.1")?
            .set_default("relay.port", 5000)?
            .set_default("relay.buffer_size", 1024)?
            .set_default("storage.data_file", "data/data.json")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "site-relay")?
            .set_default("http.max_body_size", 65_507)? // largest UDP payload
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values that would only fail later, per request
    fn validate(&self) -> Result<(), config::ConfigError> {
        let location = &self.site.redirect_location;
        if location.is_empty() || HeaderValue::from_str(location).is_err() {
            return Err(config::ConfigError::Message(format!(
                "site.redirect_location {location:?} is not a valid Location header value"
            )));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Address the relay sender targets and the relay receiver binds
    pub fn get_relay_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.relay.host, self.relay.port)
            .parse()
            .map_err(|e| format!("Invalid relay address: {e}"))
    }

    pub fn is_debug(&self) -> bool {
        self.logging.level.eq_ignore_ascii_case("debug")
    }
}
