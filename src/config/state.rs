// Application state module
// Shared, read-only state handed to every HTTP connection

use super::types::Config;
use crate::handler::pages::PageLoader;
use crate::relay::RelaySender;

/// Application state
///
/// Built once at startup; nothing in here changes while the server runs.
pub struct AppState {
    pub config: Config,
    pub pages: PageLoader,
    pub relay: RelaySender,
    pub access_log: bool,
}

impl AppState {
    pub fn new(config: Config, pages: PageLoader, relay: RelaySender) -> Self {
        let access_log = config.logging.access_log;
        Self {
            config,
            pages,
            relay,
            access_log,
        }
    }
}
