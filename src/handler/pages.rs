//! Site content loader
//!
//! `PageLoader` is built once from the site configuration and handed to
//! the HTTP handler through `AppState`. It turns a request path into
//! bytes plus a Content-Type, or reports that nothing matched.

use std::collections::HashMap;
use std::path::PathBuf;

use super::static_files;
use crate::config::SiteConfig;

/// Content found for a request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub content: Vec<u8>,
    pub content_type: &'static str,
}

/// Result of resolving a request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(Page),
    NotFound,
}

/// Immutable page and static file resolver
#[derive(Debug, Clone)]
pub struct PageLoader {
    root: PathBuf,
    pages: HashMap<String, PathBuf>,
    not_found_page: PathBuf,
}

impl PageLoader {
    pub fn new(site: &SiteConfig) -> Self {
        let root = PathBuf::from(&site.root);
        let pages = site
            .pages
            .iter()
            .map(|route| (route.path.clone(), root.join(&route.file)))
            .collect();
        let not_found_page = root.join(&site.not_found_page);

        Self {
            root,
            pages,
            not_found_page,
        }
    }

    /// Resolve a request path: configured pages first, then static files
    pub async fn resolve(&self, path: &str) -> Lookup {
        if let Some(file) = self.pages.get(path) {
            return match static_files::load_file(file).await {
                Some((content, content_type)) => Lookup::Found(Page {
                    content,
                    content_type,
                }),
                None => {
                    crate::logger::log_warning(&format!(
                        "Page file for '{path}' is missing: {}",
                        file.display()
                    ));
                    Lookup::NotFound
                }
            };
        }

        match static_files::load_from_directory(&self.root, path).await {
            Some((content, content_type)) => Lookup::Found(Page {
                content,
                content_type,
            }),
            None => Lookup::NotFound,
        }
    }

    /// Body for 404 responses, if the configured page exists
    pub async fn not_found_page(&self) -> Option<Page> {
        static_files::load_file(&self.not_found_page)
            .await
            .map(|(content, content_type)| Page {
                content,
                content_type,
            })
    }
}
