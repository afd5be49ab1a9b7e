//! Static file loading
//!
//! Reads files below the site root, rejecting anything that resolves
//! outside of it.

use std::path::Path;
use tokio::fs;

use crate::http::mime;
use crate::logger;

/// Load a file from `root` for the request `path`.
///
/// Returns the content and its Content-Type, or `None` if the file does
/// not exist, is a directory, or escapes the root.
pub async fn load_from_directory(root: &Path, path: &str) -> Option<(Vec<u8>, &'static str)> {
    let relative_path = path.trim_start_matches('/');
    if relative_path.is_empty() {
        return None;
    }

    let root_canonical = match fs::canonicalize(root).await {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Site root not found or inaccessible '{}': {e}",
                root.display()
            ));
            return None;
        }
    };

    // File not found is common (404), no need to log it
    let file_canonical = fs::canonicalize(root.join(relative_path)).await.ok()?;
    if !file_canonical.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            path,
            file_canonical.display()
        ));
        return None;
    }

    load_file(&file_canonical).await
}

/// Load a single regular file with its Content-Type
pub async fn load_file(path: &Path) -> Option<(Vec<u8>, &'static str)> {
    let metadata = fs::metadata(path).await.ok()?;
    if !metadata.is_file() {
        return None;
    }

    match fs::read(path).await {
        Ok(content) => Some((content, mime::content_type_for(path))),
        Err(e) => {
            logger::log_error(&format!("Failed to read file '{}': {e}", path.display()));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("site/css")).unwrap();
        std::fs::write(dir.path().join("site/css/style.css"), "body {}").unwrap();
        std::fs::write(dir.path().join("secret.txt"), "hidden").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_load_static_file() {
        let dir = site();
        let (content, content_type) = load_from_directory(&dir.path().join("site"), "/css/style.css")
            .await
            .unwrap();
        assert_eq!(content, b"body {}");
        assert_eq!(content_type, "text/css");
    }

    #[tokio::test]
    async fn test_missing_file_and_directory() {
        let dir = site();
        let root = dir.path().join("site");
        assert!(load_from_directory(&root, "/css/missing.css").await.is_none());
        assert!(load_from_directory(&root, "/css").await.is_none());
        assert!(load_from_directory(&root, "/").await.is_none());
    }

    #[tokio::test]
    async fn test_path_traversal_blocked() {
        let dir = site();
        let root = dir.path().join("site");
        assert!(load_from_directory(&root, "/../secret.txt").await.is_none());
        assert!(load_from_directory(&root, "/css/../../secret.txt").await.is_none());
    }
}
