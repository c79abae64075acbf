//! Storage for rendered feeds.
//!
//! Every job writes exactly one file under the feeds directory. Output names
//! come from configuration, so they are sandboxed before any I/O happens:
//! absolute paths and `..` segments that climb out of the directory are
//! rejected.
//!
//! ```text
//! feeds/
//! ├── minimax_blog.xml
//! └── research/
//!     └── waymo.xml
//! ```

pub mod local;

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::error::{AppError, Result};

pub use local::LocalStorage;

/// Trait for feed storage backends.
#[async_trait]
pub trait FeedStorage: Send + Sync {
    /// Persist a rendered feed under `output`, returning the final path.
    async fn write_feed(&self, output: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Validate a configured output name and return it as a clean relative path.
///
/// The check is lexical: `a/../b.xml` is accepted as `b.xml`, while
/// `../b.xml`, `/tmp/b.xml` and empty names are refused.
pub fn sanitize_output(output: &str) -> Result<PathBuf> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("output path is empty"));
    }

    let mut clean = PathBuf::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !clean.pop() {
                    return Err(AppError::validation(format!(
                        "output path escapes feeds directory: {trimmed}"
                    )));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(AppError::validation(format!(
                    "output path must be relative: {trimmed}"
                )));
            }
        }
    }

    if clean.file_name().is_none() {
        return Err(AppError::validation(format!(
            "output path has no file name: {trimmed}"
        )));
    }
    Ok(clean)
}

/// Resolve `output` inside `feeds_dir`, creating parent directories.
pub async fn resolve_output_path(feeds_dir: &Path, output: &str) -> Result<PathBuf> {
    let path = feeds_dir.join(sanitize_output(output)?);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_accepts_nested() {
        assert_eq!(
            sanitize_output("research/waymo.xml").unwrap(),
            PathBuf::from("research/waymo.xml")
        );
        assert_eq!(
            sanitize_output("./a/../b.xml").unwrap(),
            PathBuf::from("b.xml")
        );
    }

    #[test]
    fn test_sanitize_rejects_escape() {
        assert!(sanitize_output("../evil.xml").is_err());
        assert!(sanitize_output("a/../../evil.xml").is_err());
        assert!(sanitize_output("/etc/passwd").is_err());
        assert!(sanitize_output("   ").is_err());
        assert!(sanitize_output("a/..").is_err());
    }

    #[tokio::test]
    async fn test_resolve_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let path = resolve_output_path(tmp.path(), "deep/nested/feed.xml")
            .await
            .unwrap();
        assert_eq!(path, tmp.path().join("deep/nested/feed.xml"));
        assert!(tmp.path().join("deep/nested").is_dir());
    }
}
