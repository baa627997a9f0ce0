//! Volume handle template stores
//!
//! A template store maps a CSI driver name to the raw bytes of its volume
//! handle template. The filesystem store keeps one single-line file per
//! driver, named after the driver (`<dir>/hostpath.csi.k8s.io`).

use crate::domain::ports::TemplateStore;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

// =============================================================================
// Filesystem Store
// =============================================================================

/// Reads templates from a directory, one file per driver
#[derive(Debug, Clone)]
pub struct FsTemplateStore {
    root: PathBuf,
}

impl FsTemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the template file for `driver`.
    ///
    /// The driver name must be a single path component.
    fn template_path(&self, driver: &str) -> Result<PathBuf> {
        if driver.is_empty()
            || driver == "."
            || driver == ".."
            || driver.contains(['/', '\\'])
        {
            return Err(Error::Configuration(format!(
                "driver name {:?} cannot be used as a template file name",
                driver
            )));
        }
        Ok(self.root.join(driver))
    }
}

#[async_trait]
impl TemplateStore for FsTemplateStore {
    async fn load(&self, driver: &str) -> Result<Option<Vec<u8>>> {
        let path = self.template_path(driver)?;
        debug!(path = %path.display(), "Reading volume handle template");

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

// =============================================================================
// Static Store
// =============================================================================

/// Fixed in-memory templates, for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct StaticTemplateStore {
    templates: BTreeMap<String, String>,
}

impl StaticTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the template for a driver
    pub fn with_template(mut self, driver: impl Into<String>, template: impl Into<String>) -> Self {
        self.templates.insert(driver.into(), template.into());
        self
    }
}

#[async_trait]
impl TemplateStore for StaticTemplateStore {
    async fn load(&self, driver: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .templates
            .get(driver)
            .map(|t| t.as_bytes().to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fs_store_reads_driver_file() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("hostpath.csi.k8s.io"), "${id}\n").unwrap();

        let store = FsTemplateStore::new(tmp.path());
        let bytes = store.load("hostpath.csi.k8s.io").await.unwrap();
        assert_eq!(bytes.as_deref(), Some(b"${id}\n".as_slice()));
    }

    #[tokio::test]
    async fn test_fs_store_missing_driver() {
        let tmp = TempDir::new().unwrap();
        let store = FsTemplateStore::new(tmp.path());
        assert!(store.load("unknown.csi.example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fs_store_rejects_path_like_driver() {
        let tmp = TempDir::new().unwrap();
        let store = FsTemplateStore::new(tmp.path());
        for driver in ["", ".", "..", "../etc/passwd", "a/b"] {
            assert_matches!(
                store.load(driver).await,
                Err(Error::Configuration(_)),
                "driver {driver:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_static_store() {
        let store = StaticTemplateStore::new().with_template("a.csi.io", "vol-${id}");
        assert_eq!(
            store.load("a.csi.io").await.unwrap(),
            Some(b"vol-${id}".to_vec())
        );
        assert!(store.load("b.csi.io").await.unwrap().is_none());
    }
}
