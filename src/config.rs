//! Importer configuration

use crate::error::{Error, Result};
use std::path::PathBuf;

/// Default directory holding one volume handle template per CSI driver
pub const DEFAULT_TEMPLATE_DIR: &str = "./config";

/// Default namespace for the imported claim
pub const DEFAULT_NAMESPACE: &str = "default";

/// Runtime settings for one import
#[derive(Debug, Clone)]
pub struct ImporterConfig {
    /// Kubeconfig path; inferred from the environment when unset
    pub kubeconfig: Option<PathBuf>,
    /// Namespace the claim is created in
    pub namespace: String,
    /// Directory of volume handle templates
    pub template_dir: PathBuf,
    /// Print the objects instead of creating them
    pub dry_run: bool,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
            template_dir: PathBuf::from(DEFAULT_TEMPLATE_DIR),
            dry_run: false,
        }
    }
}

/// Parse one `key=value` import parameter
pub fn parse_key_value(s: &str) -> Result<(String, String)> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(Error::Configuration(format!(
            "invalid parameter {:?}: expected key=value",
            s
        ))),
    }
}
