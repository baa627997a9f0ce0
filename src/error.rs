//! Error types for the volume importer
//!
//! Every resolution step and every control-plane call returns this error.
//! None of them are retried: the importer runs once and the first failure
//! ends the run.

use crate::secrets::{SecretCategory, SecretField};
use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for the importer
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Template Resolution Errors
    // =========================================================================
    #[error("invalid tokens: {tokens:?}")]
    MissingTokens { tokens: Vec<String> },

    #[error("no volume handle template found for driver {driver:?}")]
    TemplateNotFound { driver: String },

    // =========================================================================
    // Secret Reference Errors
    // =========================================================================
    #[error(
        "only namespace or name is found for {category} secret, namespace {namespace:?}, name {name:?}"
    )]
    InconsistentSecretConfig {
        category: SecretCategory,
        namespace: Option<String>,
        name: Option<String>,
    },

    #[error("secret {field} template {template:?} is resolved to {resolved:?}, but is not a valid dns name")]
    InvalidSecretName {
        field: SecretField,
        template: String,
        resolved: String,
    },

    // =========================================================================
    // Input Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("failed to parse claim file {path:?}: {reason}")]
    ClaimParse { path: PathBuf, reason: String },

    // =========================================================================
    // Kubernetes Errors
    // =========================================================================
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a missing-token error; the token list is sorted and deduplicated.
    pub fn missing_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        tokens.sort();
        tokens.dedup();
        Error::MissingTokens { tokens }
    }

    /// True when the operator has to fix inputs (templates, storage class
    /// parameters, flags) rather than the cluster.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Error::MissingTokens { .. }
                | Error::TemplateNotFound { .. }
                | Error::InconsistentSecretConfig { .. }
                | Error::InvalidSecretName { .. }
                | Error::Configuration(_)
                | Error::ClaimParse { .. }
        )
    }
}

/// Result type alias for the importer
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tokens_sorted() {
        let err = Error::missing_tokens(["size", "pool", "size"]);
        match &err {
            Error::MissingTokens { tokens } => assert_eq!(tokens, &["pool", "size"]),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.to_string(), r#"invalid tokens: ["pool", "size"]"#);
    }

    #[test]
    fn test_error_classification() {
        let err = Error::TemplateNotFound {
            driver: "hostpath.csi.k8s.io".into(),
        };
        assert!(err.is_config_error());

        let err = Error::ClaimParse {
            path: PathBuf::from("claim.yaml"),
            reason: "resource type is not PersistentVolumeClaim: ConfigMap".into(),
        };
        assert!(err.is_config_error());

        let err = Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert!(!err.is_config_error());
    }

    #[test]
    fn test_inconsistent_secret_message() {
        let err = Error::InconsistentSecretConfig {
            category: SecretCategory::NodeStage,
            namespace: Some("${pvc.namespace}".into()),
            name: None,
        };
        assert_eq!(
            err.to_string(),
            r#"only namespace or name is found for NodeStage secret, namespace Some("${pvc.namespace}"), name None"#
        );
    }
}
