//! PersistentVolumeClaim definition files
//!
//! The claim to import is read from a YAML (or JSON) manifest.

use crate::error::{Error, Result};
use k8s_openapi::api::core::v1::PersistentVolumeClaim;
use std::path::Path;
use tracing::debug;

const CLAIM_KIND: &str = "PersistentVolumeClaim";

/// Read and decode the claim manifest at `path`
pub async fn load_claim(path: &Path) -> Result<PersistentVolumeClaim> {
    let document = tokio::fs::read_to_string(path).await?;
    let claim = parse_claim(&document).map_err(|reason| Error::ClaimParse {
        path: path.to_path_buf(),
        reason,
    })?;

    debug!(
        path = %path.display(),
        name = claim.metadata.name.as_deref().unwrap_or_default(),
        "Loaded claim definition"
    );
    Ok(claim)
}

fn parse_claim(document: &str) -> std::result::Result<PersistentVolumeClaim, String> {
    let value: serde_yaml::Value = serde_yaml::from_str(document).map_err(|e| e.to_string())?;

    match value.get("kind").and_then(serde_yaml::Value::as_str) {
        Some(CLAIM_KIND) => {}
        Some(other) => return Err(format!("resource type is not {}: {}", CLAIM_KIND, other)),
        None => return Err("manifest has no kind".to_string()),
    }

    let claim: PersistentVolumeClaim = serde_yaml::from_value(value).map_err(|e| e.to_string())?;
    if claim.metadata.name.as_deref().unwrap_or_default().is_empty() {
        return Err("claim has no metadata.name".to_string());
    }
    Ok(claim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    const CLAIM_YAML: &str = r#"
apiVersion: v1
kind: PersistentVolumeClaim
metadata:
  name: data
  annotations:
    team: platform
spec:
  storageClassName: fast
  accessModes: ["ReadWriteOnce"]
  resources:
    requests:
      storage: 10Gi
"#;

    async fn load(contents: &str) -> Result<PersistentVolumeClaim> {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("claim.yaml");
        std::fs::write(&path, contents).unwrap();
        load_claim(&path).await
    }

    #[tokio::test]
    async fn test_load_yaml_claim() {
        let claim = load(CLAIM_YAML).await.unwrap();
        assert_eq!(claim.metadata.name.as_deref(), Some("data"));
        assert_eq!(
            claim.metadata.annotations.unwrap().get("team").map(String::as_str),
            Some("platform")
        );

        let spec = claim.spec.unwrap();
        assert_eq!(spec.storage_class_name.as_deref(), Some("fast"));
        let storage = spec.resources.unwrap().requests.unwrap()["storage"].clone();
        assert_eq!(storage.0, "10Gi");
    }

    #[tokio::test]
    async fn test_load_json_claim() {
        let json = r#"{"apiVersion":"v1","kind":"PersistentVolumeClaim","metadata":{"name":"data"},"spec":{"storageClassName":"fast"}}"#;
        let claim = load(json).await.unwrap();
        assert_eq!(claim.metadata.name.as_deref(), Some("data"));
    }

    #[tokio::test]
    async fn test_rejects_other_kinds() {
        let err = load("apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: x\n")
            .await
            .unwrap_err();
        assert_matches!(err, Error::ClaimParse { reason, .. } if reason.contains("ConfigMap"));
    }

    #[tokio::test]
    async fn test_rejects_nameless_claim() {
        let err = load("apiVersion: v1\nkind: PersistentVolumeClaim\nspec: {}\n")
            .await
            .unwrap_err();
        assert_matches!(err, Error::ClaimParse { .. });
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = load_claim(Path::new("/nonexistent/claim.yaml"))
            .await
            .unwrap_err();
        assert_matches!(err, Error::Io(_));
    }
}
