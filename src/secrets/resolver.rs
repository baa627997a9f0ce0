//! Secret Reference Resolver
//!
//! Resolves the secret namespace/name templates a StorageClass declares for
//! one [`SecretCategory`] into a concrete `SecretReference`.
//!
//! Tokens available to the namespace template:
//! - `${pv.name}`
//! - `${pvc.namespace}`
//!
//! The name template additionally sees `${pvc.name}` and
//! `${pvc.annotations['<key>']}` for every annotation on the claim.

use super::category::SecretCategory;
use crate::error::{Error, Result};
use crate::template::ParameterSet;
use crate::validation::is_dns1123_subdomain;
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, SecretReference};
use std::collections::BTreeMap;
use tracing::debug;

pub const TOKEN_PV_NAME: &str = "pv.name";
pub const TOKEN_PVC_NAME: &str = "pvc.name";
pub const TOKEN_PVC_NAMESPACE: &str = "pvc.namespace";

/// Token under which a claim annotation value is visible to name templates
pub fn annotation_token(key: &str) -> String {
    format!("pvc.annotations['{}']", key)
}

/// Which half of a secret reference a template produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretField {
    Namespace,
    Name,
}

impl std::fmt::Display for SecretField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretField::Namespace => write!(f, "namespace"),
            SecretField::Name => write!(f, "name"),
        }
    }
}

// =============================================================================
// Claim Context
// =============================================================================

/// The parts of a claim that secret templates may refer to
#[derive(Debug, Clone, Copy)]
pub struct ClaimContext<'a> {
    pub name: &'a str,
    pub namespace: &'a str,
    pub annotations: Option<&'a BTreeMap<String, String>>,
}

impl<'a> ClaimContext<'a> {
    pub fn from_claim(claim: &'a PersistentVolumeClaim) -> Self {
        let meta = &claim.metadata;
        Self {
            name: meta.name.as_deref().unwrap_or_default(),
            namespace: meta.namespace.as_deref().unwrap_or_default(),
            annotations: meta.annotations.as_ref(),
        }
    }

    /// Tokens for namespace templates
    fn namespace_tokens(&self, pv_name: &str) -> ParameterSet {
        let mut tokens = ParameterSet::new();
        tokens
            .insert(TOKEN_PV_NAME, pv_name)
            .insert(TOKEN_PVC_NAMESPACE, self.namespace);
        tokens
    }

    /// Tokens for name templates
    fn name_tokens(&self, pv_name: &str) -> ParameterSet {
        let mut tokens = self.namespace_tokens(pv_name);
        tokens.insert(TOKEN_PVC_NAME, self.name);
        for (key, value) in self.annotations.into_iter().flatten() {
            tokens.insert(annotation_token(key), value.as_str());
        }
        tokens
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Namespace and name templates for a category, if the StorageClass
/// configures both. Configuring only one of them is an error.
pub fn secret_templates(
    params: &BTreeMap<String, String>,
    category: SecretCategory,
) -> Result<Option<(&str, &str)>> {
    let keys = category.keys();
    match (keys.namespace.lookup(params), keys.name.lookup(params)) {
        (Some(namespace), Some(name)) => Ok(Some((namespace, name))),
        (None, None) => Ok(None),
        (namespace, name) => Err(Error::InconsistentSecretConfig {
            category,
            namespace: namespace.map(str::to_string),
            name: name.map(str::to_string),
        }),
    }
}

/// Resolve the secret reference of `category` for the volume `pv_name`.
///
/// Returns `Ok(None)` when the StorageClass does not configure this category,
/// or configures it with an empty namespace or name template.
pub fn resolve_secret(
    params: &BTreeMap<String, String>,
    category: SecretCategory,
    pv_name: &str,
    claim: &ClaimContext<'_>,
) -> Result<Option<SecretReference>> {
    let Some((namespace_template, name_template)) = secret_templates(params, category)? else {
        return Ok(None);
    };
    if namespace_template.is_empty() || name_template.is_empty() {
        debug!(category = %category, "Secret template is empty, no secret attached");
        return Ok(None);
    }

    let namespace = resolve_field(
        SecretField::Namespace,
        namespace_template,
        &claim.namespace_tokens(pv_name),
    )?;
    let name = resolve_field(SecretField::Name, name_template, &claim.name_tokens(pv_name))?;

    debug!(
        category = %category,
        namespace = %namespace,
        name = %name,
        "Resolved secret reference"
    );

    Ok(Some(SecretReference {
        namespace: Some(namespace),
        name: Some(name),
    }))
}

fn resolve_field(field: SecretField, template: &str, tokens: &ParameterSet) -> Result<String> {
    let resolved = tokens.resolve(template)?;
    if !is_dns1123_subdomain(&resolved) {
        return Err(Error::InvalidSecretName {
            field,
            template: template.to_string(),
            resolved,
        });
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    const NODE_STAGE_NS: &str = "csi.storage.k8s.io/node-stage-secret-namespace";
    const NODE_STAGE_NAME: &str = "csi.storage.k8s.io/node-stage-secret-name";

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn claim(annotations: &[(&str, &str)]) -> PersistentVolumeClaim {
        PersistentVolumeClaim {
            metadata: ObjectMeta {
                name: Some("foo".into()),
                namespace: Some("ns1".into()),
                annotations: if annotations.is_empty() {
                    None
                } else {
                    Some(params(annotations))
                },
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn resolve(
        sc_params: &[(&str, &str)],
        annotations: &[(&str, &str)],
    ) -> Result<Option<SecretReference>> {
        let pvc = claim(annotations);
        resolve_secret(
            &params(sc_params),
            SecretCategory::NodeStage,
            "pv-foo",
            &ClaimContext::from_claim(&pvc),
        )
    }

    fn reference(namespace: &str, name: &str) -> SecretReference {
        SecretReference {
            namespace: Some(namespace.into()),
            name: Some(name.into()),
        }
    }

    #[test]
    fn test_unconfigured_category_is_none() {
        let result = resolve(&[("csi.storage.k8s.io/fstype", "ext4")], &[]).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_only_one_template_is_an_error() {
        let err = resolve(&[(NODE_STAGE_NS, "${pvc.namespace}")], &[]).unwrap_err();
        assert_matches!(
            err,
            Error::InconsistentSecretConfig { category: SecretCategory::NodeStage, namespace: Some(_), name: None }
        );

        let err = resolve(&[("node-stage-secret-name", "creds")], &[]).unwrap_err();
        assert_matches!(
            err,
            Error::InconsistentSecretConfig { namespace: None, name: Some(_), .. }
        );
    }

    #[test]
    fn test_resolves_node_stage_secret() {
        let result = resolve(
            &[
                (NODE_STAGE_NS, "${pvc.namespace}"),
                (NODE_STAGE_NAME, "${pv.name}-stage"),
            ],
            &[],
        )
        .unwrap();
        assert_eq!(result, Some(reference("ns1", "pv-foo-stage")));
    }

    #[test]
    fn test_empty_templates_mean_no_secret() {
        for (namespace, name) in [("", ""), ("ns1", ""), ("", "creds")] {
            let result = resolve(&[(NODE_STAGE_NS, namespace), (NODE_STAGE_NAME, name)], &[]);
            assert_matches!(
                result,
                Ok(None),
                "namespace {namespace:?}, name {name:?} should attach no secret"
            );
        }

        let result = resolve(&[("node-stage-secret-namespace", ""), (NODE_STAGE_NAME, "creds")], &[]);
        assert_matches!(result, Ok(None));
    }

    #[test]
    fn test_deprecated_keys() {
        let result = resolve(
            &[
                ("node-stage-secret-namespace", "kube-system"),
                ("node-stage-secret-name", "${pvc.name}"),
            ],
            &[],
        )
        .unwrap();
        assert_eq!(result, Some(reference("kube-system", "foo")));
    }

    #[test]
    fn test_canonical_key_takes_precedence() {
        let result = resolve(
            &[
                (NODE_STAGE_NS, "${pvc.namespace}"),
                ("node-stage-secret-namespace", "other"),
                (NODE_STAGE_NAME, "creds"),
                ("node-stage-secret-name", "other-creds"),
            ],
            &[],
        )
        .unwrap();
        assert_eq!(result, Some(reference("ns1", "creds")));
    }

    #[test]
    fn test_annotation_token() {
        let sc = [
            (NODE_STAGE_NS, "${pvc.namespace}"),
            (NODE_STAGE_NAME, "${pvc.annotations['team']}-creds"),
        ];

        let result = resolve(&sc, &[("team", "platform")]).unwrap();
        assert_eq!(result, Some(reference("ns1", "platform-creds")));

        let err = resolve(&sc, &[]).unwrap_err();
        assert_matches!(
            err,
            Error::MissingTokens { tokens } if tokens == ["pvc.annotations['team']"]
        );
    }

    #[test]
    fn test_namespace_template_cannot_use_claim_name() {
        let sc = [(NODE_STAGE_NS, "${pvc.name}"), (NODE_STAGE_NAME, "creds")];
        let err = resolve(&sc, &[]).unwrap_err();
        assert_matches!(err, Error::MissingTokens { tokens } if tokens == ["pvc.name"]);

        let sc = [
            (NODE_STAGE_NS, "${pvc.annotations['team']}"),
            (NODE_STAGE_NAME, "creds"),
        ];
        let err = resolve(&sc, &[("team", "platform")]).unwrap_err();
        assert_matches!(
            err,
            Error::MissingTokens { tokens } if tokens == ["pvc.annotations['team']"]
        );
    }

    #[test]
    fn test_invalid_resolved_name() {
        let sc = [
            (NODE_STAGE_NS, "${pvc.namespace}"),
            (NODE_STAGE_NAME, "${pvc.annotations['owner']}"),
        ];
        let err = resolve(&sc, &[("owner", "My_Secret")]).unwrap_err();
        assert_matches!(
            err,
            Error::InvalidSecretName { field: SecretField::Name, template, resolved }
                if template == "${pvc.annotations['owner']}" && resolved == "My_Secret"
        );
    }

    #[test]
    fn test_invalid_resolved_namespace() {
        let sc = [(NODE_STAGE_NS, "-${pvc.namespace}"), (NODE_STAGE_NAME, "creds")];
        let err = resolve(&sc, &[]).unwrap_err();
        assert_matches!(
            err,
            Error::InvalidSecretName { field: SecretField::Namespace, .. }
        );
    }

    #[test]
    fn test_categories_are_independent() {
        let sc = params(&[
            ("csi.storage.k8s.io/node-publish-secret-namespace", "ns-a"),
            ("csi.storage.k8s.io/node-publish-secret-name", "publish"),
            ("controller-expand-secret-namespace", "ns-b"),
            ("controller-expand-secret-name", "expand"),
        ]);
        let pvc = claim(&[]);
        let ctx = ClaimContext::from_claim(&pvc);

        let resolved: Vec<_> = SecretCategory::ALL
            .iter()
            .map(|c| resolve_secret(&sc, *c, "pv-foo", &ctx).unwrap())
            .collect();
        assert_eq!(
            resolved,
            vec![
                None,
                None,
                None,
                Some(reference("ns-a", "publish")),
                Some(reference("ns-b", "expand")),
            ]
        );
    }
}
