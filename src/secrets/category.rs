//! Secret categories and their StorageClass parameter keys

use std::collections::BTreeMap;

/// The role a secret plays in the CSI volume lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SecretCategory {
    Provisioner,
    ControllerPublish,
    NodeStage,
    NodePublish,
    ControllerExpand,
}

impl std::fmt::Display for SecretCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretCategory::Provisioner => write!(f, "Provisioner"),
            SecretCategory::ControllerPublish => write!(f, "ControllerPublish"),
            SecretCategory::NodeStage => write!(f, "NodeStage"),
            SecretCategory::NodePublish => write!(f, "NodePublish"),
            SecretCategory::ControllerExpand => write!(f, "ControllerExpand"),
        }
    }
}

/// A parameter key with its pre-`csi.storage.k8s.io/` spelling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterKey {
    pub canonical: &'static str,
    pub deprecated: &'static str,
}

impl ParameterKey {
    /// Value under the canonical key, else under the deprecated key
    pub fn lookup<'a>(&self, params: &'a BTreeMap<String, String>) -> Option<&'a str> {
        params
            .get(self.canonical)
            .or_else(|| params.get(self.deprecated))
            .map(String::as_str)
    }
}

/// Where a category's namespace and name templates live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretKeys {
    pub namespace: ParameterKey,
    pub name: ParameterKey,
}

macro_rules! secret_keys {
    ($role:literal) => {
        SecretKeys {
            namespace: ParameterKey {
                canonical: concat!("csi.storage.k8s.io/", $role, "-secret-namespace"),
                deprecated: concat!($role, "-secret-namespace"),
            },
            name: ParameterKey {
                canonical: concat!("csi.storage.k8s.io/", $role, "-secret-name"),
                deprecated: concat!($role, "-secret-name"),
            },
        }
    };
}

impl SecretCategory {
    pub const ALL: [SecretCategory; 5] = [
        SecretCategory::Provisioner,
        SecretCategory::ControllerPublish,
        SecretCategory::NodeStage,
        SecretCategory::NodePublish,
        SecretCategory::ControllerExpand,
    ];

    /// StorageClass parameter keys for this category
    pub const fn keys(self) -> SecretKeys {
        match self {
            SecretCategory::Provisioner => secret_keys!("provisioner"),
            SecretCategory::ControllerPublish => secret_keys!("controller-publish"),
            SecretCategory::NodeStage => secret_keys!("node-stage"),
            SecretCategory::NodePublish => secret_keys!("node-publish"),
            SecretCategory::ControllerExpand => secret_keys!("controller-expand"),
        }
    }
}
