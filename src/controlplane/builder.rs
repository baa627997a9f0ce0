//! PersistentVolume construction
//!
//! [`VolumeBuilder`] moves through three stages, so a volume can only be
//! built once its handle and its secret references are known:
//!
//! ```text
//! Pending --with_handle--> Identified --resolve_secrets--> Secured --build--> PersistentVolume
//! ```

use crate::error::{Error, Result};
use crate::secrets::{resolve_secret, ClaimContext, SecretCategory};
use k8s_openapi::api::core::v1::{
    CSIPersistentVolumeSource, ObjectReference, PersistentVolume, PersistentVolumeClaim,
    PersistentVolumeSpec, SecretReference,
};
use k8s_openapi::api::storage::v1::StorageClass;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use tracing::debug;

/// Prefix of the generated PersistentVolume name
pub const PV_NAME_PREFIX: &str = "pv-";

/// StorageClass parameters under this prefix are directives for the CSI
/// sidecars, not driver attributes.
pub const CSI_PARAMETER_PREFIX: &str = "csi.storage.k8s.io/";

/// StorageClass parameter holding the filesystem type
pub const FS_TYPE_KEY: &str = "csi.storage.k8s.io/fsType";

pub const PROVISIONED_BY_ANNOTATION: &str = "pv.kubernetes.io/provisioned-by";

const VOLUME_MODE_BLOCK: &str = "Block";
const RESOURCE_STORAGE: &str = "storage";

// =============================================================================
// Claim Accessors
// =============================================================================

/// Name of the PersistentVolume created for `claim`
pub fn volume_name_for(claim: &PersistentVolumeClaim) -> String {
    format!(
        "{}{}",
        PV_NAME_PREFIX,
        claim.metadata.name.as_deref().unwrap_or_default()
    )
}

/// The claim's `spec.storageClassName`, which must be set
pub fn storage_class_name(claim: &PersistentVolumeClaim) -> Result<&str> {
    claim
        .spec
        .as_ref()
        .and_then(|spec| spec.storage_class_name.as_deref())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            Error::Configuration(format!(
                "claim {:?} does not set spec.storageClassName",
                claim.metadata.name.as_deref().unwrap_or_default()
            ))
        })
}

/// The claim's `spec.resources.requests.storage`, which must be set
pub fn requested_storage(claim: &PersistentVolumeClaim) -> Result<Quantity> {
    claim
        .spec
        .as_ref()
        .and_then(|spec| spec.resources.as_ref())
        .and_then(|resources| resources.requests.as_ref())
        .and_then(|requests| requests.get(RESOURCE_STORAGE))
        .cloned()
        .ok_or_else(|| {
            Error::Configuration(format!(
                "claim {:?} does not request storage",
                claim.metadata.name.as_deref().unwrap_or_default()
            ))
        })
}

fn is_block_mode(claim: &PersistentVolumeClaim) -> bool {
    claim
        .spec
        .as_ref()
        .and_then(|spec| spec.volume_mode.as_deref())
        == Some(VOLUME_MODE_BLOCK)
}

/// Filesystem type for the CSI source; empty for raw block claims
pub fn fs_type(claim: &PersistentVolumeClaim, params: &BTreeMap<String, String>) -> String {
    if is_block_mode(claim) {
        return String::new();
    }
    params.get(FS_TYPE_KEY).cloned().unwrap_or_default()
}

/// StorageClass parameters passed to the driver as volume attributes
pub fn volume_attributes(params: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    params
        .iter()
        .filter(|(key, _)| !key.starts_with(CSI_PARAMETER_PREFIX))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

// =============================================================================
// Attached Secrets
// =============================================================================

/// Secret references carried by a CSI PersistentVolume
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttachedSecrets {
    pub controller_publish: Option<SecretReference>,
    pub node_stage: Option<SecretReference>,
    pub node_publish: Option<SecretReference>,
    pub controller_expand: Option<SecretReference>,
}

impl AttachedSecrets {
    /// Resolve every category a PersistentVolume can reference.
    ///
    /// The provisioner secret is only used at creation time by the external
    /// provisioner, so an imported volume has no slot for it.
    pub fn resolve(
        params: &BTreeMap<String, String>,
        pv_name: &str,
        claim: &ClaimContext<'_>,
    ) -> Result<Self> {
        Ok(Self {
            controller_publish: resolve_secret(
                params,
                SecretCategory::ControllerPublish,
                pv_name,
                claim,
            )?,
            node_stage: resolve_secret(params, SecretCategory::NodeStage, pv_name, claim)?,
            node_publish: resolve_secret(params, SecretCategory::NodePublish, pv_name, claim)?,
            controller_expand: resolve_secret(
                params,
                SecretCategory::ControllerExpand,
                pv_name,
                claim,
            )?,
        })
    }
}

// =============================================================================
// Volume Builder
// =============================================================================

/// Nothing resolved yet
#[derive(Debug)]
pub struct Pending;

/// Volume handle known
#[derive(Debug)]
pub struct Identified {
    volume_handle: String,
}

/// Volume handle and secrets known
#[derive(Debug)]
pub struct Secured {
    volume_handle: String,
    secrets: AttachedSecrets,
}

/// Staged builder for the PersistentVolume of an imported claim
#[derive(Debug)]
pub struct VolumeBuilder<'a, S> {
    claim: &'a PersistentVolumeClaim,
    class: &'a StorageClass,
    volume_name: String,
    capacity: Quantity,
    stage: S,
}

impl<'a, S> VolumeBuilder<'a, S> {
    pub fn volume_name(&self) -> &str {
        &self.volume_name
    }

    fn parameters(&self) -> &'a BTreeMap<String, String> {
        static EMPTY: BTreeMap<String, String> = BTreeMap::new();
        self.class.parameters.as_ref().unwrap_or(&EMPTY)
    }

    fn advance<T>(self, stage: T) -> VolumeBuilder<'a, T> {
        VolumeBuilder {
            claim: self.claim,
            class: self.class,
            volume_name: self.volume_name,
            capacity: self.capacity,
            stage,
        }
    }
}

impl<'a> VolumeBuilder<'a, Pending> {
    /// Start building the volume for `claim`, which must request storage
    pub fn new(claim: &'a PersistentVolumeClaim, class: &'a StorageClass) -> Result<Self> {
        Ok(Self {
            claim,
            class,
            volume_name: volume_name_for(claim),
            capacity: requested_storage(claim)?,
            stage: Pending,
        })
    }

    pub fn with_handle(self, volume_handle: String) -> VolumeBuilder<'a, Identified> {
        self.advance(Identified { volume_handle })
    }
}

impl<'a> VolumeBuilder<'a, Identified> {
    pub fn resolve_secrets(self) -> Result<VolumeBuilder<'a, Secured>> {
        let secrets = AttachedSecrets::resolve(
            self.parameters(),
            &self.volume_name,
            &ClaimContext::from_claim(self.claim),
        )?;
        let volume_handle = self.stage.volume_handle.clone();
        Ok(self.advance(Secured {
            volume_handle,
            secrets,
        }))
    }
}

impl<'a> VolumeBuilder<'a, Secured> {
    pub fn secrets(&self) -> &AttachedSecrets {
        &self.stage.secrets
    }

    pub fn build(self) -> Result<PersistentVolume> {
        let params = self.parameters();
        let storage_class = storage_class_name(self.claim)?.to_string();
        let claim_spec = self.claim.spec.as_ref();
        let fs_type = fs_type(self.claim, params);
        let attributes = volume_attributes(params);
        let Secured {
            volume_handle,
            secrets,
        } = self.stage;

        debug!(
            volume = %self.volume_name,
            handle = %volume_handle,
            fs_type = %fs_type,
            attributes = attributes.len(),
            "Building PersistentVolume"
        );

        Ok(PersistentVolume {
            metadata: ObjectMeta {
                name: Some(self.volume_name),
                annotations: Some(BTreeMap::from([(
                    PROVISIONED_BY_ANNOTATION.to_string(),
                    self.class.provisioner.clone(),
                )])),
                ..Default::default()
            },
            spec: Some(PersistentVolumeSpec {
                storage_class_name: Some(storage_class),
                capacity: Some(BTreeMap::from([(
                    RESOURCE_STORAGE.to_string(),
                    self.capacity,
                )])),
                access_modes: claim_spec.and_then(|spec| spec.access_modes.clone()),
                volume_mode: claim_spec.and_then(|spec| spec.volume_mode.clone()),
                claim_ref: Some(ObjectReference {
                    api_version: Some("v1".to_string()),
                    kind: Some("PersistentVolumeClaim".to_string()),
                    namespace: self.claim.metadata.namespace.clone(),
                    name: self.claim.metadata.name.clone(),
                    ..Default::default()
                }),
                csi: Some(CSIPersistentVolumeSource {
                    driver: self.class.provisioner.clone(),
                    volume_handle,
                    controller_publish_secret_ref: secrets.controller_publish,
                    node_stage_secret_ref: secrets.node_stage,
                    node_publish_secret_ref: secrets.node_publish,
                    controller_expand_secret_ref: secrets.controller_expand,
                    volume_attributes: (!attributes.is_empty()).then_some(attributes),
                    fs_type: (!fs_type.is_empty()).then_some(fs_type),
                    read_only: Some(false),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        })
    }
}
