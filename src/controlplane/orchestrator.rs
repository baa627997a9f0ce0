//! Volume Importer
//!
//! Coordinates one import:
//! - Resolve the claim's StorageClass
//! - Derive the volume handle and secret references
//! - Create the PersistentVolume, then the PersistentVolumeClaim
//!
//! Planning has no side effects on the cluster. Applying makes exactly two
//! create calls and does not roll back the volume if the claim fails.

use crate::config::ImporterConfig;
use crate::controlplane::builder::{storage_class_name, VolumeBuilder};
use crate::controlplane::cluster::KubeCluster;
use crate::domain::ports::{ClusterClientRef, TemplateStoreRef};
use crate::error::Result;
use crate::handle::derive_volume_handle;
use crate::template::{FsTemplateStore, ParameterSet};
use k8s_openapi::api::core::v1::{PersistentVolume, PersistentVolumeClaim};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

// =============================================================================
// Request / Plan / Outcome
// =============================================================================

/// What to import
#[derive(Debug, Clone)]
pub struct ImportRequest {
    /// Claim definition as read from the manifest
    pub claim: PersistentVolumeClaim,
    /// Caller-supplied tokens for the volume handle template
    pub parameters: ParameterSet,
}

/// Fully resolved objects, ready to be created
#[derive(Debug, Clone, Serialize)]
pub struct ImportPlan {
    pub volume: PersistentVolume,
    pub claim: PersistentVolumeClaim,
}

impl ImportPlan {
    pub fn volume_name(&self) -> &str {
        self.volume.metadata.name.as_deref().unwrap_or_default()
    }

    pub fn claim_name(&self) -> &str {
        self.claim.metadata.name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.claim.metadata.namespace.as_deref().unwrap_or_default()
    }
}

/// Objects created by a successful import
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub volume: PersistentVolume,
    pub claim: PersistentVolumeClaim,
}

// =============================================================================
// Importer
// =============================================================================

/// Imports existing CSI volumes as PersistentVolume/PersistentVolumeClaim pairs
pub struct VolumeImporter {
    /// Namespace the claim is created in
    namespace: String,
    cluster: ClusterClientRef,
    templates: TemplateStoreRef,
}

impl VolumeImporter {
    pub fn new(
        namespace: impl Into<String>,
        cluster: ClusterClientRef,
        templates: TemplateStoreRef,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            cluster,
            templates,
        }
    }

    /// Connect to the cluster and read templates from the configured directory
    pub async fn from_config(config: &ImporterConfig) -> Result<Self> {
        let cluster = KubeCluster::connect(config.kubeconfig.as_deref()).await?;
        let templates = FsTemplateStore::new(&config.template_dir);
        info!(
            namespace = %config.namespace,
            template_dir = %templates.root().display(),
            "Importer initialized"
        );
        Ok(Self::new(
            config.namespace.clone(),
            Arc::new(cluster),
            Arc::new(templates),
        ))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Resolve everything needed for the import without creating anything
    pub async fn plan(&self, request: ImportRequest) -> Result<ImportPlan> {
        let ImportRequest {
            mut claim,
            parameters,
        } = request;

        // Secret templates see the namespace the claim is created in.
        claim.metadata.namespace = Some(self.namespace.clone());

        let class_name = storage_class_name(&claim)?;
        info!(
            claim = claim.metadata.name.as_deref().unwrap_or_default(),
            namespace = %self.namespace,
            storage_class = %class_name,
            "Planning volume import"
        );
        let class = self.cluster.get_storage_class(class_name).await?;

        let builder = VolumeBuilder::new(&claim, &class)?;
        let volume_handle =
            derive_volume_handle(self.templates.as_ref(), &class.provisioner, &parameters).await?;
        info!(
            volume = %builder.volume_name(),
            driver = %class.provisioner,
            handle = %volume_handle,
            "Derived volume handle"
        );

        let volume = builder
            .with_handle(volume_handle)
            .resolve_secrets()?
            .build()?;

        Ok(ImportPlan { volume, claim })
    }

    /// Create the planned volume, then the planned claim
    pub async fn apply(&self, plan: ImportPlan) -> Result<ImportOutcome> {
        info!(volume = %plan.volume_name(), "Creating PersistentVolume");
        let volume = self.cluster.create_volume(&plan.volume).await?;

        info!(
            claim = %plan.claim_name(),
            namespace = %plan.namespace(),
            "Creating PersistentVolumeClaim"
        );
        let claim = match self.cluster.create_claim(plan.namespace(), &plan.claim).await {
            Ok(claim) => claim,
            Err(e) => {
                warn!(
                    volume = %plan.volume_name(),
                    error = %e,
                    "PersistentVolumeClaim creation failed; PersistentVolume was left in place"
                );
                return Err(e);
            }
        };

        info!(
            volume = %plan.volume_name(),
            claim = %plan.claim_name(),
            "Volume imported"
        );
        Ok(ImportOutcome { volume, claim })
    }

    /// Plan and apply
    pub async fn import(&self, request: ImportRequest) -> Result<ImportOutcome> {
        let plan = self.plan(request).await?;
        self.apply(plan).await
    }
}
