//! Domain Ports - Collaborator trait definitions for the importer
//!
//! The resolution engine is pure; everything that touches the outside world
//! (template files, the Kubernetes API) sits behind one of these traits so
//! the importer can be driven by in-memory fakes.

use crate::error::Result;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{PersistentVolume, PersistentVolumeClaim};
use k8s_openapi::api::storage::v1::StorageClass;
use std::sync::Arc;

// =============================================================================
// Template Store Port
// =============================================================================

/// Source of per-driver volume handle templates
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Raw template document for `driver`, or `None` if there is none
    async fn load(&self, driver: &str) -> Result<Option<Vec<u8>>>;
}

// =============================================================================
// Cluster Client Port
// =============================================================================

/// The control-plane calls the importer makes.
///
/// Implementations return backend failures unmodified and never retry.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Fetch a cluster-scoped StorageClass by name
    async fn get_storage_class(&self, name: &str) -> Result<StorageClass>;

    /// Create a PersistentVolume
    async fn create_volume(&self, volume: &PersistentVolume) -> Result<PersistentVolume>;

    /// Create a PersistentVolumeClaim in `namespace`
    async fn create_claim(
        &self,
        namespace: &str,
        claim: &PersistentVolumeClaim,
    ) -> Result<PersistentVolumeClaim>;
}

// =============================================================================
// Type Aliases for Arc'd Traits
// =============================================================================

pub type TemplateStoreRef = Arc<dyn TemplateStore>;
pub type ClusterClientRef = Arc<dyn ClusterClient>;
