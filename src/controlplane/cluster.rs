//! Kubernetes API adapter
//!
//! Implements [`ClusterClient`] on top of a kube-rs client.

use crate::domain::ports::ClusterClient;
use crate::error::{Error, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{PersistentVolume, PersistentVolumeClaim};
use k8s_openapi::api::storage::v1::StorageClass;
use kube::api::{Api, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::Path;
use tracing::{debug, info};

/// [`ClusterClient`] backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using the kubeconfig at `kubeconfig`, or infer the
    /// configuration (in-cluster, then `~/.kube/config`) when none is given.
    pub async fn connect(kubeconfig: Option<&Path>) -> Result<Self> {
        let client = match kubeconfig {
            Some(path) => {
                info!(kubeconfig = %path.display(), "Loading kubeconfig");
                let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                    Error::Configuration(format!(
                        "failed to read kubeconfig {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                let config =
                    Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                        .await
                        .map_err(|e| {
                            Error::Configuration(format!("invalid kubeconfig: {}", e))
                        })?;
                Client::try_from(config)?
            }
            None => {
                debug!("No kubeconfig given, inferring cluster configuration");
                Client::try_default().await?
            }
        };
        Ok(Self::new(client))
    }
}

#[async_trait]
impl ClusterClient for KubeCluster {
    async fn get_storage_class(&self, name: &str) -> Result<StorageClass> {
        let classes: Api<StorageClass> = Api::all(self.client.clone());
        Ok(classes.get(name).await?)
    }

    async fn create_volume(&self, volume: &PersistentVolume) -> Result<PersistentVolume> {
        let volumes: Api<PersistentVolume> = Api::all(self.client.clone());
        Ok(volumes.create(&PostParams::default(), volume).await?)
    }

    async fn create_claim(
        &self,
        namespace: &str,
        claim: &PersistentVolumeClaim,
    ) -> Result<PersistentVolumeClaim> {
        let claims: Api<PersistentVolumeClaim> = Api::namespaced(self.client.clone(), namespace);
        Ok(claims.create(&PostParams::default(), claim).await?)
    }
}
