//! Volume Importer
//!
//! Imports a pre-existing CSI volume into Kubernetes as a bound
//! PersistentVolume/PersistentVolumeClaim pair.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         VolumeImporter                           │
//! │   claim manifest + StorageClass + key=value import parameters    │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌────────────────────┐   ┌──────────────────────────────────┐   │
//! │  │   Volume Handle    │   │   Secret Reference Resolver      │   │
//! │  │   (per driver)     │   │   (5 categories, DNS-1123)       │   │
//! │  └─────────┬──────────┘   └────────────────┬─────────────────┘   │
//! │            └──────────────┬────────────────┘                     │
//! │                 ┌─────────┴─────────┐                            │
//! │                 │  Token Resolver   │                            │
//! │                 │   ${token} → val  │                            │
//! │                 └───────────────────┘                            │
//! ├──────────────────────────────────────────────────────────────────┤
//! │   VolumeBuilder → create PersistentVolume → create Claim         │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`template`]: `${token}` resolution and volume handle template stores
//! - [`handle`]: volume handle derivation
//! - [`secrets`]: CSI secret reference resolution
//! - [`validation`]: DNS-1123 name checks
//! - [`controlplane`]: claim loading, volume construction, Kubernetes calls
//! - [`domain`]: collaborator traits
//! - [`config`]: importer configuration
//! - [`error`]: Error types and handling

pub mod config;
pub mod controlplane;
pub mod domain;
pub mod error;
pub mod handle;
pub mod secrets;
pub mod template;
pub mod validation;

// Re-export commonly used types
pub use config::ImporterConfig;

pub use controlplane::{
    load_claim, AttachedSecrets, ImportOutcome, ImportPlan, ImportRequest, KubeCluster,
    VolumeBuilder, VolumeImporter,
};

pub use domain::ports::{ClusterClient, TemplateStore};

pub use error::{Error, Result};

pub use handle::derive_volume_handle;

pub use secrets::{resolve_secret, ClaimContext, SecretCategory, SecretField};

pub use template::{FsTemplateStore, ParameterSet, StaticTemplateStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
