//! Control plane integration
//!
//! Everything between the resolvers and the Kubernetes API: reading the
//! claim manifest, assembling the PersistentVolume and creating both objects.

pub mod builder;
pub mod claim;
pub mod cluster;
pub mod orchestrator;

pub use builder::*;
pub use claim::*;
pub use cluster::*;
pub use orchestrator::*;
