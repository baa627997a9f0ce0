//! CSI secret references
//!
//! - [`category`]: the five secret roles and their StorageClass keys
//! - [`resolver`]: template resolution and validation of secret references

pub mod category;
pub mod resolver;

pub use category::*;
pub use resolver::*;
