//! Domain layer - port definitions
//!
//! This module defines the traits that adapters implement, following
//! hexagonal architecture principles.

pub mod ports;

pub use ports::*;
