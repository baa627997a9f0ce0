//! Template resolution
//!
//! - [`token`]: `${token}` substitution over a [`ParameterSet`]
//! - [`store`]: where volume handle templates come from

pub mod store;
pub mod token;

pub use store::*;
pub use token::*;
