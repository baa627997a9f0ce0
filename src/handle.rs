//! Volume Handle Deriver
//!
//! Turns the import parameters given on the command line into the
//! driver-specific `volumeHandle` of the CSI volume source. Each driver has
//! its own template, e.g. `${pool}/${image}` for an RBD-style driver.

use crate::domain::ports::TemplateStore;
use crate::error::{Error, Result};
use crate::template::ParameterSet;
use tracing::debug;

/// Derive the volume handle for `driver` from the caller's import parameters.
///
/// Only `params` is visible to the template. The result is opaque and is not
/// validated further.
pub async fn derive_volume_handle(
    store: &dyn TemplateStore,
    driver: &str,
    params: &ParameterSet,
) -> Result<String> {
    let raw = store
        .load(driver)
        .await?
        .ok_or_else(|| Error::TemplateNotFound {
            driver: driver.to_string(),
        })?;

    let template = String::from_utf8(raw).map_err(|e| {
        Error::Configuration(format!(
            "volume handle template for driver {:?} is not valid UTF-8: {}",
            driver, e
        ))
    })?;
    let template = strip_trailing_newline(&template);

    debug!(driver = %driver, template = %template, "Resolving volume handle");
    params.resolve(template)
}

fn strip_trailing_newline(s: &str) -> &str {
    s.strip_suffix("\r\n")
        .or_else(|| s.strip_suffix('\n'))
        .unwrap_or(s)
}
