pub mod null;
pub mod scripted;

#[cfg(feature = "backend-tract")]
pub mod tract;

pub use null::NullBackend;
pub use scripted::ScriptedBackend;

#[cfg(feature = "backend-tract")]
pub use tract::TractBackend;

use anyhow::{anyhow, Result};

use super::registry::BackendRegistry;
use crate::config::DetectorSettings;

/// Backend names accepted in configuration.
pub const KNOWN_BACKENDS: &[&str] = &["none", "scripted", "tract"];

/// Build the detector registry for a run. The configured backend becomes the
/// default; `none` is always registered as well.
///
/// A missing model or script is fatal: monitoring must not start without the
/// detector it was configured with.
pub fn build_registry(settings: &DetectorSettings) -> Result<BackendRegistry> {
    let mut registry = BackendRegistry::new();
    registry.register(NullBackend);
    match settings.backend.as_str() {
        "none" => {}
        "scripted" => {
            let path = settings
                .script_path
                .as_ref()
                .ok_or_else(|| anyhow!("scripted detector requires detector.script_path"))?;
            registry.register(ScriptedBackend::from_path(path)?);
        }
        "tract" => register_tract(&mut registry, settings)?,
        other => return Err(anyhow!("unknown detector backend '{}'", other)),
    }
    registry.set_default(&settings.backend)?;
    Ok(registry)
}

#[cfg(feature = "backend-tract")]
fn register_tract(registry: &mut BackendRegistry, settings: &DetectorSettings) -> Result<()> {
    let path = settings
        .model_path
        .as_ref()
        .ok_or_else(|| anyhow!("tract detector requires detector.model_path"))?;
    let backend = TractBackend::new(path, settings.input_width, settings.input_height)?
        .with_thresholds(settings.confidence_threshold, settings.nms_threshold);
    registry.register(backend);
    Ok(())
}

#[cfg(not(feature = "backend-tract"))]
fn register_tract(_registry: &mut BackendRegistry, _settings: &DetectorSettings) -> Result<()> {
    Err(anyhow!("tract detector requires the backend-tract feature"))
}
