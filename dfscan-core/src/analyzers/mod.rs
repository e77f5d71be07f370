// Signal Analyzers - independent per-image heuristics
//
// Six stateless analyzers, each producing one payload from a shared decoded image.
// Failures are returned as AnalysisError; the orchestrator turns them into
// neutral Error records.

use crate::error::AnalysisError;
use crate::input::DecodedImage;
use crate::types::{AnalyzerKey, SignalPayload};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod blur;
pub mod color;
pub mod exif;
pub mod kernels;
pub mod noise;
pub mod shadow;
pub mod texture;

pub use blur::{BlurAnalyzer, BlurConfig};
pub use color::{ColorAnalyzer, ColorConfig};
pub use exif::{ExifAnalyzer, ExifConfig};
pub use noise::{NoiseAnalyzer, NoiseConfig};
pub use shadow::{ShadowAnalyzer, ShadowConfig};
pub use texture::{TextureAnalyzer, TextureConfig};

/// Analyzer trait - every heuristic signal implements this
///
/// Analysis is CPU-bound and synchronous; the orchestrator moves each call
/// onto the blocking pool.
pub trait SignalAnalyzer: Send + Sync {
    /// Bundle key this analyzer reports under
    fn key(&self) -> AnalyzerKey;

    /// Analyze one image
    ///
    /// # Returns
    /// * `Ok(SignalPayload)` - analyzer-specific measurements
    /// * `Err(_)` - analysis failed (recorded as a neutral Error record)
    fn analyze(&self, image: &DecodedImage) -> Result<SignalPayload, AnalysisError>;
}

/// Per-analyzer thresholds (`[heuristics]` config section)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicSettings {
    pub exif: ExifConfig,
    pub blur: BlurConfig,
    pub noise: NoiseConfig,
    pub shadow: ShadowConfig,
    pub texture: TextureConfig,
    pub color: ColorConfig,
}

/// The six standard analyzers, configured from `settings`
pub fn default_analyzers(settings: &HeuristicSettings) -> Vec<Arc<dyn SignalAnalyzer>> {
    vec![
        Arc::new(ExifAnalyzer::new(settings.exif.clone())),
        Arc::new(BlurAnalyzer::new(settings.blur.clone())),
        Arc::new(ColorAnalyzer::new(settings.color.clone())),
        Arc::new(NoiseAnalyzer::new(settings.noise.clone())),
        Arc::new(ShadowAnalyzer::new(settings.shadow.clone())),
        Arc::new(TextureAnalyzer::new(settings.texture.clone())),
    ]
}

/// Reject images with no pixels before any kernel touches them
pub(crate) fn ensure_not_empty(image: &DecodedImage) -> Result<(), AnalysisError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(AnalysisError::EmptyImage {
            width: image.width(),
            height: image.height(),
        });
    }
    Ok(())
}

/// Reject NaN/infinite measurements
pub(crate) fn ensure_finite(name: &str, value: f64) -> Result<f64, AnalysisError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AnalysisError::Computation(format!("{} is not finite", name)))
    }
}
