// Texture Consistency Analyzer
//
// Skin-tone regions are located by an HSV range. Face swaps and generated
// faces often carry skin texture that varies patch to patch, or is unnaturally
// smooth; both are measured on the skin patches only.

use crate::analyzers::kernels::{self, Mask, Plane};
use crate::analyzers::{ensure_finite, ensure_not_empty, SignalAnalyzer};
use crate::error::AnalysisError;
use crate::input::DecodedImage;
use crate::types::{AnalyzerKey, SignalPayload, TextureFeatures, TextureResult};
use serde::{Deserialize, Serialize};

/// Texture analyzer thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureConfig {
    /// Skin range, hue on the 0-180 scale
    pub hue_range: (f64, f64),
    pub saturation_range: (f64, f64),
    pub value_range: (f64, f64),
    pub morphology_size: u32,
    pub patch_size: u32,
    pub patch_stride: u32,
    /// Minimum skin coverage for a patch to be compared
    pub min_patch_skin_fraction: f64,
    pub consistency_threshold: f64,
    pub consistency_penalty: f64,
    pub uniformity_threshold: f64,
    pub uniformity_penalty: f64,
    /// Below this many skin pixels the score is scaled down
    pub small_skin_pixels: usize,
    pub small_skin_factor: f64,
    /// Above this many skin pixels skin is reported as detected
    pub detection_pixels: usize,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            hue_range: (0.0, 20.0),
            saturation_range: (20.0, 255.0),
            value_range: (70.0, 255.0),
            morphology_size: 3,
            patch_size: 32,
            patch_stride: 16,
            min_patch_skin_fraction: 0.5,
            consistency_threshold: 0.5,
            consistency_penalty: 0.4,
            uniformity_threshold: 0.85,
            uniformity_penalty: 0.2,
            small_skin_pixels: 500,
            small_skin_factor: 0.5,
            detection_pixels: 100,
        }
    }
}

pub struct TextureAnalyzer {
    config: TextureConfig,
}

impl Default for TextureAnalyzer {
    fn default() -> Self {
        Self::new(TextureConfig::default())
    }
}

impl TextureAnalyzer {
    pub fn new(config: TextureConfig) -> Self {
        Self { config }
    }

    fn skin_mask(&self, image: &DecodedImage) -> Mask {
        let c = &self.config;
        let within = |v: f64, range: (f64, f64)| v >= range.0 && v <= range.1;
        Mask::from_rgb(image.rgb(), |r, g, b| {
            let (h, s, v) = kernels::rgb_to_hsv(r, g, b);
            within(h, c.hue_range) && within(s, c.saturation_range) && within(v, c.value_range)
        })
        .open(c.morphology_size)
        .close(c.morphology_size)
    }

    /// Agreement of luminance variance across skin patches
    fn texture_consistency(&self, image: &DecodedImage, mask: &Mask) -> f64 {
        if mask.count() == 0 {
            return 1.0;
        }

        let c = &self.config;
        let min_pixels = (c.patch_size * c.patch_size) as f64 * c.min_patch_skin_fraction;
        let plane = Plane::from_gray(image.luma());
        let variances: Vec<f64> =
            kernels::tiles(image.width(), image.height(), c.patch_size, c.patch_stride)
                .into_iter()
                .filter(|patch| mask.count_in(*patch) as f64 > min_pixels)
                .map(|patch| kernels::variance(plane.crop(patch).values()))
                .collect();

        if variances.len() < 2 {
            return 1.0;
        }
        kernels::consistency(&variances)
    }
}

impl SignalAnalyzer for TextureAnalyzer {
    fn key(&self) -> AnalyzerKey {
        AnalyzerKey::TextureAnalysis
    }

    fn analyze(&self, image: &DecodedImage) -> Result<SignalPayload, AnalysisError> {
        ensure_not_empty(image)?;

        let mask = self.skin_mask(image);
        let skin_pixel_count = mask.count();

        let texture_features = kernels::glcm_properties(image.luma(), &mask).map(|p| TextureFeatures {
            contrast: kernels::round_to(p.contrast, 4),
            dissimilarity: kernels::round_to(p.dissimilarity, 4),
            homogeneity: kernels::round_to(p.homogeneity, 4),
            uniformity: kernels::round_to(p.energy, 4),
        });
        let consistency = ensure_finite("texture consistency", self.texture_consistency(image, &mask))?;

        let c = &self.config;
        let mut suspicious_score = 0.0;
        if consistency < c.consistency_threshold {
            suspicious_score += c.consistency_penalty;
        }
        if texture_features
            .as_ref()
            .is_some_and(|f| f.uniformity > c.uniformity_threshold)
        {
            suspicious_score += c.uniformity_penalty;
        }
        if skin_pixel_count < c.small_skin_pixels {
            suspicious_score *= c.small_skin_factor;
        }

        Ok(SignalPayload::Texture(TextureResult {
            skin_regions_detected: skin_pixel_count > c.detection_pixels,
            skin_pixel_count,
            texture_features,
            texture_consistency: kernels::round_to(consistency, 3),
            suspicious_score: f64::min(suspicious_score, 1.0),
        }))
    }
}
