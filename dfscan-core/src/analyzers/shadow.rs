// Lighting/Shadow Analyzer
//
// Lighting: the dominant illumination gradient of each grid region should
// point the same way across the frame. Shadows: dark patches cast by one light
// source should have similar intensity.

use crate::analyzers::kernels::{self, Mask, Plane, Region, SOBEL_X, SOBEL_Y};
use crate::analyzers::{ensure_finite, ensure_not_empty, SignalAnalyzer};
use crate::error::AnalysisError;
use crate::input::DecodedImage;
use crate::types::{AnalyzerKey, ShadowResult, SignalPayload};
use serde::{Deserialize, Serialize};

/// Shadow analyzer thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    /// Smoothing applied before gradients so texture does not dominate
    pub lighting_sigma: f32,
    /// Gradients above this percentile of magnitude count as strong
    pub strong_gradient_percentile: f64,
    /// Fewer strong gradients than this: lighting is assumed consistent
    pub min_strong_gradients: usize,
    /// A region is directional when |sum g| / sum |g| reaches this
    pub min_region_coherence: f64,
    /// Fewer directional regions than this: lighting is assumed consistent
    pub min_directional_regions: usize,
    /// Pixels whose HSV value is below this percentile are shadow candidates
    pub shadow_percentile: f64,
    /// Opening kernel size for the shadow mask
    pub morphology_size: u32,
    /// Fewer shadow pixels than this: shadows are assumed consistent
    pub min_shadow_pixels: usize,
    pub patch_size: u32,
    /// Minimum shadow coverage for a patch to be compared
    pub min_patch_shadow_fraction: f64,
    pub overall_threshold: f64,
    pub overall_penalty: f64,
    pub lighting_threshold: f64,
    pub lighting_penalty: f64,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            lighting_sigma: 2.0,
            strong_gradient_percentile: 80.0,
            min_strong_gradients: 100,
            min_region_coherence: 0.25,
            min_directional_regions: 2,
            shadow_percentile: 25.0,
            morphology_size: 5,
            min_shadow_pixels: 100,
            patch_size: 32,
            min_patch_shadow_fraction: 0.3,
            overall_threshold: 0.6,
            overall_penalty: 0.6,
            lighting_threshold: 0.5,
            lighting_penalty: 0.4,
        }
    }
}

pub struct ShadowAnalyzer {
    config: ShadowConfig,
}

impl Default for ShadowAnalyzer {
    fn default() -> Self {
        Self::new(ShadowConfig::default())
    }
}

impl ShadowAnalyzer {
    pub fn new(config: ShadowConfig) -> Self {
        Self { config }
    }

    /// Agreement of regional illumination directions, in [0, 1]
    fn lighting_consistency(&self, image: &DecodedImage) -> f64 {
        let smoothed = kernels::gaussian_blur(image.luma(), self.config.lighting_sigma);
        let plane = Plane::from_gray(&smoothed);
        let gx = plane.convolve3(&SOBEL_X);
        let gy = plane.convolve3(&SOBEL_Y);

        let magnitude: Vec<f64> = gx
            .values()
            .iter()
            .zip(gy.values())
            .map(|(x, y)| x.hypot(*y))
            .collect();
        let threshold = kernels::percentile(&magnitude, self.config.strong_gradient_percentile);
        let strong_count = magnitude.iter().filter(|&&m| m > threshold).count();
        if strong_count < self.config.min_strong_gradients {
            return 1.0;
        }

        let width = plane.width();
        // (unit direction, coherence) per directional region
        let mut directions: Vec<(f64, f64, f64)> = Vec::new();
        for region in kernels::grid(width, plane.height(), 3, 3) {
            let (mut sx, mut sy, mut total) = (0.0, 0.0, 0.0);
            for y in region.y..region.y + region.height {
                for x in region.x..region.x + region.width {
                    let index = (y * width + x) as usize;
                    if magnitude[index] > threshold {
                        sx += gx.values()[index];
                        sy += gy.values()[index];
                        total += magnitude[index];
                    }
                }
            }
            if total <= 0.0 {
                continue;
            }
            let resultant = sx.hypot(sy);
            let coherence = resultant / total;
            if coherence >= self.config.min_region_coherence {
                directions.push((sx / resultant, sy / resultant, coherence));
            }
        }

        if directions.len() < self.config.min_directional_regions {
            return 1.0;
        }

        let weight: f64 = directions.iter().map(|d| d.2).sum();
        let rx: f64 = directions.iter().map(|d| d.0 * d.2).sum();
        let ry: f64 = directions.iter().map(|d| d.1 * d.2).sum();
        (rx.hypot(ry) / weight).clamp(0.0, 1.0)
    }

    /// Dark-pixel mask from the HSV value channel
    fn shadow_mask(&self, image: &DecodedImage) -> Mask {
        let values: Vec<f64> = image
            .rgb()
            .pixels()
            .map(|p| p.0.iter().copied().max().unwrap_or(0) as f64)
            .collect();
        let threshold = kernels::percentile(&values, self.config.shadow_percentile);
        Mask::from_rgb(image.rgb(), |r, g, b| (r.max(g).max(b) as f64) < threshold)
            .open(self.config.morphology_size)
    }

    /// Agreement of mean luminance across shadow-covered patches, in [0, 1]
    fn shadow_consistency(&self, image: &DecodedImage, mask: &Mask) -> f64 {
        if mask.count() < self.config.min_shadow_pixels {
            return 1.0;
        }

        let size = self.config.patch_size;
        let min_pixels = (size * size) as f64 * self.config.min_patch_shadow_fraction;
        let plane = Plane::from_gray(image.luma());
        let intensities: Vec<f64> = kernels::tiles(image.width(), image.height(), size, size)
            .into_iter()
            .filter(|tile: &Region| mask.count_in(*tile) as f64 > min_pixels)
            .map(|tile| plane.region_mean(tile))
            .collect();

        if intensities.len() < 2 {
            return 1.0;
        }
        kernels::consistency(&intensities).clamp(0.0, 1.0)
    }
}

impl SignalAnalyzer for ShadowAnalyzer {
    fn key(&self) -> AnalyzerKey {
        AnalyzerKey::ShadowAnalysis
    }

    fn analyze(&self, image: &DecodedImage) -> Result<SignalPayload, AnalysisError> {
        ensure_not_empty(image)?;

        let lighting = ensure_finite("lighting consistency", self.lighting_consistency(image))?;
        let mask = self.shadow_mask(image);
        let shadow = ensure_finite("shadow consistency", self.shadow_consistency(image, &mask))?;
        let overall = (lighting + shadow) / 2.0;

        let c = &self.config;
        let mut suspicious_score = 0.0;
        if overall < c.overall_threshold {
            suspicious_score += c.overall_penalty;
        }
        if lighting < c.lighting_threshold {
            suspicious_score += c.lighting_penalty;
        }

        Ok(SignalPayload::Shadow(ShadowResult {
            lighting_consistency: kernels::round_to(lighting, 3),
            shadow_consistency: kernels::round_to(shadow, 3),
            overall_consistency: kernels::round_to(overall, 3),
            suspicious_score: f64::min(suspicious_score, 1.0),
        }))
    }
}
