// Blur/Sharpness Analyzer
//
// Laplacian variance over the whole image and over a grid of regions.
// Spliced or locally retouched areas tend to disagree in sharpness with the
// rest of the frame, so the signal is the dispersion of regional sharpness.

use crate::analyzers::kernels::{self, Plane};
use crate::analyzers::{ensure_finite, ensure_not_empty, SignalAnalyzer};
use crate::error::AnalysisError;
use crate::input::DecodedImage;
use crate::types::{AnalyzerKey, BlurResult, SignalPayload};
use serde::{Deserialize, Serialize};

/// Blur analyzer thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlurConfig {
    /// Grid size (rows and columns)
    pub grid: u32,
    /// Overall Laplacian variance below this is reported as blurry
    pub blurry_threshold: f64,
    /// Consistency below this may be suspicious
    pub consistency_threshold: f64,
    /// ...but only when mean regional sharpness exceeds this
    pub min_mean_sharpness: f64,
    /// suspicious_score = (1 - consistency) * penalty_scale
    pub penalty_scale: f64,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            grid: 3,
            blurry_threshold: 100.0,
            consistency_threshold: 0.5,
            min_mean_sharpness: 50.0,
            penalty_scale: 0.7,
        }
    }
}

pub struct BlurAnalyzer {
    config: BlurConfig,
}

impl Default for BlurAnalyzer {
    fn default() -> Self {
        Self::new(BlurConfig::default())
    }
}

impl BlurAnalyzer {
    pub fn new(config: BlurConfig) -> Self {
        Self { config }
    }
}

impl SignalAnalyzer for BlurAnalyzer {
    fn key(&self) -> AnalyzerKey {
        AnalyzerKey::BlurAnalysis
    }

    fn analyze(&self, image: &DecodedImage) -> Result<SignalPayload, AnalysisError> {
        ensure_not_empty(image)?;
        let plane = Plane::from_gray(image.luma());

        let overall = ensure_finite("overall sharpness", kernels::laplacian_variance(&plane))?;

        let grid = self.config.grid.max(1);
        let regional: Vec<f64> = kernels::grid(plane.width(), plane.height(), grid, grid)
            .into_iter()
            .filter(|region| !region.is_empty())
            .map(|region| kernels::laplacian_variance(&plane.crop(region)))
            .collect();

        let consistency = ensure_finite("sharpness consistency", kernels::consistency(&regional))?;
        let mean_sharpness = kernels::mean(&regional);

        let suspicious_score = if consistency < self.config.consistency_threshold
            && mean_sharpness > self.config.min_mean_sharpness
        {
            ((1.0 - consistency) * self.config.penalty_scale).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Ok(SignalPayload::Blur(BlurResult {
            overall_sharpness: kernels::round_to(overall, 2),
            is_blurry: overall < self.config.blurry_threshold,
            regional_sharpness: regional.iter().map(|v| kernels::round_to(*v, 2)).collect(),
            sharpness_consistency: kernels::round_to(consistency, 3),
            suspicious_score: kernels::round_to(suspicious_score, 3),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn analyze(rgb: RgbImage) -> BlurResult {
        match BlurAnalyzer::default().analyze(&DecodedImage::from_rgb(rgb)).unwrap() {
            SignalPayload::Blur(result) => result,
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    fn checker(x: u32, y: u32) -> Rgb<u8> {
        if (x + y) % 2 == 0 {
            Rgb([20, 20, 20])
        } else {
            Rgb([230, 230, 230])
        }
    }

    #[test]
    fn test_flat_image_is_blurry_but_not_suspicious() {
        let result = analyze(RgbImage::from_pixel(60, 60, Rgb([128, 128, 128])));
        assert!(result.is_blurry);
        assert_eq!(result.overall_sharpness, 0.0);
        assert_eq!(result.regional_sharpness.len(), 9);
        assert_eq!(result.suspicious_score, 0.0);
    }

    #[test]
    fn test_image_narrower_than_grid_skips_empty_regions() {
        let result = analyze(RgbImage::from_fn(1, 7, |_, y| {
            let v = (y * 30) as u8;
            Rgb([v, v, v])
        }));
        assert_eq!(result.regional_sharpness.len(), 3);
        assert_eq!(result.suspicious_score, 0.0);
    }

    #[test]
    fn test_uniform_detail_is_consistent() {
        let result = analyze(RgbImage::from_fn(60, 60, checker));
        assert!(!result.is_blurry);
        assert!(result.sharpness_consistency > 0.9);
        assert_eq!(result.suspicious_score, 0.0);
    }

    #[test]
    fn test_single_sharp_region_is_suspicious() {
        // Only the top-left ninth carries detail
        let result = analyze(RgbImage::from_fn(60, 60, |x, y| {
            if x < 20 && y < 20 {
                checker(x, y)
            } else {
                Rgb([128, 128, 128])
            }
        }));
        assert!(result.sharpness_consistency < 0.5);
        assert!(result.suspicious_score > 0.5);
        assert!(result.suspicious_score <= 0.7);
    }
}
