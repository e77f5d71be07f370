// Noise Pattern Analyzer
//
// Three measurements: global residual noise against a smoothed copy,
// high-frequency energy from an 8-neighbour high-pass filter (block and ringing
// artifacts), and agreement of residual noise across image quadrants.

use crate::analyzers::kernels::{self, Plane, HIGH_PASS};
use crate::analyzers::{ensure_finite, ensure_not_empty, SignalAnalyzer};
use crate::error::AnalysisError;
use crate::input::DecodedImage;
use crate::types::{AnalyzerKey, NoiseResult, SignalPayload};
use image::GrayImage;
use serde::{Deserialize, Serialize};

/// Noise analyzer thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Smoothing used for the global residual (about a 5x5 kernel)
    pub global_sigma: f32,
    /// Smoothing used for the per-quadrant residual (about a 3x3 kernel)
    pub regional_sigma: f32,
    pub noise_level_threshold: f64,
    pub noise_level_penalty: f64,
    pub artifact_threshold: f64,
    pub artifact_penalty: f64,
    pub consistency_threshold: f64,
    pub consistency_penalty: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            global_sigma: 1.1,
            regional_sigma: 0.8,
            noise_level_threshold: 0.15,
            noise_level_penalty: 0.3,
            artifact_threshold: 0.2,
            artifact_penalty: 0.4,
            consistency_threshold: 0.6,
            consistency_penalty: 0.3,
        }
    }
}

pub struct NoiseAnalyzer {
    config: NoiseConfig,
}

impl Default for NoiseAnalyzer {
    fn default() -> Self {
        Self::new(NoiseConfig::default())
    }
}

impl NoiseAnalyzer {
    pub fn new(config: NoiseConfig) -> Self {
        Self { config }
    }

    /// Mean absolute difference between `gray` and its blurred copy, in gray levels
    fn residual(gray: &GrayImage, sigma: f32) -> f64 {
        let blurred = kernels::gaussian_blur(gray, sigma);
        Plane::from_gray(gray).mean_abs_diff(&Plane::from_gray(&blurred))
    }

    fn compression_artifacts(plane: &Plane) -> f64 {
        let filtered = plane.convolve3(&HIGH_PASS);
        let abs: Vec<f64> = filtered.values().iter().map(|v| v.abs()).collect();
        (kernels::mean(&abs) / 255.0).min(1.0)
    }

    fn noise_consistency(&self, gray: &GrayImage) -> f64 {
        let levels: Vec<f64> = kernels::grid(gray.width(), gray.height(), 2, 2)
            .into_iter()
            .filter(|region| !region.is_empty())
            .map(|region| {
                let crop = kernels::crop_gray(gray, region);
                Self::residual(&crop, self.config.regional_sigma)
            })
            .collect();
        kernels::consistency(&levels)
    }
}

impl SignalAnalyzer for NoiseAnalyzer {
    fn key(&self) -> AnalyzerKey {
        AnalyzerKey::NoiseAnalysis
    }

    fn analyze(&self, image: &DecodedImage) -> Result<SignalPayload, AnalysisError> {
        ensure_not_empty(image)?;
        let gray = image.luma();

        let noise_level = ensure_finite(
            "noise level",
            Self::residual(gray, self.config.global_sigma) / 255.0,
        )?;
        let compression_artifacts = ensure_finite(
            "compression artifacts",
            Self::compression_artifacts(&Plane::from_gray(gray)),
        )?;
        let noise_consistency = ensure_finite("noise consistency", self.noise_consistency(gray))?;

        let c = &self.config;
        let mut suspicious_score = 0.0;
        if noise_level > c.noise_level_threshold {
            suspicious_score += c.noise_level_penalty;
        }
        if compression_artifacts > c.artifact_threshold {
            suspicious_score += c.artifact_penalty;
        }
        if noise_consistency < c.consistency_threshold {
            suspicious_score += c.consistency_penalty;
        }

        Ok(SignalPayload::Noise(NoiseResult {
            noise_level: kernels::round_to(noise_level, 4),
            compression_artifacts: kernels::round_to(compression_artifacts, 4),
            noise_consistency: kernels::round_to(noise_consistency, 4),
            suspicious_score: f64::min(suspicious_score, 1.0),
        }))
    }
}
