// Color/Histogram Analyzer
//
// Binary verdict from how far the strongest channel mean leads the
// runner-up, so warm or cool casts in natural light stay balanced. Also reports the spread of
// channel intensities, which the fusion engine reads as an artwork indicator.

use crate::analyzers::kernels;
use crate::analyzers::{ensure_finite, ensure_not_empty, SignalAnalyzer};
use crate::error::AnalysisError;
use crate::input::DecodedImage;
use crate::types::{AnalyzerKey, ChannelMeans, ColorResult, SignalPayload};
use serde::{Deserialize, Serialize};

/// Color analyzer thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// Lead of the top normalized channel mean over the second above this is an anomaly
    pub balance_threshold: f64,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            balance_threshold: 0.25,
        }
    }
}

pub struct ColorAnalyzer {
    config: ColorConfig,
}

impl Default for ColorAnalyzer {
    fn default() -> Self {
        Self::new(ColorConfig::default())
    }
}

impl ColorAnalyzer {
    pub fn new(config: ColorConfig) -> Self {
        Self { config }
    }
}

impl SignalAnalyzer for ColorAnalyzer {
    fn key(&self) -> AnalyzerKey {
        AnalyzerKey::ColorAnalysis
    }

    fn analyze(&self, image: &DecodedImage) -> Result<SignalPayload, AnalysisError> {
        ensure_not_empty(image)?;

        let mut channels: [Vec<f64>; 3] = Default::default();
        for channel in channels.iter_mut() {
            channel.reserve(image.pixel_count());
        }
        for pixel in image.rgb().pixels() {
            for (channel, value) in channels.iter_mut().zip(pixel.0) {
                channel.push(value as f64);
            }
        }

        let means: Vec<f64> = channels.iter().map(|c| kernels::mean(c) / 255.0).collect();
        let mut ranked = means.clone();
        ranked.sort_by(|a, b| b.total_cmp(a));
        let color_balance = ensure_finite("color balance", ranked[0] - ranked[1])?;

        let spread = channels.iter().map(|c| kernels::std_dev(c)).sum::<f64>() / 3.0;
        let color_variance = ensure_finite("color variance", (spread / 127.5).min(1.0))?;

        Ok(SignalPayload::Color(ColorResult {
            channel_means: ChannelMeans {
                red: kernels::round_to(means[0], 4),
                green: kernels::round_to(means[1], 4),
                blue: kernels::round_to(means[2], 4),
            },
            color_balance: kernels::round_to(color_balance, 4),
            color_variance: kernels::round_to(color_variance, 4),
            is_anomalous: color_balance > self.config.balance_threshold,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn analyze(rgb: RgbImage) -> ColorResult {
        match ColorAnalyzer::default().analyze(&DecodedImage::from_rgb(rgb)).unwrap() {
            SignalPayload::Color(result) => result,
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_neutral_gray_is_balanced() {
        let result = analyze(RgbImage::from_pixel(16, 16, Rgb([128, 128, 128])));
        assert!(!result.is_anomalous);
        assert_eq!(result.color_balance, 0.0);
        assert_eq!(result.color_variance, 0.0);
    }

    #[test]
    fn test_dominant_channel_is_anomalous() {
        let result = analyze(RgbImage::from_pixel(16, 16, Rgb([200, 100, 100])));
        assert!(result.is_anomalous);
        assert!((result.color_balance - 0.3922).abs() < 1e-4);
        assert!((result.channel_means.red - 0.7843).abs() < 1e-4);
    }

    #[test]
    fn test_warm_gradient_is_balanced() {
        let result = analyze(RgbImage::from_fn(64, 16, |x, _| {
            let v = (x * 4) as f64;
            Rgb([v as u8, (v * 0.85) as u8, (v * 0.7) as u8])
        }));
        assert!(!result.is_anomalous);
        assert!(result.channel_means.red > result.channel_means.blue);
        assert!(result.color_balance < 0.1);
    }

    #[test]
    fn test_two_tone_illustration_is_balanced() {
        let result = analyze(RgbImage::from_fn(16, 16, |_, y| {
            if y < 8 {
                Rgb([120, 170, 230])
            } else {
                Rgb([240, 230, 200])
            }
        }));
        assert!(!result.is_anomalous);
        assert!((result.color_balance - 0.0588).abs() < 1e-3);
    }

    #[test]
    fn test_black_and_white_split_has_full_variance() {
        let result = analyze(RgbImage::from_fn(16, 16, |x, _| {
            if x < 8 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        }));
        assert!(!result.is_anomalous);
        assert_eq!(result.color_variance, 1.0);
    }
}
