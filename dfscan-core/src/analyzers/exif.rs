// EXIF Metadata Analyzer
//
// Metadata-only signal: missing common fields, editing/generation software
// signatures, and DateTime vs DateTimeOriginal mismatch.

use crate::analyzers::SignalAnalyzer;
use crate::error::AnalysisError;
use crate::input::DecodedImage;
use crate::types::{AnalyzerKey, CameraInfo, ExifResult, SignalPayload};
use serde::{Deserialize, Serialize};

/// EXIF analyzer thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExifConfig {
    /// Fields expected in camera output
    pub common_fields: Vec<String>,
    /// More than this many missing common fields is an anomaly
    pub max_missing_fields: usize,
    /// Case-insensitive substrings of the Software tag that count as an anomaly
    pub suspicious_software: Vec<String>,
    /// suspicious_score = anomalies / normalizer
    pub anomaly_normalizer: f64,
}

impl Default for ExifConfig {
    fn default() -> Self {
        Self {
            common_fields: ["DateTime", "Software", "Make", "Model"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_missing_fields: 2,
            suspicious_software: ["photoshop", "gimp", "deepfake", "faceswap", "ai"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            anomaly_normalizer: 10.0,
        }
    }
}

pub struct ExifAnalyzer {
    config: ExifConfig,
}

impl Default for ExifAnalyzer {
    fn default() -> Self {
        Self::new(ExifConfig::default())
    }
}

impl ExifAnalyzer {
    pub fn new(config: ExifConfig) -> Self {
        Self { config }
    }

    fn detect_anomalies(&self, image: &DecodedImage) -> Vec<String> {
        let exif = image.exif();
        let mut anomalies = Vec::new();

        let missing: Vec<&str> = self
            .config
            .common_fields
            .iter()
            .map(String::as_str)
            .filter(|field| !exif.contains(field))
            .collect();
        if missing.len() > self.config.max_missing_fields {
            anomalies.push(format!("Missing common EXIF fields: {}", missing.join(", ")));
        }

        if let Some(software) = exif.get("Software") {
            let lowered = software.to_lowercase();
            if self
                .config
                .suspicious_software
                .iter()
                .any(|needle| lowered.contains(&needle.to_lowercase()))
            {
                anomalies.push(format!("Suspicious software detected: {}", software));
            }
        }

        if let (Some(modified), Some(original)) = (exif.get("DateTime"), exif.get("DateTimeOriginal")) {
            if modified != original {
                anomalies.push("Timestamp inconsistency detected".to_string());
            }
        }

        anomalies
    }
}

impl SignalAnalyzer for ExifAnalyzer {
    fn key(&self) -> AnalyzerKey {
        AnalyzerKey::ExifAnalysis
    }

    fn analyze(&self, image: &DecodedImage) -> Result<SignalPayload, AnalysisError> {
        let exif = image.exif();
        if let Some(error) = exif.error() {
            return Err(AnalysisError::Metadata(error.to_string()));
        }

        let anomalies = self.detect_anomalies(image);
        let normalizer = self.config.anomaly_normalizer.max(1.0);
        let suspicious_score = (anomalies.len() as f64 / normalizer).min(1.0);

        let make = exif.get("Make").map(str::to_string);
        let model = exif.get("Model").map(str::to_string);
        let has_camera_info = make.is_some() || model.is_some();
        let camera_info = has_camera_info.then(|| CameraInfo { make, model });

        Ok(SignalPayload::Exif(ExifResult {
            has_exif: !exif.is_empty(),
            exif_count: exif.len(),
            anomalies,
            suspicious_score,
            has_camera_info,
            camera_info,
            metadata: exif.fields().clone(),
        }))
    }
}
