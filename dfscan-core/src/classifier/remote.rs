//! HTTP inference client
//!
//! Posts the PNG-encoded image as base64 JSON to an inference endpoint and
//! maps the class probabilities it returns onto real/fake.

use crate::classifier::DeepfakeClassifier;
use crate::error::ClassifierError;
use crate::input::DecodedImage;
use crate::types::{ClassifierLabel, ClassifierResult};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("dfscan/", env!("CARGO_PKG_VERSION"));

const REAL_ALIASES: &[&str] = &["real", "authentic", "human", "genuine", "realism"];
const FAKE_ALIASES: &[&str] = &["fake", "deepfake", "ai", "synthetic", "generated", "artificial"];

/// Request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceRequest {
    /// Base64-encoded PNG
    pub image_data: String,
}

/// Response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceResponse {
    /// Class probabilities, parallel to `class_labels`
    #[serde(default)]
    pub predictions: Vec<f32>,
    #[serde(default)]
    pub class_labels: Vec<String>,
    /// Service verdict, used when probabilities cannot be mapped
    #[serde(default)]
    pub is_ai: Option<bool>,
    /// Confidence in `is_ai`
    #[serde(default)]
    pub confidence: Option<f32>,
}

fn label_side(label: &str) -> Option<ClassifierLabel> {
    let label = label.trim().to_lowercase();
    if REAL_ALIASES.contains(&label.as_str()) {
        Some(ClassifierLabel::Real)
    } else if FAKE_ALIASES.contains(&label.as_str()) {
        Some(ClassifierLabel::Fake)
    } else {
        None
    }
}

/// Map an inference response onto a classifier result
///
/// Resolution order: labelled probabilities, then an unlabelled two-class
/// vector read as `[real, fake]`, then the bare `is_ai`/`confidence` verdict.
pub fn interpret_response(response: &InferenceResponse) -> Result<ClassifierResult, ClassifierError> {
    if response.predictions.iter().any(|p| !p.is_finite()) {
        return Err(ClassifierError::InvalidResponse(
            "predictions contain non-finite values".to_string(),
        ));
    }

    if !response.class_labels.is_empty() {
        if response.class_labels.len() != response.predictions.len() {
            return Err(ClassifierError::InvalidResponse(format!(
                "{} class labels for {} predictions",
                response.class_labels.len(),
                response.predictions.len()
            )));
        }

        let mut real = None;
        let mut fake = None;
        for (label, probability) in response.class_labels.iter().zip(&response.predictions) {
            match label_side(label) {
                Some(ClassifierLabel::Real) => real = Some(*probability as f64),
                Some(ClassifierLabel::Fake) => fake = Some(*probability as f64),
                _ => {}
            }
        }

        match (real, fake) {
            (Some(r), Some(f)) => return Ok(ClassifierResult::from_probabilities(r, f)),
            (Some(r), None) => return Ok(ClassifierResult::from_probabilities(r, 1.0 - r)),
            (None, Some(f)) => return Ok(ClassifierResult::from_probabilities(1.0 - f, f)),
            (None, None) => {}
        }
    } else if response.predictions.len() == 2 {
        return Ok(ClassifierResult::from_probabilities(
            response.predictions[0] as f64,
            response.predictions[1] as f64,
        ));
    }

    match (response.is_ai, response.confidence) {
        (Some(is_ai), Some(confidence)) if confidence.is_finite() => {
            let label = if is_ai {
                ClassifierLabel::Fake
            } else {
                ClassifierLabel::Real
            };
            Ok(ClassifierResult::labelled(label, confidence as f64))
        }
        _ => Err(ClassifierError::InvalidResponse(
            "response carries neither real/fake probabilities nor a verdict".to_string(),
        )),
    }
}

/// Encode pixels as base64 PNG
pub fn encode_png_base64(image: &DecodedImage) -> Result<String, ClassifierError> {
    let mut buffer = Vec::new();
    image
        .rgb()
        .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
        .map_err(|e| ClassifierError::Encode(e.to_string()))?;
    Ok(STANDARD.encode(&buffer))
}

/// Classifier backed by an HTTP inference endpoint
pub struct RemoteClassifier {
    http_client: reqwest::Client,
    endpoint: String,
}

impl RemoteClassifier {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ClassifierError> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(ClassifierError::NotAvailable("empty endpoint".to_string()));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http_client,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl DeepfakeClassifier for RemoteClassifier {
    fn name(&self) -> &str {
        "remote"
    }

    async fn predict(&self, image: &DecodedImage) -> Result<ClassifierResult, ClassifierError> {
        let request = InferenceRequest {
            image_data: encode_png_base64(image)?,
        };

        debug!(endpoint = %self.endpoint, bytes = request.image_data.len(), "Posting image to classifier");

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::InvalidResponse(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let body: InferenceResponse = response.json().await?;
        interpret_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn response(predictions: &[f32], labels: &[&str]) -> InferenceResponse {
        InferenceResponse {
            predictions: predictions.to_vec(),
            class_labels: labels.iter().map(|s| s.to_string()).collect(),
            is_ai: None,
            confidence: None,
        }
    }

    #[test]
    fn test_labelled_probabilities() {
        let result = interpret_response(&response(&[0.25, 0.75], &["Real", "Fake"])).unwrap();
        assert_eq!(result.label, ClassifierLabel::Fake);
        assert!((result.score - 0.75).abs() < 1e-6);
        let probs = result.raw_probabilities.unwrap();
        assert!((probs.real - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_label_aliases_in_any_order() {
        let result = interpret_response(&response(&[0.9, 0.1], &["ai", "human"])).unwrap();
        assert_eq!(result.label, ClassifierLabel::Fake);
        assert!((result.raw_probabilities.unwrap().real - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_single_known_label_implies_complement() {
        let result = interpret_response(&response(&[0.2, 0.8], &["cat", "authentic"])).unwrap();
        assert_eq!(result.label, ClassifierLabel::Real);
        assert!((result.raw_probabilities.unwrap().fake - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_unlabelled_pair_reads_real_then_fake() {
        let result = interpret_response(&response(&[0.7, 0.3], &[])).unwrap();
        assert_eq!(result.label, ClassifierLabel::Real);
    }

    #[test]
    fn test_verdict_fallback_has_no_probabilities() {
        let body = InferenceResponse {
            predictions: vec![],
            class_labels: vec![],
            is_ai: Some(true),
            confidence: Some(0.66),
        };
        let result = interpret_response(&body).unwrap();
        assert_eq!(result.label, ClassifierLabel::Fake);
        assert!(result.raw_probabilities.is_none());
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let err = interpret_response(&response(&[0.5], &["real", "fake"])).unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidResponse(_)));
    }

    #[test]
    fn test_empty_response_rejected() {
        assert!(interpret_response(&response(&[], &[])).is_err());
    }

    #[test]
    fn test_response_json_shape() {
        let body: InferenceResponse = serde_json::from_str(
            r#"{"predictions":[0.1,0.9],"class_labels":["real","fake"],"is_ai":true,"confidence":0.9}"#,
        )
        .unwrap();
        assert_eq!(interpret_response(&body).unwrap().label, ClassifierLabel::Fake);
    }

    #[test]
    fn test_png_encoding_is_base64() {
        let image = DecodedImage::from_rgb(RgbImage::from_pixel(4, 4, Rgb([1, 2, 3])));
        let encoded = encode_png_base64(&image).unwrap();
        let decoded = STANDARD.decode(encoded).unwrap();
        assert_eq!(&decoded[1..4], b"PNG");
    }

    #[test]
    fn test_empty_endpoint_not_available() {
        assert!(matches!(
            RemoteClassifier::new("  ", Duration::from_secs(1)),
            Err(ClassifierError::NotAvailable(_))
        ));
    }
}
