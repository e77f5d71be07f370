//! Signal records and the per-image assessment bundle
//!
//! Every analyzer invocation yields exactly one [`SignalRecord`]. The record's
//! payload is a closed union over the analyzer kinds, so a field an analyzer
//! never produces (the color analyzer has no `suspicious_score`) is simply
//! absent rather than defaulted to zero.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Scores strictly above this mark a scored analyzer as Suspicious
pub const SUSPICIOUS_SCORE_THRESHOLD: f64 = 0.5;

/// Suspicion score reported when an analyzer fails (unknown is not evidence)
pub const NEUTRAL_SUSPICION: f64 = 0.5;

// ============================================================================
// Keys and flags
// ============================================================================

/// Fixed analyzer keys of an assessment bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerKey {
    DeepfakeDetection,
    ExifAnalysis,
    BlurAnalysis,
    ColorAnalysis,
    NoiseAnalysis,
    ShadowAnalysis,
    TextureAnalysis,
}

impl AnalyzerKey {
    /// All bundle keys, classifier first
    pub const ALL: [AnalyzerKey; 7] = [
        AnalyzerKey::DeepfakeDetection,
        AnalyzerKey::ExifAnalysis,
        AnalyzerKey::BlurAnalysis,
        AnalyzerKey::ColorAnalysis,
        AnalyzerKey::NoiseAnalysis,
        AnalyzerKey::ShadowAnalysis,
        AnalyzerKey::TextureAnalysis,
    ];

    /// The six pixel/metadata heuristics (everything except the classifier)
    pub const HEURISTICS: [AnalyzerKey; 6] = [
        AnalyzerKey::ExifAnalysis,
        AnalyzerKey::BlurAnalysis,
        AnalyzerKey::ColorAnalysis,
        AnalyzerKey::NoiseAnalysis,
        AnalyzerKey::ShadowAnalysis,
        AnalyzerKey::TextureAnalysis,
    ];

    /// Serialized key
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyzerKey::DeepfakeDetection => "deepfake_detection",
            AnalyzerKey::ExifAnalysis => "exif_analysis",
            AnalyzerKey::BlurAnalysis => "blur_analysis",
            AnalyzerKey::ColorAnalysis => "color_analysis",
            AnalyzerKey::NoiseAnalysis => "noise_analysis",
            AnalyzerKey::ShadowAnalysis => "shadow_analysis",
            AnalyzerKey::TextureAnalysis => "texture_analysis",
        }
    }

    /// Human-readable operation name
    pub fn operation(&self) -> &'static str {
        match self {
            AnalyzerKey::DeepfakeDetection => "AI Deepfake Detection",
            AnalyzerKey::ExifAnalysis => "EXIF Metadata Analysis",
            AnalyzerKey::BlurAnalysis => "Blur/Sharpness Analysis",
            AnalyzerKey::ColorAnalysis => "Color/Histogram Analysis",
            AnalyzerKey::NoiseAnalysis => "Noise Pattern Analysis",
            AnalyzerKey::ShadowAnalysis => "Lighting/Shadow Analysis",
            AnalyzerKey::TextureAnalysis => "Texture Consistency Analysis",
        }
    }

    fn failure_label(&self) -> &'static str {
        match self {
            AnalyzerKey::DeepfakeDetection => "AI analysis",
            AnalyzerKey::ExifAnalysis => "EXIF analysis",
            AnalyzerKey::BlurAnalysis => "Blur analysis",
            AnalyzerKey::ColorAnalysis => "Color analysis",
            AnalyzerKey::NoiseAnalysis => "Noise analysis",
            AnalyzerKey::ShadowAnalysis => "Shadow analysis",
            AnalyzerKey::TextureAnalysis => "Texture analysis",
        }
    }
}

impl fmt::Display for AnalyzerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome flag of one signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalFlag {
    Passed,
    Suspicious,
    Error,
    Skipped,
}

impl SignalFlag {
    /// Passed and Suspicious records count toward `total_analyses`
    pub fn is_evidence(&self) -> bool {
        matches!(self, SignalFlag::Passed | SignalFlag::Suspicious)
    }
}

impl fmt::Display for SignalFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalFlag::Passed => write!(f, "Passed"),
            SignalFlag::Suspicious => write!(f, "Suspicious"),
            SignalFlag::Error => write!(f, "Error"),
            SignalFlag::Skipped => write!(f, "Skipped"),
        }
    }
}

// ============================================================================
// Analyzer payloads
// ============================================================================

/// Camera identification from EXIF Make/Model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraInfo {
    pub make: Option<String>,
    pub model: Option<String>,
}

/// EXIF metadata analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExifResult {
    pub has_exif: bool,
    pub exif_count: usize,
    pub anomalies: Vec<String>,
    pub suspicious_score: f64,
    pub has_camera_info: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_info: Option<CameraInfo>,
    pub metadata: BTreeMap<String, String>,
}

/// Sharpness / blur consistency analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlurResult {
    pub overall_sharpness: f64,
    pub is_blurry: bool,
    pub regional_sharpness: Vec<f64>,
    pub sharpness_consistency: f64,
    pub suspicious_score: f64,
}

/// Noise and compression artifact analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseResult {
    pub noise_level: f64,
    pub compression_artifacts: f64,
    pub noise_consistency: f64,
    pub suspicious_score: f64,
}

/// Lighting and shadow consistency analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowResult {
    pub lighting_consistency: f64,
    pub shadow_consistency: f64,
    pub overall_consistency: f64,
    pub suspicious_score: f64,
}

/// GLCM texture descriptors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureFeatures {
    pub contrast: f64,
    pub dissimilarity: f64,
    pub homogeneity: f64,
    /// GLCM energy
    pub uniformity: f64,
}

/// Skin-region texture consistency analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureResult {
    pub skin_regions_detected: bool,
    pub skin_pixel_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texture_features: Option<TextureFeatures>,
    pub texture_consistency: f64,
    pub suspicious_score: f64,
}

/// Mean intensity per channel, normalized to [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMeans {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

/// Color distribution analysis (binary verdict, no suspicion score)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorResult {
    pub channel_means: ChannelMeans,
    pub color_balance: f64,
    pub color_variance: f64,
    pub is_anomalous: bool,
}

/// Classifier verdict label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierLabel {
    Real,
    Fake,
    Unknown,
}

impl fmt::Display for ClassifierLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierLabel::Real => write!(f, "real"),
            ClassifierLabel::Fake => write!(f, "fake"),
            ClassifierLabel::Unknown => write!(f, "unknown"),
        }
    }
}

/// Calibrated class probabilities (real + fake ~= 1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawProbabilities {
    pub real: f64,
    pub fake: f64,
}

/// Classifier adapter output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierResult {
    pub label: ClassifierLabel,
    /// Confidence in `label`
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_probabilities: Option<RawProbabilities>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClassifierResult {
    /// Build a result from class probabilities; the larger one wins
    pub fn from_probabilities(real: f64, fake: f64) -> Self {
        let real = real.clamp(0.0, 1.0);
        let fake = fake.clamp(0.0, 1.0);
        let (label, score) = if fake > real {
            (ClassifierLabel::Fake, fake)
        } else {
            (ClassifierLabel::Real, real)
        };
        Self {
            label,
            score,
            raw_probabilities: Some(RawProbabilities { real, fake }),
            error: None,
        }
    }

    /// Label and score only, without raw probabilities
    pub fn labelled(label: ClassifierLabel, score: f64) -> Self {
        Self {
            label,
            score: score.clamp(0.0, 1.0),
            raw_probabilities: None,
            error: None,
        }
    }

    /// Failed prediction: unknown label, zero score
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            label: ClassifierLabel::Unknown,
            score: 0.0,
            raw_probabilities: None,
            error: Some(message.into()),
        }
    }
}

/// Payload recorded when an analyzer fails
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerFailure {
    pub error: String,
    pub suspicious_score: f64,
}

/// Analyzer-specific result payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SignalPayload {
    Classifier(ClassifierResult),
    Exif(ExifResult),
    Blur(BlurResult),
    Color(ColorResult),
    Noise(NoiseResult),
    Shadow(ShadowResult),
    Texture(TextureResult),
    Failure(AnalyzerFailure),
}

impl SignalPayload {
    /// Per-analyzer suspicion score, when the payload carries one
    pub fn suspicious_score(&self) -> Option<f64> {
        match self {
            SignalPayload::Exif(r) => Some(r.suspicious_score),
            SignalPayload::Blur(r) => Some(r.suspicious_score),
            SignalPayload::Noise(r) => Some(r.suspicious_score),
            SignalPayload::Shadow(r) => Some(r.suspicious_score),
            SignalPayload::Texture(r) => Some(r.suspicious_score),
            SignalPayload::Failure(r) => Some(r.suspicious_score),
            SignalPayload::Classifier(_) | SignalPayload::Color(_) => None,
        }
    }

    /// Authenticity estimate from this payload alone
    ///
    /// Classifier results contribute their label score, scored heuristics
    /// contribute `1 - suspicious_score`, and the color analyzer contributes
    /// nothing.
    pub fn evidence_score(&self) -> Option<f64> {
        match self {
            SignalPayload::Classifier(r) if r.label != ClassifierLabel::Unknown => Some(r.score),
            SignalPayload::Classifier(_) => None,
            other => other.suspicious_score().map(|s| 1.0 - s),
        }
    }

    pub fn as_classifier(&self) -> Option<&ClassifierResult> {
        match self {
            SignalPayload::Classifier(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_exif(&self) -> Option<&ExifResult> {
        match self {
            SignalPayload::Exif(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_blur(&self) -> Option<&BlurResult> {
        match self {
            SignalPayload::Blur(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<&ColorResult> {
        match self {
            SignalPayload::Color(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_texture(&self) -> Option<&TextureResult> {
        match self {
            SignalPayload::Texture(r) => Some(r),
            _ => None,
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// One analyzer's outcome for one image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalRecord {
    #[serde(skip)]
    pub key: AnalyzerKey,
    pub operation: String,
    pub flag: SignalFlag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SignalPayload>,
    pub description: String,
}

impl SignalRecord {
    /// Record for a successful analyzer run; flag and description follow
    /// from the payload
    pub fn from_payload(key: AnalyzerKey, payload: SignalPayload) -> Self {
        let flag = match &payload {
            SignalPayload::Failure(_) => SignalFlag::Error,
            SignalPayload::Classifier(r) if r.error.is_some() => SignalFlag::Error,
            SignalPayload::Classifier(r) if r.label == ClassifierLabel::Fake => {
                SignalFlag::Suspicious
            }
            SignalPayload::Classifier(_) => SignalFlag::Passed,
            SignalPayload::Color(r) if r.is_anomalous => SignalFlag::Suspicious,
            SignalPayload::Color(_) => SignalFlag::Passed,
            scored => match scored.suspicious_score() {
                Some(score) if score > SUSPICIOUS_SCORE_THRESHOLD => SignalFlag::Suspicious,
                _ => SignalFlag::Passed,
            },
        };
        let description = describe(key, &payload);

        Self {
            key,
            operation: key.operation().to_string(),
            flag,
            result: Some(payload),
            description,
        }
    }

    /// Error record; carries the neutral suspicion score (or the classifier's
    /// unknown/0.0 verdict)
    pub fn failed(key: AnalyzerKey, error: impl fmt::Display) -> Self {
        let message = error.to_string();
        let payload = match key {
            AnalyzerKey::DeepfakeDetection => {
                SignalPayload::Classifier(ClassifierResult::failed(message.clone()))
            }
            _ => SignalPayload::Failure(AnalyzerFailure {
                error: message.clone(),
                suspicious_score: NEUTRAL_SUSPICION,
            }),
        };

        Self {
            key,
            operation: key.operation().to_string(),
            flag: SignalFlag::Error,
            result: Some(payload),
            description: format!("{} failed: {}", key.failure_label(), message),
        }
    }

    /// Skipped record (signal unavailable); contributes nothing to fusion
    pub fn skipped(key: AnalyzerKey, reason: impl Into<String>) -> Self {
        Self {
            key,
            operation: key.operation().to_string(),
            flag: SignalFlag::Skipped,
            result: None,
            description: reason.into(),
        }
    }

    pub fn suspicious_score(&self) -> Option<f64> {
        self.result.as_ref().and_then(SignalPayload::suspicious_score)
    }
}

fn describe(key: AnalyzerKey, payload: &SignalPayload) -> String {
    match payload {
        SignalPayload::Classifier(r) => format!(
            "AI model predicts: {} with {:.1}% confidence",
            r.label,
            r.score * 100.0
        ),
        SignalPayload::Exif(r) => format!(
            "EXIF data analysis - {} anomalies detected",
            r.anomalies.len()
        ),
        SignalPayload::Blur(r) => format!(
            "Sharpness consistency: {:.1}%",
            r.sharpness_consistency * 100.0
        ),
        SignalPayload::Color(r) if r.is_anomalous => {
            "Unnatural color balance detected (one channel dominates).".to_string()
        }
        SignalPayload::Color(_) => "Color distribution looks natural.".to_string(),
        SignalPayload::Noise(r) => format!(
            "Noise consistency: {:.1}%",
            r.noise_consistency * 100.0
        ),
        SignalPayload::Shadow(r) => format!(
            "Lighting consistency: {:.1}%",
            r.overall_consistency * 100.0
        ),
        SignalPayload::Texture(r) => format!(
            "Texture consistency: {:.1}%",
            r.texture_consistency * 100.0
        ),
        SignalPayload::Failure(r) => format!("{} failed: {}", key.failure_label(), r.error),
    }
}

// ============================================================================
// Bundle
// ============================================================================

/// All signal records for one image, keyed by analyzer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AssessmentBundle {
    records: BTreeMap<AnalyzerKey, SignalRecord>,
}

impl AssessmentBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record under its own key, replacing any previous one
    pub fn insert(&mut self, record: SignalRecord) -> Option<SignalRecord> {
        self.records.insert(record.key, record)
    }

    pub fn get(&self, key: AnalyzerKey) -> Option<&SignalRecord> {
        self.records.get(&key)
    }

    /// Payload of `key`, if the record exists and carries one
    pub fn payload(&self, key: AnalyzerKey) -> Option<&SignalPayload> {
        self.get(key).and_then(|r| r.result.as_ref())
    }

    pub fn classifier(&self) -> Option<&SignalRecord> {
        self.get(AnalyzerKey::DeepfakeDetection)
    }

    pub fn records(&self) -> impl Iterator<Item = &SignalRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records flagged Suspicious
    pub fn suspicious_count(&self) -> usize {
        self.records()
            .filter(|r| r.flag == SignalFlag::Suspicious)
            .count()
    }

    /// Number of records flagged Passed or Suspicious
    pub fn evidence_count(&self) -> usize {
        self.records().filter(|r| r.flag.is_evidence()).count()
    }
}

impl FromIterator<SignalRecord> for AssessmentBundle {
    fn from_iter<I: IntoIterator<Item = SignalRecord>>(iter: I) -> Self {
        let mut bundle = AssessmentBundle::new();
        for record in iter {
            bundle.insert(record);
        }
        bundle
    }
}
