//! Classifier adapter
//!
//! The probabilistic real/fake classifier is an external capability. The
//! pipeline only needs `predict`, and treats the classifier as optional: no
//! classifier (or an unavailable one) produces a Skipped record.

use crate::error::ClassifierError;
use crate::input::DecodedImage;
use crate::types::ClassifierResult;
use async_trait::async_trait;

pub mod remote;

pub use remote::{InferenceRequest, InferenceResponse, RemoteClassifier};

/// Classifier trait - implemented by every real/fake model adapter
#[async_trait]
pub trait DeepfakeClassifier: Send + Sync {
    /// Adapter name for logs
    fn name(&self) -> &str;

    /// Whether predictions can be attempted (model loaded, endpoint configured)
    fn is_available(&self) -> bool {
        true
    }

    /// Predict real/fake for one image
    ///
    /// # Returns
    /// * `Ok(ClassifierResult)` - label, score, and raw probabilities when known
    /// * `Err(_)` - prediction failed (recorded as an Error record)
    async fn predict(&self, image: &DecodedImage) -> Result<ClassifierResult, ClassifierError>;
}
