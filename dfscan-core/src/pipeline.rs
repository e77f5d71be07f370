//! Pipeline: file → decoded image → assessment bundle → overall assessment
//!
//! Only a whole-image failure (unreadable or undecodable file) aborts an
//! assessment; it yields an error report with the failed assessment.

use crate::config::DfscanConfig;
use crate::error::ImageLoadError;
use crate::fusion::{fuse, FusionConfig, OverallAssessment};
use crate::input::{DecodedImage, ImageLoader};
use crate::orchestrator::Orchestrator;
use crate::types::AssessmentBundle;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Report outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Success,
    Error,
}

/// Complete result of analyzing one image
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub assessment_id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub analyses: AssessmentBundle,
    pub overall_assessment: OverallAssessment,
}

impl AnalysisReport {
    fn new(
        file_path: Option<PathBuf>,
        analyses: AssessmentBundle,
        overall_assessment: OverallAssessment,
    ) -> Self {
        Self {
            assessment_id: Uuid::new_v4(),
            analyzed_at: Utc::now(),
            file_path,
            status: ReportStatus::Success,
            error: None,
            analyses,
            overall_assessment,
        }
    }

    /// Report for an image that could not be loaded
    pub fn failed(file_path: Option<PathBuf>, error: impl ToString) -> Self {
        Self {
            status: ReportStatus::Error,
            error: Some(error.to_string()),
            ..Self::new(file_path, AssessmentBundle::new(), OverallAssessment::failed())
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ReportStatus::Success
    }
}

/// Loader, orchestrator, and fusion settings for one process
pub struct Pipeline {
    loader: ImageLoader,
    orchestrator: Orchestrator,
    fusion: FusionConfig,
}

impl Pipeline {
    pub fn new(loader: ImageLoader, orchestrator: Orchestrator, fusion: FusionConfig) -> Self {
        Self {
            loader,
            orchestrator,
            fusion,
        }
    }

    pub fn from_config(config: &DfscanConfig) -> Self {
        Self::new(
            ImageLoader::new(&config.analysis),
            Orchestrator::from_config(config),
            config.fusion.clone(),
        )
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Run every signal against a decoded image
    pub async fn assess(&self, image: Arc<DecodedImage>) -> AssessmentBundle {
        self.orchestrator.assess(image).await
    }

    /// Fuse a bundle with this pipeline's fusion settings
    pub fn fuse(&self, bundle: &AssessmentBundle) -> OverallAssessment {
        fuse(bundle, &self.fusion)
    }

    /// Load, assess, and fuse one image file
    pub async fn analyze_path(&self, path: &Path) -> AnalysisReport {
        let started = Instant::now();
        info!(path = %path.display(), "Analyzing image");

        let image = match self.load(path).await {
            Ok(image) => image,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Image could not be loaded");
                return AnalysisReport::failed(Some(path.to_path_buf()), e);
            }
        };

        let report = self.analyze_image(Arc::new(image), Some(path.to_path_buf())).await;
        info!(
            path = %path.display(),
            confidence = report.overall_assessment.confidence_score,
            deepfake = report.overall_assessment.is_likely_deepfake,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Image analyzed"
        );
        report
    }

    /// Assess and fuse an already-decoded image
    pub async fn analyze_image(
        &self,
        image: Arc<DecodedImage>,
        file_path: Option<PathBuf>,
    ) -> AnalysisReport {
        let bundle = self.assess(image).await;
        let overall = self.fuse(&bundle);
        AnalysisReport::new(file_path, bundle, overall)
    }

    async fn load(&self, path: &Path) -> Result<DecodedImage, ImageLoadError> {
        let loader = self.loader.clone();
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || loader.load(&path))
            .await
            .map_err(|e| ImageLoadError::Task(e.to_string()))?
    }
}
