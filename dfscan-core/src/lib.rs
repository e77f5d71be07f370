//! dfscan-core library interface
//!
//! Multi-signal image authenticity assessment: six pixel/metadata
//! heuristics and an optional real/fake classifier run concurrently, and
//! their results are fused into one authenticity confidence.

pub mod analyzers;
pub mod classifier;
pub mod config;
pub mod error;
pub mod fusion;
pub mod input;
pub mod orchestrator;
pub mod pipeline;
pub mod summary;
pub mod types;

pub use config::DfscanConfig;
pub use fusion::{fuse, FusionConfig, OverallAssessment, Recommendation};
pub use input::{DecodedImage, ImageLoader};
pub use orchestrator::Orchestrator;
pub use pipeline::{AnalysisReport, Pipeline, ReportStatus};
pub use summary::{ReportSummarizer, ReportSummary, Summarizer};
pub use types::{AnalyzerKey, AssessmentBundle, SignalFlag, SignalPayload, SignalRecord};
