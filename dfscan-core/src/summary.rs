//! Report summaries
//!
//! [`Summarizer`] is the seam for an external natural-language generator.
//! [`ReportSummarizer`] is the built-in, rule-based fallback.

use crate::error::SummaryError;
use crate::pipeline::AnalysisReport;
use crate::types::{AnalyzerKey, SignalFlag};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Recommendation shown when the image could not be analyzed
pub const UNABLE_TO_ANALYZE: &str = "Unable to analyze image";

/// Per-analysis line of the technical breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicalDetail {
    pub operation: String,
    pub flag: SignalFlag,
    pub description: String,
}

/// Human-facing summary of one report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub summary: String,
    /// Authenticity confidence as an integer percentage
    pub score: u32,
    pub is_deepfake: bool,
    pub recommendation: String,
    pub technical_details: BTreeMap<AnalyzerKey, TechnicalDetail>,
}

impl ReportSummary {
    fn failed(error: &str) -> Self {
        Self {
            summary: format!("Analysis failed: {}", error),
            score: 0,
            is_deepfake: false,
            recommendation: UNABLE_TO_ANALYZE.to_string(),
            technical_details: BTreeMap::new(),
        }
    }
}

/// Summary generator trait
#[async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &str;

    async fn summarize(&self, report: &AnalysisReport) -> Result<ReportSummary, SummaryError>;
}

/// Rule-based plain-text summarizer
#[derive(Debug, Default, Clone, Copy)]
pub struct ReportSummarizer;

impl ReportSummarizer {
    pub fn new() -> Self {
        Self
    }

    /// Build the summary synchronously
    pub fn build(&self, report: &AnalysisReport) -> ReportSummary {
        if !report.is_success() {
            return ReportSummary::failed(report.error.as_deref().unwrap_or("Unknown error"));
        }

        let overall = &report.overall_assessment;
        let confidence = overall.confidence_score * 100.0;

        let mut lines = vec![
            "=== DEEPFAKE DETECTION ANALYSIS REPORT ===".to_string(),
            String::new(),
            "OVERALL ASSESSMENT:".to_string(),
            format!("- Authenticity Confidence: {:.1}%", confidence),
            format!(
                "- Classification: {}",
                if overall.is_likely_deepfake {
                    "LIKELY DEEPFAKE"
                } else {
                    "LIKELY AUTHENTIC"
                }
            ),
            format!("- Recommendation: {}", overall.recommendation),
        ];
        if overall.is_synthetic_artwork {
            lines.push("- Content appears to be synthetic artwork rather than a photograph".to_string());
        }
        lines.push(String::new());
        lines.push("DETAILED ANALYSIS RESULTS:".to_string());

        let mut technical_details = BTreeMap::new();
        for record in report.analyses.records() {
            lines.push(format!(
                "{} {}: {}",
                status_marker(record.flag),
                record.operation,
                record.description
            ));
            technical_details.insert(
                record.key,
                TechnicalDetail {
                    operation: record.operation.clone(),
                    flag: record.flag,
                    description: record.description.clone(),
                },
            );
        }

        lines.push(String::new());
        lines.push("=== END REPORT ===".to_string());

        ReportSummary {
            summary: lines.join("\n"),
            score: confidence.clamp(0.0, 100.0) as u32,
            is_deepfake: overall.is_likely_deepfake,
            recommendation: overall.recommendation.to_string(),
            technical_details,
        }
    }
}

#[async_trait]
impl Summarizer for ReportSummarizer {
    fn name(&self) -> &str {
        "rule-based"
    }

    async fn summarize(&self, report: &AnalysisReport) -> Result<ReportSummary, SummaryError> {
        Ok(self.build(report))
    }
}

fn status_marker(flag: SignalFlag) -> &'static str {
    match flag {
        SignalFlag::Suspicious => "[x]",
        SignalFlag::Passed => "[ok]",
        SignalFlag::Error | SignalFlag::Skipped => "[!]",
    }
}

/// Summarize with `primary`, falling back to the rule-based summary on
/// failure or on a blank summary
pub async fn summarize_with_fallback(
    primary: Option<&dyn Summarizer>,
    report: &AnalysisReport,
) -> ReportSummary {
    if let Some(summarizer) = primary {
        let generated = summarizer.summarize(report).await.and_then(|summary| {
            if summary.summary.trim().is_empty() {
                Err(SummaryError::Generation("summarizer returned empty text".to_string()))
            } else {
                Ok(summary)
            }
        });
        match generated {
            Ok(summary) => return summary,
            Err(e) => {
                warn!(summarizer = summarizer.name(), error = %e, "Summarizer failed - using rule-based summary");
            }
        }
    }
    ReportSummarizer::new().build(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::{fuse, FusionConfig};
    use crate::types::{AssessmentBundle, NoiseResult, SignalPayload, SignalRecord};

    fn report() -> AnalysisReport {
        let bundle: AssessmentBundle = vec![
            SignalRecord::from_payload(
                AnalyzerKey::NoiseAnalysis,
                SignalPayload::Noise(NoiseResult {
                    noise_level: 0.3,
                    compression_artifacts: 0.4,
                    noise_consistency: 0.5,
                    suspicious_score: 1.0,
                }),
            ),
            SignalRecord::skipped(AnalyzerKey::DeepfakeDetection, "no classifier"),
        ]
        .into_iter()
        .collect();
        let overall = fuse(&bundle, &FusionConfig::default());
        let mut report = AnalysisReport::failed(None, "placeholder");
        report.status = crate::pipeline::ReportStatus::Success;
        report.error = None;
        report.analyses = bundle;
        report.overall_assessment = overall;
        report
    }

    struct Broken;

    #[async_trait]
    impl Summarizer for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        async fn summarize(&self, _report: &AnalysisReport) -> Result<ReportSummary, SummaryError> {
            Err(SummaryError::NotAvailable("no backend".to_string()))
        }
    }

    struct Blank;

    #[async_trait]
    impl Summarizer for Blank {
        fn name(&self) -> &str {
            "blank"
        }

        async fn summarize(&self, report: &AnalysisReport) -> Result<ReportSummary, SummaryError> {
            let mut summary = ReportSummarizer::new().build(report);
            summary.summary = "  ".to_string();
            summary.recommendation = "ignored".to_string();
            Ok(summary)
        }
    }

    #[test]
    fn test_rule_based_summary_lists_every_record() {
        let summary = ReportSummarizer::new().build(&report());
        assert_eq!(summary.score, 0);
        assert!(summary.is_deepfake);
        assert!(summary.summary.contains("LIKELY DEEPFAKE"));
        assert!(summary.summary.contains("[x] Noise Pattern Analysis"));
        assert!(summary.summary.contains("[!] AI Deepfake Detection: no classifier"));
        assert_eq!(summary.technical_details.len(), 2);
        assert_eq!(
            summary.technical_details[&AnalyzerKey::NoiseAnalysis].flag,
            SignalFlag::Suspicious
        );
    }

    #[test]
    fn test_failed_report_summary() {
        let summary = ReportSummarizer::new().build(&AnalysisReport::failed(None, "corrupt file"));
        assert_eq!(summary.summary, "Analysis failed: corrupt file");
        assert_eq!(summary.score, 0);
        assert_eq!(summary.recommendation, UNABLE_TO_ANALYZE);
    }

    #[tokio::test]
    async fn test_fallback_on_summarizer_error() {
        let broken = Broken;
        let summary = summarize_with_fallback(Some(&broken), &report()).await;
        assert!(summary.summary.starts_with("=== DEEPFAKE DETECTION ANALYSIS REPORT ==="));
    }

    #[tokio::test]
    async fn test_blank_summary_falls_back() {
        let blank = Blank;
        let summary = summarize_with_fallback(Some(&blank), &report()).await;
        assert!(summary.summary.ends_with("=== END REPORT ==="));
        assert_ne!(summary.recommendation, "ignored");
    }
}
