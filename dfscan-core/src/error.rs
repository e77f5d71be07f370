//! Error types for dfscan-core
//!
//! Only [`ImageLoadError`] aborts an assessment. Analyzer and classifier
//! errors are folded into `Error` records by the orchestrator.

use std::path::PathBuf;
use thiserror::Error;

/// Failure inside a single signal analyzer
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Image has no pixels to analyze
    #[error("Image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// Embedded metadata could not be read
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// Numeric routine produced an unusable value
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Classifier adapter failure
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Classifier is not configured or failed to initialize
    #[error("Classifier not available: {0}")]
    NotAvailable(String),

    /// Network communication error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Inference service returned something we cannot interpret
    #[error("Invalid classifier response: {0}")]
    InvalidResponse(String),

    /// Image could not be encoded for transport
    #[error("Image encoding failed: {0}")]
    Encode(String),

    /// Prediction did not finish within its budget
    #[error("Classifier timed out after {0} ms")]
    Timeout(u64),
}

/// Whole-image failure: the image cannot be opened or decoded
#[derive(Debug, Error)]
pub enum ImageLoadError {
    /// File extension not in the allowed list
    #[error("Unsupported file type '{extension}' (allowed: {allowed})")]
    UnsupportedExtension { extension: String, allowed: String },

    /// File exceeds the configured size ceiling
    #[error("File too large: {size} bytes (max {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    /// File could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bytes are not a decodable image
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// Decoding task did not complete
    #[error("Image loading task failed: {0}")]
    Task(String),
}

/// Summary generation failure
#[derive(Debug, Error)]
pub enum SummaryError {
    /// Summarizer backend is unavailable
    #[error("Summarizer not available: {0}")]
    NotAvailable(String),

    /// Summarizer produced no usable text
    #[error("Summary generation failed: {0}")]
    Generation(String),
}
