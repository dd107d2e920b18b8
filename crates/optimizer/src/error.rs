use indicatif::style::TemplateError;
use serde_json::Error as JsonError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptimizerError {
    #[error("Analysis of optimization results failed: {0}")]
    Analyzer(#[from] analyzer::AnalyzerError),

    #[error("Failed to build the worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Parameter generation failed: {0}")]
    ParameterGeneration(String),

    #[error("No instruments were given to optimize.")]
    NoInstruments,

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] JsonError),

    #[error("Progress bar template error: {0}")]
    ProgressBarTemplate(String),
}

impl From<TemplateError> for OptimizerError {
    fn from(error: TemplateError) -> Self {
        OptimizerError::ProgressBarTemplate(error.to_string())
    }
}
