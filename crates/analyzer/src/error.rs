use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("No evaluated candidates to analyze for {0}")]
    NoEvaluations(String),

    #[error("Acceptance rules are invalid: {0}")]
    InvalidRules(String),
}
