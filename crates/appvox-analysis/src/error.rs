use thiserror::Error;

/// Failure of an external model call (sentiment classifier or keyword
/// embedder). The pipeline recovers from these per record; they never abort
/// a batch.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("inference error: {0}")]
    Inference(String),
}
