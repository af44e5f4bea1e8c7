use graph_flow::GraphError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FactCheckError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("claim is empty")]
    EmptyClaim,

    #[error("{stage} stage generation failed: {message}")]
    Generation { stage: &'static str, message: String },

    #[error("workflow error: {0}")]
    Workflow(String),
}

impl FactCheckError {
    pub fn generation(stage: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Generation {
            stage,
            message: err.to_string(),
        }
    }
}

impl From<GraphError> for FactCheckError {
    fn from(err: GraphError) -> Self {
        FactCheckError::Workflow(err.to_string())
    }
}
