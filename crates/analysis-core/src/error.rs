use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("No price available for analysis")]
    NoPriceAvailable,

    #[error("Could not load prompt template: {0}")]
    TemplateError(String),

    #[error("Inference error: {0}")]
    InferenceError(String),

    #[error("Error parsing JSON response: {0}")]
    ParseError(String),

    #[error("Response does not contain the expected analysis structure: {0}")]
    UnexpectedStructure(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
