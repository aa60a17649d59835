use thiserror::Error;

#[derive(Error, Debug)]
pub enum WhiteoutError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Document has no pages")]
    EmptyDocument,

    #[error("PDF operation failed: {0}")]
    OperationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Rasterization failed: {0}")]
    RasterError(String),

    #[error("Text extraction failed: {0}")]
    ExtractionError(String),
}

pub type Result<T> = std::result::Result<T, WhiteoutError>;
