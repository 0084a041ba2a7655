use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Index {index} is out of vocabulary range [0, {vocabulary_size})")]
    IndexOutOfRange { index: usize, vocabulary_size: usize },

    #[error("Requested {requested} words but the vector source only has {available}")]
    CapacityExceeded { requested: usize, available: usize },

    #[error("Meta token name '{0}' is reserved")]
    ReservedMetaToken(String),

    #[error("Codec has no meta token '{0}'")]
    MissingMetaToken(String),

    #[error("Context size must be at least 1, got {0}")]
    InvalidContextSize(usize),

    #[error("Malformed codec: {0}")]
    MalformedCodec(String),

    #[error("Malformed vector file at line {line}: {reason}")]
    MalformedVectors { line: usize, reason: String },

    #[error("Segmentation failed: {0}")]
    Segmentation(String),

    #[error("Context window holds {actual} indices, expected {expected}")]
    ContextLength { expected: usize, actual: usize },

    #[error("Predictor returned {actual} logits, expected {expected}")]
    PredictionShape { expected: usize, actual: usize },

    #[error("Cannot sample from prediction: {0}")]
    Sampling(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
