use thiserror::Error;

use crate::config::ConfigError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported model kind `{0}` (expected `linear` or `poly`)")]
    UnsupportedModel(String),

    #[error("classifier has not been trained")]
    NotFitted,

    #[error("training data contains no categories")]
    EmptyTrainingSet,

    #[error("no terms remain after document-frequency pruning")]
    EmptyVocabulary,

    #[error("vectorizer produces {vectorizer} features but the classifier expects {classifier}")]
    DimensionMismatch { vectorizer: usize, classifier: usize },

    #[error("model encoding failed: {0}")]
    ModelCodec(#[from] bincode::Error),

    #[error("model format `{found}` is not supported (expected `{expected}`)")]
    IncompatibleModel { found: String, expected: String },

    #[error("model file is inconsistent: {0}")]
    CorruptModel(String),

    #[error("classifier: {0}")]
    Classifier(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("browser: {0}")]
    Browser(String),

    #[error("root page {url} could not be loaded: {reason}")]
    RootPage { url: String, reason: String },

    #[error("chart rendering failed: {0}")]
    Chart(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
