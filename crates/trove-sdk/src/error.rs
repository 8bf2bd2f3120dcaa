use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("no entity registered for type {0}")]
    UnregisteredKind(&'static str),

    #[error("kind {0} is already registered")]
    DuplicateKind(String),

    #[error("batch stopped after failure at index {index}")]
    BatchAborted { index: usize },

    #[error("invalid config: {0}")]
    Config(String),

    #[error("type error: {0}")]
    Types(#[from] trove_types::TypeError),

    #[error("store error: {0}")]
    Store(#[from] trove_store::StoreError),

    #[error("translate error: {0}")]
    Translate(#[from] trove_translate::TranslateError),

    #[error("schema error: {0}")]
    Schema(#[from] trove_translate::SchemaError),
}

pub type SdkResult<T> = Result<T, SdkError>;
