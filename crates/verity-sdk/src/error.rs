use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("policy error: {0}")]
    Policy(#[from] verity_policy::PolicyError),

    #[error("diff error: {0}")]
    Diff(#[from] verity_diff::DiffError),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type SdkResult<T> = Result<T, SdkError>;
