use thiserror::Error;

#[derive(Debug, Error)]
pub enum WfError {
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("no workflow files found under {0}")]
    NoWorkflows(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, WfError>;
