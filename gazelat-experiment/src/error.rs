use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("log write error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
