use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid path: {0}")]
    InvalidPath(std::path::PathBuf),
    #[error("Runtime error: {0}")]
    Runtime(String),
    #[error("Operation cancelled")]
    Cancelled,
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
}
