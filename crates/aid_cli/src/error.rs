use std::io;

pub(crate) type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] aid_config::Error),

    #[error("Prompt error: {0}")]
    Prompt(#[from] inquire::InquireError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Task error: {0}")]
    Join(#[from] tokio::task::JoinError),
}
