use thiserror::Error;

#[derive(Error, Debug)]
pub enum OfxloadError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid transaction amount: {raw:?}")]
    InvalidAmount { raw: String },

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, OfxloadError>;
