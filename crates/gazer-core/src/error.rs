use thiserror::Error;

#[derive(Error, Debug)]
pub enum GazerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Raw decoder unavailable: {0}")]
    SubprocessUnavailable(String),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Render error: {0}")]
    Render(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl GazerError {
    /// True for failures that mean "this decoder does not apply" rather than
    /// "this file is broken".
    pub fn is_not_applicable(&self) -> bool {
        matches!(self, GazerError::SubprocessUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, GazerError>;
