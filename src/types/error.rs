use thiserror::Error;

/// repbill error types
#[derive(Error, Debug)]
pub enum RepbillError {
    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse an input file
    #[error("parse error: {0}")]
    Parse(String),

    /// Billing book operation failed
    #[error("store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// Upload rejected before parsing
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
}

/// Result type alias for repbill
pub type Result<T> = std::result::Result<T, RepbillError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RepbillError::Parse("bad row".into());
        assert_eq!(err.to_string(), "parse error: bad row");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: RepbillError = io_err.into();
        assert!(err.to_string().contains("io error"));
    }

    #[test]
    fn test_unsupported_format_display() {
        let err = RepbillError::UnsupportedFormat("report.pdf".into());
        assert_eq!(err.to_string(), "unsupported file format: report.pdf");
    }
}
