//! Error types for the printer library

use thiserror::Error;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// Network or device connection error
    #[error("Connection failed: {0}")]
    Connection(String),

    /// IO error during printing
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Printer answered the status query with a fault
    #[error("Printer offline: {0}")]
    Offline(String),

    /// Timeout waiting for printer
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid printer configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Barcode type the printer language has no command for
    #[error("Unsupported symbology: {0}")]
    UnsupportedSymbology(String),

    /// Data the selected symbology cannot encode
    #[error("Invalid barcode data: {0}")]
    InvalidData(String),
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
