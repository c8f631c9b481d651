//! Error types for the PDFium host core

use crate::engine::handle::HandleKind;
use crate::range::RangeError;
use thiserror::Error;

/// Result type alias for the PDFium host core
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the PDFium host core
#[derive(Error, Debug)]
pub enum Error {
    /// Operation attempted on a released or never-valid native handle
    #[error("invalid {kind} handle: released or never valid")]
    InvalidHandle { kind: HandleKind },

    /// Cache constructed with a non-positive capacity
    #[error("cache capacity must be at least 1 (got {capacity})")]
    CapacityConfiguration { capacity: usize },

    /// Operation attempted on an already-disposed cache
    #[error("cache has been disposed")]
    CacheDisposed,

    /// Native engine used before process-wide initialization
    #[error("PDFium library is not initialized")]
    NotInitialized,

    /// Invalid page range specification
    #[error(transparent)]
    InvalidPageRange(#[from] RangeError),

    /// PDF file not found
    #[error("PDF not found: {path}")]
    PdfNotFound { path: String },

    /// Invalid PDF file
    #[error("Invalid PDF file: {reason}")]
    InvalidPdf { reason: String },

    /// PDF is password protected and no password was provided
    #[error("PDF is password protected")]
    PasswordRequired,

    /// Incorrect password provided
    #[error("Incorrect password")]
    IncorrectPassword,

    /// Page out of bounds
    #[error("Page {page} out of bounds (total: {total})")]
    PageOutOfBounds { page: u32, total: u32 },

    /// PDFium error
    #[error("PDFium error: {reason}")]
    Pdfium { reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Return a sanitized error message safe to show to an end user.
    ///
    /// Contract violations (invalid handle, disposed cache, missing init)
    /// indicate a defect in the embedding application, not a user mistake:
    /// they collapse to a generic message here. Full details should be logged
    /// via tracing before calling this. Range validation errors keep their
    /// precise text, since the user is the one who can fix them.
    pub fn public_message(&self) -> String {
        match self {
            Error::InvalidHandle { .. }
            | Error::CacheDisposed
            | Error::NotInitialized
            | Error::CapacityConfiguration { .. } => "internal error".to_string(),
            Error::InvalidPageRange(e) => e.to_string(),
            Error::PdfNotFound { .. } => "PDF not found".to_string(),
            Error::InvalidPdf { .. } => "Invalid PDF file".to_string(),
            Error::PasswordRequired => "PDF is password protected".to_string(),
            Error::IncorrectPassword => "Incorrect password".to_string(),
            Error::PageOutOfBounds { page, total } => {
                format!("Page {} out of bounds (total: {})", page, total)
            }
            Error::Pdfium { .. } => "PDF processing error".to_string(),
            Error::Io(_) => "I/O error".to_string(),
        }
    }

    /// Whether this error is a programming-contract violation rather than an
    /// expected runtime condition. Contract violations should never be
    /// retried; their appearance means the embedding code is wired wrong.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Error::InvalidHandle { .. }
                | Error::CacheDisposed
                | Error::NotInitialized
                | Error::CapacityConfiguration { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_violations_hide_details() {
        let err = Error::InvalidHandle {
            kind: HandleKind::Document,
        };
        assert_eq!(err.public_message(), "internal error");
        assert!(err.is_contract_violation());

        assert_eq!(Error::CacheDisposed.public_message(), "internal error");
    }

    #[test]
    fn test_range_errors_stay_precise() {
        let err = Error::from(RangeError::ReversedRange {
            token: "5-1".to_string(),
            input: "5-1".to_string(),
        });
        assert!(err.public_message().contains("5-1"));
        assert!(!err.is_contract_violation());
    }
}
