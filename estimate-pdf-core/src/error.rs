use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid PDF structure: {0}")]
    InvalidStructure(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid table: row {row} has {found} cells, expected {expected}")]
    InvalidTable {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Font error: {0}")]
    FontError(String),

    #[error("Compression error: {0}")]
    CompressionError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Document already finalized")]
    DocumentFinalized,

    #[error("Document generation failed earlier; discard it and start over")]
    DocumentFailed,

    #[error("Operation cancelled")]
    OperationCancelled,
}

pub type Result<T> = std::result::Result<T, PdfError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_pdf_error_display() {
        let error = PdfError::InvalidStructure("test message".to_string());
        assert_eq!(error.to_string(), "Invalid PDF structure: test message");
    }

    #[test]
    fn test_invalid_table_display() {
        let error = PdfError::InvalidTable {
            row: 4,
            expected: 5,
            found: 3,
        };
        assert_eq!(
            error.to_string(),
            "Invalid table: row 4 has 3 cells, expected 5"
        );
    }

    #[test]
    fn test_pdf_error_from_io_error() {
        let io_error = IoError::new(ErrorKind::NotFound, "file not found");
        let pdf_error = PdfError::from(io_error);

        match pdf_error {
            PdfError::Io(ref err) => {
                assert_eq!(err.kind(), ErrorKind::NotFound);
            }
            _ => panic!("Expected IO error variant"),
        }
    }

    #[test]
    fn test_lifecycle_errors() {
        assert_eq!(
            PdfError::DocumentFinalized.to_string(),
            "Document already finalized"
        );
        assert!(PdfError::DocumentFailed.to_string().contains("failed"));
        assert_eq!(
            PdfError::OperationCancelled.to_string(),
            "Operation cancelled"
        );
    }

    #[test]
    fn test_error_chain_display() {
        let errors = [
            (
                "Invalid image: corrupt JPEG",
                PdfError::InvalidImage("corrupt JPEG".to_string()),
            ),
            (
                "Compression error: deflate failed",
                PdfError::CompressionError("deflate failed".to_string()),
            ),
            (
                "Invalid configuration: chunk size must be at least 1",
                PdfError::InvalidConfiguration("chunk size must be at least 1".to_string()),
            ),
            (
                "Font error: missing font",
                PdfError::FontError("missing font".to_string()),
            ),
        ];

        for (expected, error) in errors {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_error_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PdfError>();
    }
}
