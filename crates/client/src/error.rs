use crate::{render::RenderError, transport::TransportError};
use thiserror::Error;

/// Everything the client reports to the user. Nothing here is fatal to the process
/// beyond a non-zero exit code.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid file type: {0}. Please upload a JPEG or PNG image.")]
    InvalidFileType(String),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to process image: {0}")]
    Transport(#[from] TransportError),

    #[error("Error from server: {0}")]
    Server(String),

    #[error("Error displaying image: {0}")]
    Display(#[from] RenderError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message() {
        let err = ClientError::from(TransportError::Status {
            status: 400,
            body: r#"{"detail":"Empty file received"}"#.to_string(),
        });
        assert_eq!(
            err.to_string(),
            r#"Failed to process image: HTTP 400 - {"detail":"Empty file received"}"#
        );
    }

    #[test]
    fn test_server_error_message() {
        let err = ClientError::Server("model not loaded".to_string());
        assert_eq!(err.to_string(), "Error from server: model not loaded");
    }
}
