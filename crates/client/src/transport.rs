use crate::upload::UploadedImage;
use reqwest::{
    StatusCode,
    blocking::{
        Client,
        multipart::{Form, Part},
    },
};
use schema::{PredictionResponse, UPLOAD_FIELD};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    /// Anything but 200, with the body text as the service sent it.
    #[error("HTTP {status} - {body}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Network(#[from] reqwest::Error),

    #[error("unreadable response body: {0}")]
    MalformedResponse(String),
}

/// Sends one upload to the detection service and returns its verdict.
pub trait Transport {
    fn predict(&self, upload: &UploadedImage) -> Result<PredictionResponse, TransportError>;
}

pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    /// `timeout: None` disables reqwest's default and waits for as long as inference takes.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl Transport for HttpTransport {
    fn predict(&self, upload: &UploadedImage) -> Result<PredictionResponse, TransportError> {
        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.filename.clone())
            .mime_str(&upload.media_type)?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        tracing::info!(endpoint = %self.endpoint, filename = %upload.filename, "Sending image for detection");

        let response = self.client.post(&self.endpoint).multipart(form).send()?;
        let status = response.status();
        let body = response.text()?;

        if status != StatusCode::OK {
            tracing::error!(status = status.as_u16(), %body, "HTTP error");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| TransportError::MalformedResponse(e.to_string()))
    }
}
