use crate::{
    error::ClientError,
    render::{Annotator, detection_lines},
    transport::Transport,
    upload::UploadedImage,
};
use schema::{Detection, PredictionResponse};
use std::path::{Path, PathBuf};

/// What a successful round trip produced.
#[derive(Debug)]
pub struct Report {
    pub detections: Vec<Detection>,
    pub lines: Vec<[String; 3]>,
    /// Where the annotated image went, or why it could not be drawn.
    /// A rendering failure does not discard the detections.
    pub annotated: Result<PathBuf, ClientError>,
}

pub struct App<T: Transport> {
    transport: T,
    annotator: Annotator,
}

impl<T: Transport> App<T> {
    pub fn new(transport: T, annotator: Annotator) -> Self {
        Self {
            transport,
            annotator,
        }
    }

    /// Validate, upload, and render one image. Invalid types never reach the transport.
    pub fn handle_upload(
        &self,
        upload: &UploadedImage,
        output: &Path,
    ) -> Result<Report, ClientError> {
        tracing::info!(
            filename = %upload.filename,
            media_type = %upload.media_type,
            size = upload.bytes.len(),
            "Uploaded file"
        );

        if let Err(err) = upload.validate() {
            tracing::error!(media_type = %upload.media_type, "Invalid file type");
            return Err(err);
        }

        let (detections, image) = match self.transport.predict(upload)? {
            PredictionResponse::Success { detections, image } => (detections, image),
            PredictionResponse::Failure { error } => {
                tracing::error!(%error, "Server returned error");
                return Err(ClientError::Server(error));
            }
        };

        let lines = detection_lines(&detections);

        let annotated = match self.annotator.render(&image, &detections, output) {
            Ok(()) => {
                tracing::info!(output = %output.display(), "Successfully processed and rendered results");
                Ok(output.to_path_buf())
            }
            Err(e) => {
                tracing::error!(error = %e, "Client error");
                Err(ClientError::Display(e))
            }
        };

        Ok(Report {
            detections,
            lines,
            annotated,
        })
    }
}
