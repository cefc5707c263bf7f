//! Wire contract between the upload client and the inference service.
//!
//! Everything that crosses the HTTP boundary lives here so both processes
//! serialize and validate it the same way.

pub mod data_uri;
pub mod detection;
pub mod errors;
pub mod media;

pub use data_uri::{decode_data_uri, encode_jpeg_data_uri};
pub use detection::{Detection, ErrorBody, PredictionResponse};
pub use errors::SchemaError;
pub use media::ImageMediaType;

/// Minimum score a detection needs to be reported.
pub const CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Name of the multipart field carrying the uploaded image.
pub const UPLOAD_FIELD: &str = "file";
