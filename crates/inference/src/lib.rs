pub mod backend;
pub mod config;
pub mod detector;
pub mod error;
pub mod labels;
pub mod processing;
pub mod service;

// Re-export commonly used types for convenience
pub use backend::{InferenceBackend, InferenceOutput};
pub use config::InferenceConfig;
pub use detector::{ObjectDetector, YoloDetector};
pub use error::ApiError;
pub use service::{AppState, InferenceService, router};
