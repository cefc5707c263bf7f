pub mod app;
pub mod config;
pub mod error;
pub mod render;
pub mod transport;
pub mod upload;

pub use app::{App, Report};
pub use config::ClientConfig;
pub use error::ClientError;
pub use render::{Annotator, RenderError, detection_lines};
pub use transport::{HttpTransport, Transport, TransportError};
pub use upload::UploadedImage;
