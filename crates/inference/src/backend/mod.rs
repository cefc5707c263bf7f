use crate::config::InferenceConfig;
use ndarray::{Array, IxDyn};

#[cfg(feature = "ort-backend")]
pub mod ort;

/// A loaded detection model. Implementations own the runtime session and are
/// shared read-only across requests once loaded.
pub trait InferenceBackend: Send + Sync {
    fn load_model(config: &InferenceConfig) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Run one forward pass on a `[1, 3, H, W]` tensor scaled to `[0, 1]`
    fn infer(&self, images: &Array<f32, IxDyn>) -> anyhow::Result<InferenceOutput>;

    /// Class names indexed by predicted class id
    fn class_names(&self) -> &[String];
}

pub struct InferenceOutput {
    pub preds: ndarray::ArrayD<f32>, // [1, 4 + num_classes, num_anchors] cxcywh in input pixels
}
