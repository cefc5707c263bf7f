use crate::{
    backend::{InferenceBackend, InferenceOutput},
    config::InferenceConfig,
    labels,
    processing::{
        post::{PostProcessor, RawDetection, TransformParams},
        pre::{PreProcessor, Preprocessed},
    },
};
use image::RgbImage;
use schema::Detection;

/// What the HTTP layer needs from a model: an RGB image in, labelled boxes out.
///
/// Implementations are loaded once and shared by every request, so `detect`
/// takes `&self` and must be safe to call from several threads.
pub trait ObjectDetector: Send + Sync {
    fn detect(&self, image: &RgbImage) -> anyhow::Result<Vec<Detection>>;
}

/// YOLO-style detector: letterbox, forward pass, decode + NMS, name lookup.
pub struct YoloDetector<B: InferenceBackend> {
    backend: B,
    preprocessor: PreProcessor,
    postprocessor: PostProcessor,
}

impl<B: InferenceBackend> YoloDetector<B> {
    pub fn new(backend: B, config: &InferenceConfig) -> Self {
        Self {
            backend,
            preprocessor: PreProcessor::new(config.input_size),
            postprocessor: PostProcessor::new(config.iou_threshold, config.max_detections),
        }
    }
}

impl<B: InferenceBackend> ObjectDetector for YoloDetector<B> {
    fn detect(&self, image: &RgbImage) -> anyhow::Result<Vec<Detection>> {
        let (width, height) = image.dimensions();

        let Preprocessed {
            input,
            scale,
            offset_x,
            offset_y,
        } = self.preprocessor.preprocess(image)?;

        let InferenceOutput { preds } = {
            let _infer_span = tracing::info_span!("model_inference").entered();
            self.backend.infer(&input)?
        };

        let transform = TransformParams {
            orig_width: width,
            orig_height: height,
            scale,
            offset_x,
            offset_y,
        };

        let raw = self
            .postprocessor
            .parse_detections(&preds.view(), &transform)?;

        Ok(label_detections(raw, self.backend.class_names()))
    }
}

/// Attach class names from the model's own table.
pub fn label_detections(raw: Vec<RawDetection>, class_names: &[String]) -> Vec<Detection> {
    raw.into_iter()
        .map(|d| Detection {
            class_label: class_names
                .get(d.class_id)
                .cloned()
                .unwrap_or_else(|| labels::fallback_label(d.class_id)),
            confidence: d.confidence,
            bbox: [d.x1, d.y1, d.x2, d.y2],
        })
        .collect()
}
