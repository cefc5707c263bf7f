use super::{InferenceBackend, InferenceOutput};
use crate::config::{ExecutionProvider, InferenceConfig};
use crate::labels;
use ndarray::{Array, IxDyn};
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::TensorRef,
};
use std::sync::Mutex;

const INPUT_NAME: &str = "images";
const OUTPUT_NAME: &str = "output0";

pub struct OrtBackend {
    // `Session::run` needs `&mut`, so forward passes are serialized.
    session: Mutex<Session>,
    class_names: Vec<String>,
}

impl OrtBackend {
    /// Load model with specified execution provider
    pub fn load_model_with_provider(
        path: &str,
        provider: ExecutionProvider,
        intra_threads: usize,
    ) -> anyhow::Result<Self> {
        // Initialize ORT environment (idempotent)
        let _ = ort::init().commit();

        let mut builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(intra_threads)?;

        match provider {
            ExecutionProvider::Cuda => {
                tracing::info!("Initializing ONNX Runtime with CUDA execution provider");
                builder = builder.with_execution_providers([
                    ort::execution_providers::CUDAExecutionProvider::default()
                        .with_device_id(0)
                        .build()
                        .error_on_failure(),
                ])?;
            }
            ExecutionProvider::Cpu => {
                tracing::info!("Initializing ONNX Runtime with CPU execution provider");
            }
        }

        let session = builder.commit_from_file(path)?;

        let class_names = match session.metadata()?.custom("names") {
            Some(raw) => {
                let names = labels::parse_names_metadata(&raw);
                if names.is_empty() {
                    tracing::warn!("Model `names` metadata is unreadable, using COCO class names");
                    labels::coco_class_names()
                } else {
                    names
                }
            }
            None => {
                tracing::warn!("Model has no `names` metadata, using COCO class names");
                labels::coco_class_names()
            }
        };

        tracing::info!(
            path,
            num_classes = class_names.len(),
            "Model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            class_names,
        })
    }
}

impl InferenceBackend for OrtBackend {
    fn load_model(config: &InferenceConfig) -> anyhow::Result<Self> {
        Self::load_model_with_provider(
            &config.model_path,
            config.execution_provider,
            config.intra_threads,
        )
    }

    fn infer(&self, images: &Array<f32, IxDyn>) -> anyhow::Result<InferenceOutput> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Model session lock poisoned"))?;

        let outputs = session.run(ort::inputs![
            INPUT_NAME => TensorRef::from_array_view(images.view())?
        ])?;

        let preds = outputs[OUTPUT_NAME].try_extract_array::<f32>()?;

        Ok(InferenceOutput {
            preds: preds.into_owned(),
        })
    }

    fn class_names(&self) -> &[String] {
        &self.class_names
    }
}
