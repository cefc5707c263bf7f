use common::{env_opt, env_or};
use std::env;

pub use common::Environment;

pub const DEFAULT_INPUT_SIZE: (u32, u32) = (640, 640);

/// Origins of the upload UI allowed to call the service from a browser.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:8501", "http://192.168.1.19:8501"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionProvider {
    Cpu,
    Cuda,
}

impl ExecutionProvider {
    fn from_env() -> Self {
        match env::var("EXECUTION_PROVIDER")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "cuda" | "gpu" => ExecutionProvider::Cuda,
            _ => ExecutionProvider::Cpu,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub environment: Environment,
    pub model_path: String,
    pub bind_addr: String,
    pub input_size: (u32, u32),
    pub iou_threshold: f32,
    pub max_detections: usize,
    pub allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
    pub execution_provider: ExecutionProvider,
    pub intra_threads: usize,
    pub otel_endpoint: Option<String>,
}

impl InferenceConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = Environment::from_env();

        let model_path =
            env::var("MODEL_PATH").unwrap_or_else(|_| "models/yolo11n.onnx".to_string());

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

        let input_width = env_or("INPUT_WIDTH", DEFAULT_INPUT_SIZE.0);
        let input_height = env_or("INPUT_HEIGHT", DEFAULT_INPUT_SIZE.1);
        if input_width == 0 || input_height == 0 {
            anyhow::bail!("INPUT_WIDTH and INPUT_HEIGHT must be positive");
        }

        let iou_threshold = env_or("IOU_THRESHOLD", 0.7);
        if !(0.0..=1.0).contains(&iou_threshold) {
            anyhow::bail!("IOU_THRESHOLD must be within [0, 1], got {}", iou_threshold);
        }

        let allowed_origins = match env_opt("CORS_ALLOWED_ORIGINS") {
            Some(list) => parse_origins(&list),
            None => DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect(),
        };

        Ok(Self {
            environment,
            model_path,
            bind_addr,
            input_size: (input_width, input_height),
            iou_threshold,
            max_detections: env_or("MAX_DETECTIONS", 300),
            allowed_origins,
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", 20 * 1024 * 1024),
            execution_provider: ExecutionProvider::from_env(),
            intra_threads: env_or("INTRA_THREADS", 4),
            otel_endpoint: env_opt("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }

    /// Create default configuration for testing
    #[cfg(test)]
    pub fn test_default() -> Self {
        Self {
            environment: Environment::Development,
            model_path: "models/yolo11n.onnx".to_string(),
            bind_addr: "127.0.0.1:0".to_string(),
            input_size: DEFAULT_INPUT_SIZE,
            iou_threshold: 0.7,
            max_detections: 300,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_upload_bytes: 1024 * 1024,
            execution_provider: ExecutionProvider::Cpu,
            intra_threads: 1,
            otel_endpoint: None,
        }
    }
}

fn parse_origins(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.trim_end_matches('/').to_string())
        .collect()
}
