use common::{TelemetryGuard, setup_logging};
use inference::{
    InferenceConfig, InferenceService, YoloDetector, backend::InferenceBackend,
    backend::ort::OrtBackend,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = InferenceConfig::from_env()?;

    // The guard installs the subscriber itself when export is enabled
    let _telemetry = match config.otel_endpoint.as_deref() {
        Some(endpoint) => Some(TelemetryGuard::init(
            "inference",
            endpoint,
            config.environment,
        )?),
        None => {
            setup_logging(config.environment);
            None
        }
    };

    tracing::info!(
        config = ?config,
        "Loaded configuration"
    );

    tracing::info!(model_path = %config.model_path, "Loading inference model");
    let backend = OrtBackend::load_model(&config).inspect_err(|e| {
        tracing::error!(
            model_path = %config.model_path,
            error = %e,
            "Failed to load model"
        );
    })?;

    let detector = YoloDetector::new(backend, &config);
    InferenceService::new(detector, config).run().await
}
