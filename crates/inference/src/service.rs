use crate::{config::InferenceConfig, detector::ObjectDetector, error::ApiError};
use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::MultipartRejection,
    },
    http::{HeaderValue, Method},
    routing::post,
};
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use schema::{Detection, ImageMediaType, PredictionResponse, UPLOAD_FIELD, encode_jpeg_data_uri};
use std::{
    io::Cursor,
    sync::Arc,
    time::Instant,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

#[derive(Clone)]
struct ServiceMetrics {
    requests: Counter<u64>,
    duration: Histogram<f64>,
    detections: Counter<u64>,
}

impl ServiceMetrics {
    fn new(meter_name: &'static str) -> Self {
        let meter = global::meter(meter_name);
        let latency_buckets = [
            0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.15, 0.2, 0.3, 0.5, 0.75, 1.0, 2.0, 5.0,
        ];
        Self {
            requests: meter
                .u64_counter("predict_requests_total")
                .with_description("Prediction requests by outcome")
                .build(),
            duration: meter
                .f64_histogram("inference_duration_seconds")
                .with_description("Time to decode, detect and re-encode one upload")
                .with_unit("s")
                .with_boundaries(latency_buckets.to_vec())
                .build(),
            detections: meter
                .u64_counter("detections_total")
                .with_description("Total detections returned")
                .build(),
        }
    }
}

/// Shared per-process state handed to every request.
#[derive(Clone)]
pub struct AppState {
    detector: Arc<dyn ObjectDetector>,
    metrics: ServiceMetrics,
    max_upload_bytes: usize,
}

impl AppState {
    pub fn new(detector: Arc<dyn ObjectDetector>) -> Self {
        Self {
            detector,
            metrics: ServiceMetrics::new("inference"),
            max_upload_bytes: usize::MAX,
        }
    }
}

/// Build the HTTP surface: `POST /predict` behind CORS, a body limit and request tracing.
pub fn router(mut state: AppState, config: &InferenceConfig) -> anyhow::Result<Router> {
    let cors = cors_layer(&config.allowed_origins)?;
    state.max_upload_bytes = config.max_upload_bytes;

    Ok(Router::new()
        .route("/predict", post(predict))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| HeaderValue::from_str(origin))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request()))
}

async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let result = handle_predict(&state, multipart).await;

    let outcome = match &result {
        Ok(_) => "success",
        Err(err) if err.status().is_client_error() => "rejected",
        Err(_) => "error",
    };
    state
        .metrics
        .requests
        .add(1, &[KeyValue::new("status", outcome)]);

    result
}

async fn handle_predict(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let mut multipart = multipart?;
    let read_failed = |err| ApiError::from_multipart(err, state.max_upload_bytes);

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(read_failed)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or("<unnamed>").to_string();
        let content_type = field.content_type().unwrap_or("none").to_string();
        let bytes = field.bytes().await.map_err(read_failed)?;
        upload = Some((filename, content_type, bytes));
        break;
    }
    let (filename, content_type, bytes) = upload.ok_or(ApiError::MissingFile)?;

    tracing::info!(
        filename = %filename,
        content_type = %content_type,
        size = bytes.len(),
        "Received upload"
    );

    if ImageMediaType::from_declared(&content_type).is_none() {
        return Err(ApiError::InvalidFileType(content_type));
    }
    if bytes.is_empty() {
        return Err(ApiError::EmptyFile);
    }

    let start = Instant::now();
    let detector = Arc::clone(&state.detector);
    let (detections, image) =
        tokio::task::spawn_blocking(move || run_detection(detector.as_ref(), &bytes))
            .await
            .map_err(|e| ApiError::TaskFailed(e.to_string()))??;

    state
        .metrics
        .duration
        .record(start.elapsed().as_secs_f64(), &[]);
    state.metrics.detections.add(detections.len() as u64, &[]);

    tracing::info!(
        filename = %filename,
        detections = detections.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Prediction complete"
    );

    Ok(Json(PredictionResponse::Success { detections, image }))
}

/// Decode, detect and re-encode on the blocking pool.
fn run_detection(
    detector: &dyn ObjectDetector,
    bytes: &[u8],
) -> Result<(Vec<Detection>, String), ApiError> {
    let image = image::load_from_memory(bytes)
        .map_err(ApiError::Decode)?
        .to_rgb8();

    let detections = detector.detect(&image).map_err(ApiError::Inference)?;

    let mut encoded = Cursor::new(Vec::new());
    image
        .write_to(&mut encoded, image::ImageFormat::Jpeg)
        .map_err(ApiError::Encode)?;

    Ok((detections, encode_jpeg_data_uri(encoded.get_ref())))
}

pub struct InferenceService {
    detector: Arc<dyn ObjectDetector>,
    config: InferenceConfig,
}

impl InferenceService {
    pub fn new<D: ObjectDetector + 'static>(detector: D, config: InferenceConfig) -> Self {
        Self {
            detector: Arc::new(detector),
            config,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let app = router(AppState::new(self.detector), &self.config)?;

        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            addr = %listener.local_addr()?,
            model_path = %self.config.model_path,
            "Inference service listening"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Inference service stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining requests");
}
