// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use axum::{
    Router,
    extract::{
        Multipart, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{Json, Response},
    routing::{get, post},
};
use posture_inference::{
    ErrorVerdict, FrameFeedback, InferenceConfig, KeypointProvider, PoseModel, PostureDetector,
    PostureVerdict, decode_image_bytes,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

const DEFAULT_MODEL: &str = "pose_landmark_full.onnx";
const DEFAULT_PORT: &str = "5000";

// Shared application state
struct AppState {
    detector: Mutex<PostureDetector<PoseModel>>,
    model_path: String,
}

// Inbound WebSocket frame (`process_frame` event)
#[derive(Debug, Deserialize)]
struct FrameRequest {
    /// Frame encoded as a data URL, e.g. `data:image/jpeg;base64,...`
    image: String,
}

#[derive(Serialize, ToSchema)]
struct KeypointData {
    /// Landmark index (0-32, BlazePose topology)
    id: usize,
    /// X coordinate in pixels
    x: i32,
    /// Y coordinate in pixels
    y: i32,
    /// Visibility (0.0 - 1.0)
    visibility: f32,
}

#[derive(Serialize, ToSchema)]
struct VerdictResponse {
    /// Whether any posture rule fired
    is_bad_posture: bool,
    /// Rule descriptions, "Good Posture", or empty when no body was found
    message: String,
    /// Every landmark of the detected body, empty when no body was found
    keypoints: Vec<KeypointData>,
}

impl From<PostureVerdict> for VerdictResponse {
    fn from(verdict: PostureVerdict) -> Self {
        Self {
            is_bad_posture: verdict.is_bad_posture,
            message: verdict.message,
            keypoints: verdict
                .keypoints
                .into_iter()
                .map(|kp| KeypointData {
                    id: kp.id,
                    x: kp.x,
                    y: kp.y,
                    visibility: kp.visibility,
                })
                .collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    /// Error message
    error: String,
    /// Always false
    is_bad_posture: bool,
    /// Always "Processing error"
    message: String,
}

impl From<ErrorVerdict> for ErrorResponse {
    fn from(err: ErrorVerdict) -> Self {
        Self {
            error: err.error,
            is_bad_posture: err.is_bad_posture,
            message: err.message,
        }
    }
}

#[derive(Serialize, ToSchema)]
struct InfoResponse {
    /// Path to the loaded model
    model_path: String,
    /// Input image size (height, width)
    imgsz: (usize, usize),
    /// Model output names
    outputs: Vec<String>,
}

#[derive(Serialize, ToSchema)]
struct HealthResponse {
    /// Server status
    status: String,
    /// API version
    version: String,
}

// OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Posture Inference Server",
        description = "Real-time posture feedback for squats and desk sitting.\n\n## Transports\n- `POST /predict`: multipart upload, one verdict per image\n- `GET /ws`: WebSocket, send `{\"image\": \"data:image/jpeg;base64,...\"}` per frame and receive one verdict per message",
        version = "0.1.0",
        license(name = "AGPL-3.0", url = "https://ultralytics.com/license"),
        contact(name = "Ultralytics", url = "https://ultralytics.com")
    ),
    paths(root, health, info, predict),
    components(schemas(KeypointData, VerdictResponse, ErrorResponse, InfoResponse, HealthResponse)),
    tags(
        (name = "inference", description = "Posture feedback endpoints"),
        (name = "health", description = "Health check endpoints")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let model_path = env::var("MODEL_PATH").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
    let config = config_from_env(env::var("CONF").ok().as_deref());

    info!(model = %model_path, conf = config.min_detection_confidence, "loading pose model");
    let model = PoseModel::load_with_config(&model_path, config)?;
    info!(imgsz = ?model.imgsz(), outputs = ?model.output_names(), "model loaded");

    let state = Arc::new(AppState {
        detector: Mutex::new(PostureDetector::new(model)),
        model_path,
    });

    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/info", get(info))
        .route("/predict", post(predict))
        .route("/ws", get(ws_handler))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state);

    let port = env::var("PORT").unwrap_or_else(|_| DEFAULT_PORT.to_string());
    let addr = format!("0.0.0.0:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", listener.local_addr()?);
    info!("Swagger UI available at http://localhost:{port}/swagger-ui/");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Inference settings from the `CONF` environment value.
fn config_from_env(conf: Option<&str>) -> InferenceConfig {
    let config = InferenceConfig::new();
    match conf.map(str::parse::<f32>) {
        Some(Ok(conf)) => config.with_confidence(conf),
        Some(Err(e)) => {
            warn!("ignoring invalid CONF value: {e}");
            config
        }
        None => config,
    }
}

/// Root endpoint
///
/// Returns a welcome message.
#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses(
        (status = 200, description = "Welcome message", body = String)
    )
)]
async fn root() -> &'static str {
    "Posture Inference Server - POST /predict with an image file or stream frames over /ws. Swagger UI at /swagger-ui/"
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is healthy", body = HealthResponse)
    )
)]
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: posture_inference::VERSION.to_string(),
    })
}

/// Model information endpoint
#[utoipa::path(
    get,
    path = "/info",
    tag = "inference",
    responses(
        (status = 200, description = "Model information", body = InfoResponse)
    )
)]
async fn info(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    let detector = state.detector.lock().await;
    let model = detector.provider();
    Json(InfoResponse {
        model_path: state.model_path.clone(),
        imgsz: model.imgsz(),
        outputs: model.output_names().to_vec(),
    })
}

/// Check posture on an uploaded image
///
/// Upload an image in the `image` multipart field. A frame without a body
/// yields `is_bad_posture = false` with an empty message and no keypoints.
#[utoipa::path(
    post,
    path = "/predict",
    tag = "inference",
    request_body(content_type = "multipart/form-data", description = "Image file to analyze"),
    responses(
        (status = 200, description = "Posture verdict", body = VerdictResponse),
        (status = 400, description = "Bad request - invalid image or missing field", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
async fn predict(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<VerdictResponse>, (StatusCode, Json<ErrorResponse>)> {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("image") {
            continue;
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| reject(StatusCode::BAD_REQUEST, format!("Failed to read field: {e}")))?;

        let img = decode_image_bytes(&data).map_err(|e| reject(StatusCode::BAD_REQUEST, e))?;

        let mut detector = state.detector.lock().await;
        let verdict = detector
            .process_frame(&img)
            .map_err(|e| reject(StatusCode::INTERNAL_SERVER_ERROR, e))?;

        return Ok(Json(verdict.into()));
    }

    Err(reject(StatusCode::BAD_REQUEST, "Missing 'image' field"))
}

fn reject(status: StatusCode, error: impl ToString) -> (StatusCode, Json<ErrorResponse>) {
    let verdict = ErrorVerdict::new(error);
    debug!(%status, error = %verdict.error, "request rejected");
    (status, Json(verdict.into()))
}

/// WebSocket endpoint: one `FrameFeedback` per inbound frame.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("websocket connected");
    while let Some(msg) = socket.recv().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                debug!("websocket receive failed: {e}");
                break;
            }
        };

        let feedback = match msg {
            Message::Text(text) => {
                let mut detector = state.detector.lock().await;
                frame_feedback(&mut detector, text.as_str())
            }
            Message::Binary(bytes) => {
                let mut detector = state.detector.lock().await;
                detector.process_encoded(&bytes)
            }
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) => continue,
        };

        let reply = match serde_json::to_string(&feedback) {
            Ok(reply) => reply,
            Err(e) => {
                warn!("failed to serialize frame feedback: {e}");
                continue;
            }
        };
        if socket.send(Message::Text(reply.into())).await.is_err() {
            break;
        }
    }
    debug!("websocket disconnected");
}

/// Answer one text frame message. Malformed messages get an error verdict.
fn frame_feedback<P: KeypointProvider>(detector: &mut PostureDetector<P>, text: &str) -> FrameFeedback {
    match serde_json::from_str::<FrameRequest>(text) {
        Ok(request) => detector.process_data_url(&request.image),
        Err(e) => ErrorVerdict::new(format!("Malformed frame message: {e}")).into(),
    }
}
