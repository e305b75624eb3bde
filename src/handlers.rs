use crate::config::Config;
use crate::conversation::{self, ChatInput, RecordedAudio, UploadedAudio};
use crate::encoder;
use crate::errors::{AppError, ResultExt};
use crate::gateway_client::GroqClient;
use crate::models::{
    ChatCycleResponse, ChatMessageRequest, CustomerProfile, PredictionRecord, PredictionResult,
    RecordingRequest, SessionView,
};
use crate::predictor::ChurnModel;
use crate::session::{SessionHandle, SessionStore};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

/// Advisory shown when the model flags a churn risk.
pub const CHURN_ADVICE: &str = "Action Requise : Ce client présente un risque significatif de \
    désabonnement. Une intervention rapide (offre personnalisée, contact proactif) est cruciale \
    pour la rétention.";

/// Advisory shown when the model predicts a stable customer.
pub const NO_CHURN_ADVICE: &str = "Bonne nouvelle : Ce client est stable. Continuez à maintenir \
    une relation positive pour assurer sa satisfaction et sa fidélité.";

/// Message stored when the model itself fails at inference time.
pub const PREDICTION_FAILED_MESSAGE: &str =
    "Impossible de traiter les données. Vérifiez les entrées.";

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Pre-trained churn model, loaded once at startup.
    pub model: Arc<ChurnModel>,
    /// Client for the transcription/completion API.
    pub gateway: GroqClient,
    /// Per-user session store.
    pub sessions: SessionStore,
    /// Stylesheet content, read at startup (missing file aborts startup).
    pub stylesheet: String,
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "churn-insight-api",
            "version": "0.1.0"
        })),
    )
}

/// GET /assets/style.css
///
/// Serves the dashboard stylesheet loaded at startup.
pub async fn serve_stylesheet(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/css; charset=utf-8")],
        state.stylesheet.clone(),
    )
}

async fn session_or_404(state: &AppState, id: &str) -> Result<SessionHandle, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {} not found", id)))
}

async fn session_view(id: String, handle: &SessionHandle) -> SessionView {
    let session = handle.lock().await;
    SessionView {
        session_id: id,
        turns: session.conversation.turns().to_vec(),
        prediction: session.prediction.clone(),
    }
}

/// POST /api/v1/sessions
///
/// Creates a new user session seeded with the assistant greeting.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let (id, handle) = state.sessions.create().await;
    tracing::info!("POST /sessions - created {}", id);
    Ok((StatusCode::CREATED, Json(session_view(id, &handle).await)))
}

/// GET /api/v1/sessions/:id
///
/// Returns the conversation log and the stored prediction, if any.
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let handle = session_or_404(&state, &id).await?;
    Ok(Json(session_view(id, &handle).await))
}

/// POST /api/v1/sessions/:id/predict
///
/// Encodes the submitted profile and runs the churn model. An encoding
/// failure is surfaced to the user and the predictor is never invoked; an
/// inference failure is stored and returned as the error case of the
/// result, not as an HTTP error.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(profile): Json<CustomerProfile>,
) -> Result<Json<PredictionRecord>, AppError> {
    tracing::info!("POST /sessions/{}/predict", id);
    let handle = session_or_404(&state, &id).await?;

    // Fails closed: no vector, no prediction attempt.
    let vector = encoder::encode(&profile)?;

    let record = match state.model.predict(&vector) {
        Ok(prediction) => {
            let message = if prediction.label == 1 {
                CHURN_ADVICE
            } else {
                NO_CHURN_ADVICE
            };
            tracing::info!(
                "Prediction for session {}: label={} probability={:.4}",
                id,
                prediction.label,
                prediction.probability
            );
            PredictionRecord {
                result: prediction.into(),
                message: message.to_string(),
                created_at: Utc::now(),
            }
        }
        Err(e) => {
            tracing::error!("Model inference failed for session {}: {}", id, e);
            PredictionRecord {
                result: PredictionResult::Error {
                    message: e.to_string(),
                },
                message: PREDICTION_FAILED_MESSAGE.to_string(),
                created_at: Utc::now(),
            }
        }
    };

    // Replaced wholesale, never mutated in place.
    let mut session = handle.lock().await;
    session.prediction = Some(record.clone());

    Ok(Json(record))
}

/// DELETE /api/v1/sessions/:id/prediction
///
/// The "new prediction" action: clears the stored result.
pub async fn clear_prediction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    tracing::info!("DELETE /sessions/{}/prediction", id);
    let handle = session_or_404(&state, &id).await?;
    let mut session = handle.lock().await;
    session.prediction = None;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sessions/:id/chat/message
///
/// Explicit send action carrying typed text and/or an uploaded audio file.
/// The uploaded file wins arbitration when both are present.
pub async fn chat_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<ChatMessageRequest>,
) -> Result<Json<ChatCycleResponse>, AppError> {
    tracing::info!("POST /sessions/{}/chat/message", id);
    let handle = session_or_404(&state, &id).await?;

    let upload = match request.upload {
        Some(u) => Some(UploadedAudio {
            bytes: conversation::decode_audio(&u.data)?,
            filename: u.filename,
        }),
        None => None,
    };

    let input = ChatInput {
        recording: None,
        upload,
        text: request.text,
    };

    let mut session = handle.lock().await;
    let selected = conversation::select_input(input, &session.conversation).ok_or_else(|| {
        AppError::BadRequest("Message text or audio upload required".to_string())
    })?;

    let outcome = conversation::run_cycle(&mut session.conversation, selected, &state.gateway)
        .await
        .context("processing chat message")?;

    Ok(Json(ChatCycleResponse {
        transcript: outcome.transcript,
        turns: outcome.appended,
    }))
}

/// POST /api/v1/sessions/:id/chat/recording
///
/// Browser recording delivery. A blob whose fingerprint matches the last
/// consumed recording is a no-op (204): re-renders never replay a recording.
pub async fn chat_recording(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<RecordingRequest>,
) -> Result<Response, AppError> {
    tracing::info!("POST /sessions/{}/chat/recording", id);
    let handle = session_or_404(&state, &id).await?;

    let bytes = conversation::decode_audio(&request.audio)?;
    let input = ChatInput {
        recording: Some(RecordedAudio {
            bytes,
            base64: request.audio,
        }),
        upload: None,
        text: None,
    };

    let mut session = handle.lock().await;
    let selected = match conversation::select_input(input, &session.conversation) {
        Some(selected) => selected,
        None => {
            tracing::debug!("Duplicate recording for session {}, ignoring", id);
            return Ok(StatusCode::NO_CONTENT.into_response());
        }
    };

    let outcome = conversation::run_cycle(&mut session.conversation, selected, &state.gateway)
        .await
        .context("processing browser recording")?;

    Ok(Json(ChatCycleResponse {
        transcript: outcome.transcript,
        turns: outcome.appended,
    })
    .into_response())
}

/// DELETE /api/v1/sessions/:id/chat
///
/// Clears the conversation back to the single seeded greeting and forgets
/// the consumed-recording marker.
pub async fn clear_chat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    tracing::info!("DELETE /sessions/{}/chat", id);
    let handle = session_or_404(&state, &id).await?;
    {
        let mut session = handle.lock().await;
        session.conversation.clear();
    }
    Ok(Json(session_view(id, &handle).await))
}
