use crate::errors::AppError;
use crate::gateway_client::GroqClient;
use crate::models::ConversationTurn;
use crate::session::{recording_fingerprint, ConversationSession};
use base64::Engine;
use std::io::Write;

/// Fixed assistant turn appended when the completion call fails. Completion
/// failure is absorbed into the log, not surfaced as an HTTP error.
pub const APOLOGY: &str =
    "Désolé, je rencontre un problème technique et ne peux pas répondre pour le moment. \
     Veuillez réessayer dans un instant.";

/// A completed browser recording, delivered as one base64 blob.
#[derive(Debug, Clone)]
pub struct RecordedAudio {
    pub bytes: Vec<u8>,
    /// Original base64 payload, attached to the user turn for replay.
    pub base64: String,
}

/// An audio file attached to an explicit send action.
#[derive(Debug, Clone)]
pub struct UploadedAudio {
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// The raw input sources present in one interaction cycle. Recording
/// arrival and send-click are mutually exclusive triggers in the UI, so at
/// most one of `recording` and `upload`/`text` is populated per request.
#[derive(Debug, Clone, Default)]
pub struct ChatInput {
    pub recording: Option<RecordedAudio>,
    pub upload: Option<UploadedAudio>,
    pub text: Option<String>,
}

/// The single input source that won arbitration for this cycle.
#[derive(Debug, Clone)]
pub enum SelectedInput {
    Recording(RecordedAudio),
    Upload(UploadedAudio),
    Text(String),
}

/// Turns appended by one cycle, plus the transcript when audio was involved.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub transcript: Option<String>,
    pub appended: Vec<ConversationTurn>,
}

/// Decodes a base64 audio payload from the browser.
pub fn decode_audio(data: &str) -> Result<Vec<u8>, AppError> {
    base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| AppError::BadRequest(format!("Invalid base64 audio payload: {}", e)))
}

/// Selects exactly one input source for the cycle.
///
/// Priority order: a newly-arrived recording whose fingerprint differs from
/// the last consumed one, then an uploaded audio file, then non-empty typed
/// text. Returns `None` when no source qualifies: the cycle is a no-op and
/// the log stays unchanged.
pub fn select_input(input: ChatInput, session: &ConversationSession) -> Option<SelectedInput> {
    if let Some(recording) = input.recording {
        let fingerprint = recording_fingerprint(&recording.bytes);
        if session.is_recording_consumed(&fingerprint) {
            tracing::debug!("Recording {} already consumed, ignoring", &fingerprint[..8]);
            return None;
        }
        return Some(SelectedInput::Recording(recording));
    }

    if let Some(upload) = input.upload {
        return Some(SelectedInput::Upload(upload));
    }

    if let Some(text) = input.text {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            return Some(SelectedInput::Text(trimmed.to_string()));
        }
    }

    None
}

/// Runs one interaction cycle: resolve the input to text, append the user
/// turn, request a completion, append the assistant turn.
///
/// A transcription failure aborts the cycle with no turn appended. A
/// recording's fingerprint is marked consumed before transcription is
/// attempted, so a failed transcription does not replay the same blob on
/// the next delivery.
pub async fn run_cycle(
    session: &mut ConversationSession,
    selected: SelectedInput,
    gateway: &GroqClient,
) -> Result<CycleOutcome, AppError> {
    let mut transcript = None;

    let user_turn = match selected {
        SelectedInput::Recording(recording) => {
            session.consume_recording(recording_fingerprint(&recording.bytes));
            let audio = spool_audio(&recording.bytes)?;
            let text = gateway.transcribe(audio, "recording.wav").await?;
            transcript = Some(text.clone());
            ConversationTurn::user(text).with_audio(recording.base64)
        }
        SelectedInput::Upload(upload) => {
            let audio = spool_audio(&upload.bytes)?;
            let text = gateway.transcribe(audio, &upload.filename).await?;
            transcript = Some(text.clone());
            // Uploaded files are not attached for replay
            ConversationTurn::user(text)
        }
        SelectedInput::Text(text) => ConversationTurn::user(text),
    };

    let content = user_turn.content.clone();
    session.push(user_turn.clone());

    // Completion is stateless with respect to history: only the current
    // message is sent.
    let assistant_turn = match gateway.complete(&content).await {
        Ok(reply) => ConversationTurn::assistant(reply),
        Err(e) => {
            tracing::warn!("Completion failed, appending apology turn: {}", e);
            ConversationTurn::assistant(APOLOGY)
        }
    };
    session.push(assistant_turn.clone());

    Ok(CycleOutcome {
        transcript,
        appended: vec![user_turn, assistant_turn],
    })
}

/// Spools audio through a temporary file before upload.
///
/// The file is removed on drop, on every exit path.
fn spool_audio(bytes: &[u8]) -> Result<Vec<u8>, AppError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| AppError::InternalError(format!("Failed to create temp audio file: {}", e)))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.flush())
        .map_err(|e| AppError::InternalError(format!("Failed to write temp audio file: {}", e)))?;

    std::fs::read(tmp.path())
        .map_err(|e| AppError::InternalError(format!("Failed to read temp audio file: {}", e)))
}
