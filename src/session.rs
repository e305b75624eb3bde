use crate::models::{ConversationTurn, PredictionRecord};
use moka::future::Cache;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Greeting seeded as the first assistant turn of every conversation.
pub const GREETING: &str =
    "Bonjour ! Je suis votre assistant virtuel. Comment puis-je vous aider aujourd'hui ?";

/// Computes the deduplication fingerprint of a recorded audio blob.
///
/// The raw bytes are hashed rather than stored so per-session memory stays
/// bounded regardless of recording size.
pub fn recording_fingerprint(audio_bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(audio_bytes);
    hex::encode(hasher.finalize())
}

/// Append-only conversation log plus the marker preventing a browser
/// recording from being processed twice.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    turns: Vec<ConversationTurn>,
    last_recording_fingerprint: Option<String>,
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationSession {
    /// Creates a session seeded with the assistant greeting.
    pub fn new() -> Self {
        Self {
            turns: vec![ConversationTurn::assistant(GREETING)],
            last_recording_fingerprint: None,
        }
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    /// Resets the log to the single seeded greeting and forgets the
    /// consumed-recording marker.
    pub fn clear(&mut self) {
        self.turns = vec![ConversationTurn::assistant(GREETING)];
        self.last_recording_fingerprint = None;
    }

    /// True when this fingerprint matches the last consumed recording, i.e.
    /// the blob was already processed and must be ignored.
    pub fn is_recording_consumed(&self, fingerprint: &str) -> bool {
        self.last_recording_fingerprint.as_deref() == Some(fingerprint)
    }

    /// Marks a recording as consumed. Called before any fallible work on
    /// the blob so a failed transcription cannot replay forever.
    pub fn consume_recording(&mut self, fingerprint: String) {
        self.last_recording_fingerprint = Some(fingerprint);
    }
}

/// Everything the dashboard keeps for one browser session: the conversation
/// and the last prediction outcome (replaced wholesale, cleared explicitly).
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub conversation: ConversationSession,
    pub prediction: Option<PredictionRecord>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            conversation: ConversationSession::new(),
            prediction: None,
        }
    }
}

/// Handle to one session's state. The mutex gives each interaction cycle
/// exclusive ownership of the state for its duration.
pub type SessionHandle = Arc<Mutex<SessionState>>;

/// TTL-bounded store of per-user sessions, keyed by session id.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<String, SessionHandle>,
}

impl SessionStore {
    /// Creates the store: sessions idle for 30 minutes are evicted, and the
    /// store holds at most 10k concurrent sessions.
    pub fn new() -> Self {
        Self {
            sessions: Cache::builder()
                .time_to_idle(Duration::from_secs(1800))
                .max_capacity(10_000)
                .build(),
        }
    }

    /// Creates a fresh session (seeded greeting) and returns its id.
    pub async fn create(&self) -> (String, SessionHandle) {
        let id = Uuid::new_v4().to_string();
        let handle: SessionHandle = Arc::new(Mutex::new(SessionState::new()));
        self.sessions.insert(id.clone(), handle.clone()).await;
        tracing::debug!("Session {} created", id);
        (id, handle)
    }

    pub async fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.get(id).await
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
