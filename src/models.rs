use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ============ Prediction Models ============

/// Customer geography. The wire format accepts both the English variant
/// names and the French display labels used by the dashboard form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Geography {
    France,
    #[serde(alias = "Allemagne")]
    Germany,
    #[serde(alias = "Espagne")]
    Spain,
}

/// Customer gender, with French form labels accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(alias = "Homme")]
    Male,
    #[serde(alias = "Femme")]
    Female,
}

/// Raw customer attributes as submitted from the prediction form.
///
/// Created per submission and owned by the request handler. All fields must
/// be present and within their declared ranges before encoding; the encoder
/// fails closed otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerProfile {
    /// Credit score, 350-850.
    pub credit_score: i64,
    pub geography: Geography,
    pub gender: Gender,
    /// Age in years, 18-92.
    pub age: i64,
    /// Tenure in years, 0-10.
    pub tenure: i64,
    /// Account balance, non-negative.
    pub balance: f64,
    /// Number of bank products held, 1-4.
    pub num_products: i64,
    #[serde(deserialize_with = "deserialize_yes_no")]
    pub has_credit_card: bool,
    #[serde(deserialize_with = "deserialize_yes_no")]
    pub is_active_member: bool,
    /// Estimated yearly salary, non-negative.
    pub estimated_salary: f64,
}

/// Accepts a plain boolean or the form's "Oui"/"Non" ("Yes"/"No") labels.
fn deserialize_yes_no<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrLabel {
        Bool(bool),
        Label(String),
    }

    match BoolOrLabel::deserialize(deserializer)? {
        BoolOrLabel::Bool(b) => Ok(b),
        BoolOrLabel::Label(s) => match s.as_str() {
            "Oui" | "Yes" => Ok(true),
            "Non" | "No" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected Oui/Non or Yes/No, got '{}'",
                other
            ))),
        },
    }
}

/// The fixed-order numeric encoding consumed by the churn model.
///
/// Field order matches the order the model was trained on: CreditScore,
/// Geography, Gender, Age, Tenure, Balance, NumOfProducts, HasCrCard,
/// IsActiveMember, EstimatedSalary. Reordering silently corrupts
/// predictions, so the only way out of this struct is `as_array`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub credit_score: f64,
    pub geography: f64,
    pub gender: f64,
    pub age: f64,
    pub tenure: f64,
    pub balance: f64,
    pub num_products: f64,
    pub has_credit_card: f64,
    pub is_active_member: f64,
    pub estimated_salary: f64,
}

impl FeatureVector {
    /// Returns the features in the trained column order.
    pub fn as_array(&self) -> [f64; 10] {
        [
            self.credit_score,
            self.geography,
            self.gender,
            self.age,
            self.tenure,
            self.balance,
            self.num_products,
            self.has_credit_card,
            self.is_active_member,
            self.estimated_salary,
        ]
    }
}

/// Outcome of one prediction attempt.
///
/// Exactly two cases: a successful prediction or a user-facing error
/// message. Never mutated in place; the stored value is replaced wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictionResult {
    Ok {
        /// 1 = churn risk, 0 = no churn risk.
        label: u8,
        /// Model confidence in the predicted label, in [0, 1].
        probability: f64,
    },
    Error {
        message: String,
    },
}

/// A prediction outcome with its advisory message, as held in session state
/// until the "new prediction" action clears it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub result: PredictionResult,
    /// Retention advice shown alongside the outcome.
    pub message: String,
    pub created_at: DateTime<Utc>,
}

// ============ Conversation Models ============

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message in the conversation log. Appended only, never edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: ChatRole,
    pub content: String,
    /// Base64 audio payload, present only on turns born from a browser
    /// recording so the UI can replay them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            audio: None,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            audio: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_audio(mut self, audio_base64: String) -> Self {
        self.audio = Some(audio_base64);
        self
    }
}

// ============ Request / Response DTOs ============

/// Audio file attached to an explicit "send" action.
#[derive(Debug, Clone, Deserialize)]
pub struct AudioUpload {
    /// Base64-encoded file content.
    pub data: String,
    /// Original filename, used as a hint for the transcription API.
    pub filename: String,
}

/// Body of POST /api/v1/sessions/:id/chat/message.
///
/// An explicit send action: an uploaded audio file takes priority over
/// typed text when both are present.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessageRequest {
    pub text: Option<String>,
    pub upload: Option<AudioUpload>,
}

/// Body of POST /api/v1/sessions/:id/chat/recording, a completed browser
/// recording delivered as one base64 blob.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordingRequest {
    /// Base64-encoded WAV content captured by the browser.
    pub audio: String,
}

/// Response for chat endpoints: the transcript (when audio was involved)
/// and the turns appended during this cycle.
#[derive(Debug, Serialize)]
pub struct ChatCycleResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    pub turns: Vec<ConversationTurn>,
}

/// Full session view: conversation log plus the stored prediction, if any.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub turns: Vec<ConversationTurn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<PredictionRecord>,
}
