use crate::config::Config;
use crate::errors::AppError;
use reqwest::multipart;
use serde_json::json;
use std::time::Duration;

/// Client for the hosted transcription and chat-completion API
/// (OpenAI-compatible, e.g. Groq).
///
/// One client serves both gateways; the credential comes from configuration
/// and is never logged. Calls are never retried: a failure surfaces
/// immediately as a `GatewayError`.
#[derive(Clone)]
pub struct GroqClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    transcription_model: String,
    transcription_language: String,
    completion_model: String,
}

impl GroqClient {
    /// Creates a new `GroqClient` from the application configuration.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::GatewayError(format!("Failed to create gateway client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.groq_base_url.clone(),
            api_key: config.groq_api_key.clone(),
            transcription_model: config.transcription_model.clone(),
            transcription_language: config.transcription_language.clone(),
            completion_model: config.completion_model.clone(),
        })
    }

    /// Transcribes an audio payload to text.
    ///
    /// # Arguments
    ///
    /// * `audio_bytes` - The complete audio file content.
    /// * `filename_hint` - Original filename, passed to the API for format detection.
    ///
    /// # Returns
    ///
    /// * `Result<String, AppError>` - The transcript text.
    pub async fn transcribe(
        &self,
        audio_bytes: Vec<u8>,
        filename_hint: &str,
    ) -> Result<String, AppError> {
        let url = format!("{}/audio/transcriptions", self.base_url);
        tracing::info!(
            "Transcribing {} bytes ({}) via {}",
            audio_bytes.len(),
            filename_hint,
            self.transcription_model
        );

        let file_part = multipart::Part::bytes(audio_bytes)
            .file_name(filename_hint.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| {
                AppError::GatewayError(format!("Failed to build audio upload part: {}", e))
            })?;

        let form = multipart::Form::new()
            .text("model", self.transcription_model.clone())
            .text("response_format", "json")
            .text("language", self.transcription_language.clone())
            .text("temperature", "0")
            .part("file", file_part);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::GatewayError(format!("Transcription request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::GatewayError(format!(
                "Transcription API returned {}: {}",
                status, error_text
            )));
        }

        let data: serde_json::Value = response.json().await.map_err(|e| {
            AppError::GatewayError(format!("Failed to parse transcription response: {}", e))
        })?;

        let text = data
            .get("text")
            .and_then(|t| t.as_str())
            .map(|t| t.trim().to_string())
            .ok_or_else(|| {
                tracing::warn!("Unexpected transcription response format: {:?}", data);
                AppError::GatewayError(
                    "Transcription response missing 'text' field".to_string(),
                )
            })?;

        tracing::info!("Transcription succeeded ({} chars)", text.len());
        Ok(text)
    }

    /// Requests a chat completion for a single user message.
    ///
    /// Each call is stateless with respect to history: only the current
    /// message is sent as context.
    ///
    /// # Arguments
    ///
    /// * `content` - The user message text.
    ///
    /// # Returns
    ///
    /// * `Result<String, AppError>` - The assistant reply text.
    pub async fn complete(&self, content: &str) -> Result<String, AppError> {
        let url = format!("{}/chat/completions", self.base_url);
        tracing::info!("Requesting completion via {}", self.completion_model);

        let body = json!({
            "model": self.completion_model,
            "messages": [{"role": "user", "content": content}],
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::GatewayError(format!("Completion request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::GatewayError(format!(
                "Completion API returned {}: {}",
                status, error_text
            )));
        }

        let data: serde_json::Value = response.json().await.map_err(|e| {
            AppError::GatewayError(format!("Failed to parse completion response: {}", e))
        })?;

        let reply = data
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|t| t.as_str())
            .map(|t| t.to_string())
            .ok_or_else(|| {
                tracing::warn!("Unexpected completion response format: {:?}", data);
                AppError::GatewayError(
                    "Completion response missing choices[0].message.content".to_string(),
                )
            })?;

        tracing::info!("Completion succeeded ({} chars)", reply.len());
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(base_url: &str) -> Config {
        Config {
            port: 3000,
            groq_api_key: "test_key".to_string(),
            groq_base_url: base_url.to_string(),
            transcription_model: "whisper-large-v3".to_string(),
            transcription_language: "fr".to_string(),
            completion_model: "llama-3.3-70b-versatile".to_string(),
            model_path: "model.json".to_string(),
            stylesheet_path: "assets/style.css".to_string(),
        }
    }

    #[tokio::test]
    async fn test_client_creation() {
        let client = GroqClient::new(&test_config("https://api.groq.com/openai/v1"));
        assert!(client.is_ok());
    }
}
