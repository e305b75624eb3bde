use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub groq_api_key: String,
    pub groq_base_url: String,
    pub transcription_model: String,
    pub transcription_language: String,
    pub completion_model: String,
    pub model_path: String,
    pub stylesheet_path: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            groq_api_key: std::env::var("GROQ_API_KEY")
                .map_err(|_| anyhow::anyhow!("GROQ_API_KEY environment variable required"))
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("GROQ_API_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            groq_base_url: std::env::var("GROQ_BASE_URL")
                .unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string())
                .trim_end_matches('/')
                .to_string(),
            transcription_model: std::env::var("TRANSCRIPTION_MODEL")
                .unwrap_or_else(|_| "whisper-large-v3".to_string()),
            transcription_language: std::env::var("TRANSCRIPTION_LANGUAGE")
                .unwrap_or_else(|_| "fr".to_string()),
            completion_model: std::env::var("COMPLETION_MODEL")
                .unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string()),
            model_path: std::env::var("MODEL_PATH").unwrap_or_else(|_| "model.json".to_string()),
            stylesheet_path: std::env::var("STYLESHEET_PATH")
                .unwrap_or_else(|_| "assets/style.css".to_string()),
        };

        if !config.groq_base_url.starts_with("http://")
            && !config.groq_base_url.starts_with("https://")
        {
            anyhow::bail!("GROQ_BASE_URL must start with http:// or https://");
        }

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Gateway base URL: {}", config.groq_base_url);
        tracing::debug!(
            "Transcription model: {} ({})",
            config.transcription_model,
            config.transcription_language
        );
        tracing::debug!("Completion model: {}", config.completion_model);
        tracing::debug!("Model artifact path: {}", config.model_path);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global, so tests touching them are
    // serialized through this lock.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ALL_VARS: &[&str] = &[
        "PORT",
        "GROQ_API_KEY",
        "GROQ_BASE_URL",
        "TRANSCRIPTION_MODEL",
        "TRANSCRIPTION_LANGUAGE",
        "COMPLETION_MODEL",
        "MODEL_PATH",
        "STYLESHEET_PATH",
    ];

    /// Runs `f` with exactly the given variables set, restoring the prior
    /// environment afterwards.
    fn with_env<F: FnOnce() -> anyhow::Result<Config>>(
        vars: &[(&str, &str)],
        f: F,
    ) -> anyhow::Result<Config> {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());

        let saved: Vec<(String, Option<String>)> = ALL_VARS
            .iter()
            .map(|name| (name.to_string(), std::env::var(name).ok()))
            .collect();

        for name in ALL_VARS {
            std::env::remove_var(name);
        }
        for (name, value) in vars {
            std::env::set_var(name, value);
        }

        let result = f();

        for (name, value) in saved {
            match value {
                Some(v) => std::env::set_var(&name, v),
                None => std::env::remove_var(&name),
            }
        }

        result
    }

    #[test]
    fn test_missing_credential_is_rejected() {
        let result = with_env(&[], Config::from_env);
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("GROQ_API_KEY"));
    }

    #[test]
    fn test_empty_credential_is_rejected() {
        let result = with_env(&[("GROQ_API_KEY", "   ")], Config::from_env);
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("GROQ_API_KEY cannot be empty"));
    }

    #[test]
    fn test_malformed_base_url_is_rejected() {
        let result = with_env(
            &[
                ("GROQ_API_KEY", "test_key"),
                ("GROQ_BASE_URL", "ftp://api.groq.com/openai/v1"),
            ],
            Config::from_env,
        );
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("GROQ_BASE_URL must start with http:// or https://"));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = with_env(
            &[("GROQ_API_KEY", "test_key"), ("PORT", "not-a-number")],
            Config::from_env,
        );
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("PORT must be a valid number"));
    }

    #[test]
    fn test_minimal_environment_loads_with_defaults() {
        let config = with_env(&[("GROQ_API_KEY", "test_key")], Config::from_env).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.groq_base_url, "https://api.groq.com/openai/v1");
        assert_eq!(config.transcription_model, "whisper-large-v3");
        assert_eq!(config.transcription_language, "fr");
        assert_eq!(config.completion_model, "llama-3.3-70b-versatile");
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = with_env(
            &[
                ("GROQ_API_KEY", "test_key"),
                ("GROQ_BASE_URL", "https://mock.local/v1/"),
            ],
            Config::from_env,
        )
        .unwrap();
        assert_eq!(config.groq_base_url, "https://mock.local/v1");
    }

    fn test_config() -> Config {
        Config {
            port: 3000,
            groq_api_key: "test_key".to_string(),
            groq_base_url: "https://api.groq.com/openai/v1".to_string(),
            transcription_model: "whisper-large-v3".to_string(),
            transcription_language: "fr".to_string(),
            completion_model: "llama-3.3-70b-versatile".to_string(),
            model_path: "model.json".to_string(),
            stylesheet_path: "assets/style.css".to_string(),
        }
    }

    #[test]
    fn test_config_clone_preserves_fields() {
        let config = test_config();
        let cloned = config.clone();
        assert_eq!(cloned.groq_base_url, config.groq_base_url);
        assert_eq!(cloned.completion_model, config.completion_model);
    }
}
