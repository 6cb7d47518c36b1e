use std::future::Future;
use std::pin::Pin;

use crate::analyzer::{AnalysisError, DocumentInput, PaperAnalysis, PaperAnalyzer};
use crate::{ApiKey, Config, ConfigError, schema};

/// The only model the analysis is tuned for.
pub const GEMINI_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Longest slice of an error body kept in [`AnalysisError::Status`].
const MAX_ERROR_BODY: usize = 500;

/// Gemini `generateContent` backend with structured JSON output.
pub struct GeminiAnalyzer {
    api_key: ApiKey,
    api_base: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiAnalyzer")
            .field("api_key", &"***")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GeminiAnalyzer {
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            api_base: DEFAULT_API_BASE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Build from runtime config. Fails before any network activity when no
    /// credential is configured.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let api_key = config.require_api_key()?.clone();
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self {
            api_key,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, GEMINI_MODEL)
    }
}

impl PaperAnalyzer for GeminiAnalyzer {
    fn name(&self) -> &str {
        "Gemini"
    }

    fn analyze<'a>(
        &'a self,
        document: &'a DocumentInput,
    ) -> Pin<Box<dyn Future<Output = Result<PaperAnalysis, AnalysisError>> + Send + 'a>> {
        Box::pin(async move {
            let body = schema::build_request(document);
            tracing::debug!(
                file = %document.file_name,
                bytes = document.data.len(),
                model = GEMINI_MODEL,
                "sending generateContent request"
            );

            let resp = self
                .client
                .post(self.endpoint())
                .header("x-goog-api-key", self.api_key.expose())
                .json(&body)
                .send()
                .await?;

            let status = resp.status();
            if status.as_u16() == 429 {
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .map(std::time::Duration::from_secs);
                return Err(AnalysisError::RateLimited { retry_after });
            }
            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                return Err(AnalysisError::Status {
                    status: status.as_u16(),
                    message: error_message(&text),
                });
            }

            let data: serde_json::Value = resp.json().await?;
            let text = match schema::response_text(&data) {
                Some(text) => text,
                None => {
                    if let Some(reason) = data["promptFeedback"]["blockReason"].as_str() {
                        tracing::warn!(file = %document.file_name, reason, "prompt blocked");
                    }
                    return Err(AnalysisError::EmptyResponse);
                }
            };
            schema::parse_analysis(&text)
        })
    }
}

/// Pull `error.message` out of a Gemini error body, falling back to the raw
/// text (truncated).
fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|v| v["error"]["message"].as_str())
        .unwrap_or(body)
        .trim();
    message.chars().take(MAX_ERROR_BODY).collect()
}
