use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod analyzer;
pub mod backend;
pub mod config_file;
pub mod gemini;
pub mod mock;
pub mod orchestrator;
pub mod schema;
pub mod session;

// Re-export for convenience
pub use analyzer::{AnalysisError, DocumentInput, DocumentSource, PaperAnalysis, PaperAnalyzer};
pub use backend::{DisabledThumbnails, Thumbnail, ThumbnailError, ThumbnailRenderer};
pub use gemini::{DEFAULT_API_BASE, GEMINI_MODEL, GeminiAnalyzer};
pub use orchestrator::{BatchOutcome, FileError, FileFailure, analyze_document, run_batch};
pub use session::{BatchError, BatchStatus, Session};

/// Default linear scale for the first-page preview.
pub const DEFAULT_PREVIEW_SCALE: f32 = 2.0;
/// Default JPEG quality (1..=100) for the first-page preview.
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Output language of a rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "zh",
        }
    }

    /// Value for the `lang` attribute of an HTML document.
    pub fn html_lang(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "zh-CN",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "zh" | "cn" | "chinese" => Ok(Language::Zh),
            other => Err(format!("unknown language '{}' (expected en or zh)", other)),
        }
    }
}

/// Bibliographic facts about a paper. Language-invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperMetadata {
    pub model_name: String,
    pub publish_year: String,
    #[serde(default)]
    pub journal_venue: String,
    #[serde(default)]
    pub authors_team: String,
    #[serde(default)]
    pub parameter_count: String,
    pub paper_title: String,
    #[serde(default)]
    pub github_url: Option<String>,
}

/// Analytical summary of a paper in one language.
///
/// Bullet fields use the `•` glyph and `**text**` emphasis; renderers
/// normalize both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperContent {
    pub downstream_tasks: String,
    #[serde(default)]
    pub pretrain_data_source: String,
    #[serde(default)]
    pub tokenization_method: String,
    pub pretrain_strategy: String,
    #[serde(default)]
    pub finetuning_eval_protocol: String,
    #[serde(default)]
    pub model_architecture_desc: String,
    #[serde(default)]
    pub benchmarks_comparisons: String,
    pub ablation_failure_analysis: String,
    pub key_results: String,
}

/// One successfully analyzed input file. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedPaper {
    pub id: Uuid,
    pub file_name: String,
    pub meta: PaperMetadata,
    pub content_en: PaperContent,
    pub content_zh: PaperContent,
    /// True iff `meta.github_url` is present. This is a presence check,
    /// the link is never fetched.
    #[serde(rename = "is_alive")]
    pub has_repo_link: bool,
    /// `data:image/jpeg;base64,...` rendering of page 1, if one could be made.
    #[serde(default)]
    pub thumbnail: Option<String>,
    pub processed_at: DateTime<Utc>,
}

impl AnalyzedPaper {
    pub fn new(file_name: impl Into<String>, analysis: PaperAnalysis, thumbnail: Option<String>) -> Self {
        let has_repo_link = analysis
            .meta
            .github_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty());
        Self {
            id: Uuid::new_v4(),
            file_name: file_name.into(),
            meta: analysis.meta,
            content_en: analysis.content_en,
            content_zh: analysis.content_zh,
            has_repo_link,
            thumbnail,
            processed_at: Utc::now(),
        }
    }

    /// The content block for `language`.
    pub fn content(&self, language: Language) -> &PaperContent {
        match language {
            Language::En => &self.content_en,
            Language::Zh => &self.content_zh,
        }
    }

    /// The repository link, only when `has_repo_link` holds.
    pub fn repo_url(&self) -> Option<&str> {
        if self.has_repo_link {
            self.meta.github_url.as_deref().map(str::trim)
        } else {
            None
        }
    }
}

/// Events emitted while a batch runs.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Started {
        total: usize,
    },
    Analyzing {
        index: usize,
        total: usize,
        file_name: String,
    },
    PaperReady {
        index: usize,
        total: usize,
        paper: Box<AnalyzedPaper>,
    },
    FileFailed {
        index: usize,
        total: usize,
        file_name: String,
        error: String,
    },
    Complete {
        succeeded: usize,
        failed: usize,
    },
}

impl BatchEvent {
    /// Human-readable progress line, for events that carry one.
    pub fn progress_message(&self) -> Option<String> {
        match self {
            BatchEvent::Analyzing {
                index,
                total,
                file_name,
            } => Some(format!("Analyzing {}/{}: {}...", index + 1, total, file_name)),
            BatchEvent::FileFailed {
                file_name, error, ..
            } => Some(format!("Failed to analyze {}: {}", file_name, error)),
            BatchEvent::Complete { .. } => Some("Batch Processing Complete.".to_string()),
            BatchEvent::Started { .. } | BatchEvent::PaperReady { .. } => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no Gemini API key configured (set API_KEY or GEMINI_API_KEY, or pass --api-key)")]
    MissingApiKey,
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// A Gemini API credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` for blank input.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into().trim().to_string();
        if key.is_empty() { None } else { Some(Self(key)) }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Runtime configuration, resolved from flags, environment and config files.
#[derive(Clone)]
pub struct Config {
    pub api_key: Option<ApiKey>,
    pub api_base: String,
    /// Per-request timeout for the analysis call. Unset means no timeout.
    pub request_timeout: Option<Duration>,
    pub preview_enabled: bool,
    pub preview_scale: f32,
    pub jpeg_quality: u8,
    pub language: Language,
    pub output_dir: Option<PathBuf>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("api_base", &self.api_base)
            .field("request_timeout", &self.request_timeout)
            .field("preview_enabled", &self.preview_enabled)
            .field("preview_scale", &self.preview_scale)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("language", &self.language)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: None,
            preview_enabled: true,
            preview_scale: DEFAULT_PREVIEW_SCALE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            language: Language::default(),
            output_dir: None,
        }
    }
}

impl Config {
    /// Resolve configuration from the process environment and the config file
    /// cascade. `cli_api_key` wins over everything else.
    pub fn load(cli_api_key: Option<String>) -> Self {
        let file = config_file::load_config();
        Self::from_sources(&file, |name| std::env::var(name).ok(), cli_api_key)
    }

    /// Resolve configuration from explicit sources.
    ///
    /// The credential is taken from, in order: `cli_api_key`, `API_KEY`,
    /// `GEMINI_API_KEY`, then `[api] gemini_api_key`. Blank values are skipped.
    pub fn from_sources(
        file: &config_file::ConfigFile,
        env: impl Fn(&str) -> Option<String>,
        cli_api_key: Option<String>,
    ) -> Self {
        let defaults = Config::default();
        let api = file.api.clone().unwrap_or_default();
        let preview = file.preview.clone().unwrap_or_default();
        let report = file.report.clone().unwrap_or_default();

        let api_key = [
            cli_api_key,
            env("API_KEY"),
            env("GEMINI_API_KEY"),
            api.gemini_api_key,
        ]
        .into_iter()
        .flatten()
        .find_map(ApiKey::new);

        let language = match report.language.as_deref().map(str::parse::<Language>) {
            Some(Ok(lang)) => lang,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "ignoring configured report language");
                defaults.language
            }
            None => defaults.language,
        };

        Self {
            api_key,
            api_base: api.api_base.unwrap_or(defaults.api_base),
            request_timeout: api
                .request_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            preview_enabled: preview.enabled.unwrap_or(defaults.preview_enabled),
            preview_scale: preview
                .scale
                .unwrap_or(defaults.preview_scale)
                .max(DEFAULT_PREVIEW_SCALE),
            jpeg_quality: preview.jpeg_quality.unwrap_or(defaults.jpeg_quality).clamp(1, 100),
            language,
            output_dir: report.output_dir.map(PathBuf::from),
        }
    }

    /// The credential, or the configuration error that stops a batch.
    pub fn require_api_key(&self) -> Result<&ApiKey, ConfigError> {
        self.api_key.as_ref().ok_or(ConfigError::MissingApiKey)
    }
}
