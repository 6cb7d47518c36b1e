use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub api: Option<ApiConfig>,
    pub preview: Option<PreviewConfig>,
    pub report: Option<ReportConfig>,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    pub gemini_api_key: Option<String>,
    pub api_base: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "***"),
            )
            .field("api_base", &self.api_base)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreviewConfig {
    pub enabled: Option<bool>,
    pub scale: Option<f32>,
    pub jpeg_quality: Option<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// `en` or `zh`.
    pub language: Option<String>,
    pub output_dir: Option<String>,
}

/// Platform config directory path: `<config_dir>/paperflow/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("paperflow").join("config.toml"))
}

/// Load config by cascading CWD `.paperflow.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".paperflow.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (base_api, overlay_api) = (base.api.unwrap_or_default(), overlay.api.unwrap_or_default());
    let (base_preview, overlay_preview) = (
        base.preview.unwrap_or_default(),
        overlay.preview.unwrap_or_default(),
    );
    let (base_report, overlay_report) = (
        base.report.unwrap_or_default(),
        overlay.report.unwrap_or_default(),
    );

    ConfigFile {
        api: Some(ApiConfig {
            gemini_api_key: overlay_api.gemini_api_key.or(base_api.gemini_api_key),
            api_base: overlay_api.api_base.or(base_api.api_base),
            request_timeout_secs: overlay_api
                .request_timeout_secs
                .or(base_api.request_timeout_secs),
        }),
        preview: Some(PreviewConfig {
            enabled: overlay_preview.enabled.or(base_preview.enabled),
            scale: overlay_preview.scale.or(base_preview.scale),
            jpeg_quality: overlay_preview.jpeg_quality.or(base_preview.jpeg_quality),
        }),
        report: Some(ReportConfig {
            language: overlay_report.language.or(base_report.language),
            output_dir: overlay_report.output_dir.or(base_report.output_dir),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_sections_deserialize() {
        let toml_str = "[preview]\nenabled = false\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(parsed.preview.unwrap().enabled, Some(false));
        assert!(parsed.api.is_none());
        assert!(parsed.report.is_none());
    }

    #[test]
    fn api_section_round_trip_toml() {
        let config = ConfigFile {
            api: Some(ApiConfig {
                api_base: Some("http://localhost:9000/v1beta".to_string()),
                request_timeout_secs: Some(120),
                ..Default::default()
            }),
            ..Default::default()
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: ConfigFile = toml::from_str(&toml_str).unwrap();
        let api = parsed.api.unwrap();
        assert_eq!(api.api_base.as_deref(), Some("http://localhost:9000/v1beta"));
        assert_eq!(api.request_timeout_secs, Some(120));
    }

    #[test]
    fn merge_overlay_wins_per_field() {
        let base = ConfigFile {
            api: Some(ApiConfig {
                gemini_api_key: Some("base-key".to_string()),
                api_base: Some("http://base".to_string()),
                ..Default::default()
            }),
            report: Some(ReportConfig {
                language: Some("en".to_string()),
                output_dir: Some("/base/out".to_string()),
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            api: Some(ApiConfig {
                api_base: Some("http://overlay".to_string()),
                ..Default::default()
            }),
            report: Some(ReportConfig {
                language: Some("zh".to_string()),
                output_dir: None,
            }),
            ..Default::default()
        };
        let merged = merge(base, overlay);
        let api = merged.api.unwrap();
        assert_eq!(api.gemini_api_key.as_deref(), Some("base-key"));
        assert_eq!(api.api_base.as_deref(), Some("http://overlay"));
        let report = merged.report.unwrap();
        assert_eq!(report.language.as_deref(), Some("zh"));
        assert_eq!(report.output_dir.as_deref(), Some("/base/out"));
    }

    #[test]
    fn api_config_debug_redacts_key() {
        let api = ApiConfig {
            gemini_api_key: Some("AIza-secret".to_string()),
            ..Default::default()
        };
        let rendered = format!("{:?}", api);
        assert!(!rendered.contains("AIza-secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = std::env::temp_dir().join(format!("paperflow_cfg_{}", std::process::id()));
        assert!(load_from_path(&dir.join("nope.toml")).is_none());
    }
}
