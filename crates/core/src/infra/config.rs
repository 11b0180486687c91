//! 設定ファイル（TOML）と環境変数からの ClientSettings 読み込み。

use std::path::{Path, PathBuf};

use crate::domain::error::AppError;
use crate::domain::settings::ClientSettings;
use crate::domain::types::Language;

pub const CONFIG_DIR_NAME: &str = "fir-desk";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const ENV_API_URL: &str = "FIR_API_URL";
pub const ENV_LANGUAGE: &str = "FIR_LANGUAGE";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::config(e.to_string())
    }
}

/// `<config dir>/fir-desk/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

pub fn parse_settings(text: &str) -> Result<ClientSettings, ConfigError> {
    Ok(toml::from_str(text)?)
}

/// 設定を読み込む。
/// 明示パスは存在必須、既定パスが無い場合は既定値を使う。
/// 最後に環境変数で上書きする。
pub fn load_settings(path: Option<&Path>) -> Result<ClientSettings, ConfigError> {
    let settings = match path {
        Some(path) => read_file(path)?,
        None => match default_config_path() {
            Some(path) if path.exists() => read_file(&path)?,
            _ => {
                log::debug!("No config file found, using defaults");
                ClientSettings::default()
            }
        },
    };
    apply_env_overrides(settings, |key| std::env::var(key).ok())
}

fn read_file(path: &Path) -> Result<ClientSettings, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Loaded settings from {}", path.display());
    parse_settings(&text)
}

pub fn apply_env_overrides(
    mut settings: ClientSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ClientSettings, ConfigError> {
    if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
        settings.api_base_url = url.trim().to_string();
    }
    if let Some(value) = lookup(ENV_LANGUAGE).filter(|v| !v.trim().is_empty()) {
        settings.language = value
            .parse::<Language>()
            .map_err(|message| ConfigError::InvalidValue {
                key: ENV_LANGUAGE,
                message,
            })?;
    }
    validate(&settings)?;
    Ok(settings)
}

fn validate(settings: &ClientSettings) -> Result<(), ConfigError> {
    let url = settings.api_base_url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::InvalidValue {
            key: "api_base_url",
            message: format!("expected an http(s) URL, got {url:?}"),
        });
    }
    if settings.analysis_min_chars == 0 {
        return Err(ConfigError::InvalidValue {
            key: "analysis_min_chars",
            message: "must be at least 1".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings = parse_settings(
            r#"
            api_base_url = "http://10.0.0.5:5000"
            language = "te"
            "#,
        )
        .unwrap();
        assert_eq!(settings.api_base_url, "http://10.0.0.5:5000");
        assert_eq!(settings.language, Language::Te);
        assert_eq!(settings.analysis_debounce_ms, 500);
        assert_eq!(settings.export_dir, None);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(matches!(
            parse_settings("analysis_min_chars = \"many\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let settings = apply_env_overrides(
            ClientSettings::default(),
            env(&[(ENV_API_URL, " https://fir.example.org "), (ENV_LANGUAGE, "telugu")]),
        )
        .unwrap();
        assert_eq!(settings.api_base_url, "https://fir.example.org");
        assert_eq!(settings.language, Language::Te);
    }

    #[test]
    fn test_invalid_env_language() {
        let err = apply_env_overrides(ClientSettings::default(), env(&[(ENV_LANGUAGE, "fr")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: ENV_LANGUAGE, .. }));
        let app: AppError = err.into();
        assert!(!app.recoverable);
    }

    #[test]
    fn test_non_http_url_is_rejected() {
        let err = apply_env_overrides(ClientSettings::default(), env(&[(ENV_API_URL, "localhost:5000")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "api_base_url", .. }));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            load_settings(Some(&missing)),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "analysis_debounce_ms = 250\n").unwrap();
        let settings = read_file(&path).unwrap();
        assert_eq!(settings.analysis_debounce_ms, 250);
    }
}
