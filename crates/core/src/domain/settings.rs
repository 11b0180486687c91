use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::Language;

/// クライアント設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// FIRサービスのベースURL
    pub api_base_url: String,
    /// 初期表示言語
    pub language: Language,
    /// リアルタイム解析のデバウンス（ミリ秒）
    pub analysis_debounce_ms: u64,
    /// リアルタイム解析を行う最小文字数
    pub analysis_min_chars: usize,
    /// 生成・書き起こしリクエストのタイムアウト秒数
    pub request_timeout_secs: u64,
    /// ヘルスチェックのタイムアウト秒数
    pub health_timeout_secs: u64,
    /// コピー完了表示の保持時間（ミリ秒）
    pub copy_confirmation_ms: u64,
    /// PDF / 印刷用HTMLの出力先
    pub export_dir: Option<PathBuf>,
}

impl ClientSettings {
    pub fn analysis_debounce(&self) -> Duration {
        Duration::from_millis(self.analysis_debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }

    pub fn copy_confirmation(&self) -> Duration {
        Duration::from_millis(self.copy_confirmation_ms)
    }

    /// 末尾スラッシュを除いたエンドポイントURL
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            language: Language::En,
            analysis_debounce_ms: 500,
            analysis_min_chars: 20,
            request_timeout_secs: 120,
            health_timeout_secs: 5,
            copy_confirmation_ms: 2000,
            export_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_slashes() {
        let settings = ClientSettings {
            api_base_url: "http://127.0.0.1:5000/".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.endpoint("/health"), "http://127.0.0.1:5000/health");
        assert_eq!(settings.endpoint("generate_fir"), "http://127.0.0.1:5000/generate_fir");
    }

    #[test]
    fn test_defaults() {
        let settings = ClientSettings::default();
        assert_eq!(settings.analysis_debounce(), Duration::from_millis(500));
        assert_eq!(settings.analysis_min_chars, 20);
        assert_eq!(settings.copy_confirmation(), Duration::from_secs(2));
    }
}
