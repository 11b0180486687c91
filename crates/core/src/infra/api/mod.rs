pub mod http;

pub use http::HttpFirApi;

use async_trait::async_trait;

use crate::domain::error::AppError;
use crate::domain::types::Attachment;
use crate::domain::wire::{
    AnalyzeResponse, FirResponse, GenerateFirRequest, HealthResponse, TranscribeResponse,
};

/// multipart で証拠ファイルを送る際のフィールド名（ファイルごとに繰り返す）
pub const EVIDENCE_FIELD: &str = "evidence_files";
/// 書き起こしリクエストの音声フィールド名
pub const AUDIO_FIELD: &str = "audio";

/// FIRサービス呼び出しエラー
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("Service unreachable: {0}")]
    Unreachable(String),
    #[error("Request timed out")]
    Timeout,
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("no detail"))]
    Status { status: u16, message: Option<String> },
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// 接続不可（サービスに届いていない）かどうか
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Timeout)
    }

    /// サーバーが返したエラー文言
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status {
                message: Some(m), ..
            } => Some(m.as_str()).filter(|m| !m.trim().is_empty()),
            _ => None,
        }
    }
}

pub const UNREACHABLE_MESSAGE: &str =
    "Unable to reach the FIR service. Make sure the backend is running.";
pub const REJECTED_MESSAGE: &str = "Failed to generate FIR";

impl From<ApiError> for AppError {
    fn from(e: ApiError) -> Self {
        if e.is_connectivity() {
            log::warn!("FIR service unreachable: {e}");
            return AppError::unreachable(UNREACHABLE_MESSAGE);
        }
        if let Some(message) = e.server_message() {
            return AppError::rejected(message);
        }
        match e {
            ApiError::Status { status, .. } => {
                AppError::rejected(format!("{REJECTED_MESSAGE} (HTTP {status})"))
            }
            ApiError::InvalidRequest(detail) => AppError::internal(detail),
            _ => AppError::rejected(REJECTED_MESSAGE),
        }
    }
}

/// 生成リクエストのエンコーディング
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationPayload {
    Json(GenerateFirRequest),
    Multipart {
        fields: GenerateFirRequest,
        files: Vec<Attachment>,
    },
}

impl GenerationPayload {
    /// 証拠ファイルがあれば multipart、なければ JSON
    pub fn build(fields: GenerateFirRequest, evidence: Vec<Attachment>) -> Self {
        if evidence.is_empty() {
            Self::Json(fields)
        } else {
            Self::Multipart {
                fields,
                files: evidence,
            }
        }
    }

    pub fn fields(&self) -> &GenerateFirRequest {
        match self {
            Self::Json(fields) => fields,
            Self::Multipart { fields, .. } => fields,
        }
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart { .. })
    }

    pub fn evidence_count(&self) -> usize {
        match self {
            Self::Json(_) => 0,
            Self::Multipart { files, .. } => files.len(),
        }
    }
}

/// FIRサービス trait（HTTP実装とテスト用モックが実装する）
#[async_trait]
pub trait FirApi: Send + Sync {
    async fn health(&self) -> Result<HealthResponse, ApiError>;

    async fn analyze_realtime(&self, text: &str) -> Result<AnalyzeResponse, ApiError>;

    /// HTTP エラーは `Err`、success=false の本文は `Ok` のまま返す
    async fn generate_fir(&self, payload: GenerationPayload) -> Result<FirResponse, ApiError>;

    async fn transcribe_audio(&self, audio: Attachment) -> Result<TranscribeResponse, ApiError>;

    fn name(&self) -> &str;
}
