use serde::Serialize;

use super::error::AppError;
use super::types::{AnalysisPreview, ApiStatus, Language};

/// イベント名定数
pub const API_STATUS_CHANGED: &str = "api_status_changed";
pub const PREVIEW_UPDATED: &str = "preview_updated";
pub const PREVIEW_CLEARED: &str = "preview_cleared";
pub const GENERATION_STARTED: &str = "generation_started";
pub const RESULT_READY: &str = "result_ready";
pub const GENERATION_FAILED: &str = "generation_failed";
pub const DESCRIPTION_CHANGED: &str = "description_changed";
pub const TRANSCRIPTION_STARTED: &str = "transcription_started";
pub const TRANSCRIPTION_FAILED: &str = "transcription_failed";
pub const COPY_CONFIRMED: &str = "copy_confirmed";
pub const COPY_CONFIRMATION_EXPIRED: &str = "copy_confirmation_expired";
pub const ALERT: &str = "alert";

/// 生成リクエストの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    Submission,
    Regeneration,
}

/// フロントエンドへ通知するセッションイベント
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    ApiStatusChanged {
        status: ApiStatus,
    },
    PreviewUpdated {
        preview: AnalysisPreview,
    },
    PreviewCleared,
    GenerationStarted {
        kind: GenerationKind,
        language: Language,
        multipart: bool,
    },
    /// 新しい結果へのスクロール / フォーカス合図
    ResultReady {
        kind: GenerationKind,
        fir_id: String,
    },
    GenerationFailed {
        kind: GenerationKind,
        error: AppError,
    },
    DescriptionChanged {
        length: usize,
    },
    TranscriptionStarted,
    TranscriptionFailed {
        error: AppError,
    },
    CopyConfirmed,
    CopyConfirmationExpired,
    /// ブロッキングアラート（マイク権限など）
    Alert {
        error: AppError,
    },
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ApiStatusChanged { .. } => API_STATUS_CHANGED,
            Self::PreviewUpdated { .. } => PREVIEW_UPDATED,
            Self::PreviewCleared => PREVIEW_CLEARED,
            Self::GenerationStarted { .. } => GENERATION_STARTED,
            Self::ResultReady { .. } => RESULT_READY,
            Self::GenerationFailed { .. } => GENERATION_FAILED,
            Self::DescriptionChanged { .. } => DESCRIPTION_CHANGED,
            Self::TranscriptionStarted => TRANSCRIPTION_STARTED,
            Self::TranscriptionFailed { .. } => TRANSCRIPTION_FAILED,
            Self::CopyConfirmed => COPY_CONFIRMED,
            Self::CopyConfirmationExpired => COPY_CONFIRMATION_EXPIRED,
            Self::Alert { .. } => ALERT,
        }
    }
}
