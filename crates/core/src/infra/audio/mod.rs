#[cfg(feature = "microphone")]
pub mod capture;

#[cfg(feature = "microphone")]
pub use capture::MicrophoneRecorder;

use std::sync::Arc;

use crate::domain::error::AppError;
use crate::domain::types::Attachment;

pub const MIC_PERMISSION_MESSAGE: &str = "Unable to access microphone. Please check permissions.";

/// 録音エラー
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordingError {
    #[error("Microphone permission denied: {0}")]
    PermissionDenied(String),
    #[error("No audio input device found")]
    NoDevice,
    #[error("Audio device error: {0}")]
    Device(String),
    #[error("A recording is already in progress")]
    AlreadyRecording,
    #[error("No recording in progress")]
    NotRecording,
    #[error("Audio encoding error: {0}")]
    Encoding(String),
}

impl From<RecordingError> for AppError {
    fn from(e: RecordingError) -> Self {
        match e {
            RecordingError::PermissionDenied(detail) => {
                log::warn!("microphone permission denied: {detail}");
                AppError::permission(MIC_PERMISSION_MESSAGE)
            }
            RecordingError::AlreadyRecording | RecordingError::NotRecording => {
                AppError::invalid_state(e.to_string())
            }
            other => AppError::device(other.to_string()),
        }
    }
}

/// 録音デバイス trait（単一キャプチャセッション）
pub trait AudioRecorder: Send + Sync {
    fn start(&self) -> Result<(), RecordingError>;

    /// 録音を止め、送信可能な音声クリップを返す
    fn stop(&self) -> Result<Attachment, RecordingError>;

    fn is_active(&self) -> bool;

    fn name(&self) -> &str;
}

/// マイクが使えないビルド / 環境向けの実装
pub struct DisabledRecorder;

impl AudioRecorder for DisabledRecorder {
    fn start(&self) -> Result<(), RecordingError> {
        Err(RecordingError::NoDevice)
    }

    fn stop(&self) -> Result<Attachment, RecordingError> {
        Err(RecordingError::NotRecording)
    }

    fn is_active(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

/// 既定のレコーダーを構築する（microphone feature 有効時は cpal）
pub fn default_recorder() -> Arc<dyn AudioRecorder> {
    #[cfg(feature = "microphone")]
    let recorder: Arc<dyn AudioRecorder> = Arc::new(MicrophoneRecorder::new());
    #[cfg(not(feature = "microphone"))]
    let recorder: Arc<dyn AudioRecorder> = Arc::new(DisabledRecorder);

    log::info!("Using {} audio recorder", recorder.name());
    recorder
}
