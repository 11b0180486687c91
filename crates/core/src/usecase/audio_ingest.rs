use std::sync::Arc;

use crate::domain::error::{AppError, ErrorCode};
use crate::domain::events::SessionEvent;
use crate::domain::types::Attachment;
use crate::infra::api::ApiError;
use crate::infra::audio::AudioRecorder;

use super::analyzer::DebouncedAnalyzer;
use super::gate::GenerationGate;
use super::SessionContext;

pub const TRANSCRIBE_FAILED_PREFIX: &str = "Failed to transcribe audio: ";
pub const TRANSCRIBE_ERROR_MESSAGE: &str = "Error transcribing audio. Please try again.";
pub const TRANSCRIBE_BUSY_MESSAGE: &str = "A transcription is already in progress";

/// 録音 / アップロード音声を書き起こし、説明文へ結合する
pub struct AudioIngestor {
    ctx: SessionContext,
    recorder: Arc<dyn AudioRecorder>,
    analyzer: Arc<DebouncedAnalyzer>,
    transcribing: GenerationGate,
}

impl AudioIngestor {
    pub fn new(
        ctx: SessionContext,
        recorder: Arc<dyn AudioRecorder>,
        analyzer: Arc<DebouncedAnalyzer>,
    ) -> Self {
        Self {
            ctx,
            recorder,
            analyzer,
            transcribing: GenerationGate::new(),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_active()
    }

    pub fn is_transcribing(&self) -> bool {
        self.transcribing.is_busy()
    }

    /// 録音を開始する。権限エラーはブロッキングアラートとして通知する。
    pub fn start_capture(&self) -> Result<(), AppError> {
        if self.recorder.is_active() {
            return Err(AppError::invalid_state("A recording is already in progress"));
        }
        if self.transcribing.is_busy() {
            return Err(AppError::busy(TRANSCRIBE_BUSY_MESSAGE));
        }

        self.recorder.start().map_err(|e| {
            let error = AppError::from(e);
            if error.code == ErrorCode::Permission {
                self.ctx.emit(SessionEvent::Alert {
                    error: error.clone(),
                });
            }
            error
        })?;
        log::info!("Recording started ({})", self.recorder.name());
        Ok(())
    }

    /// 録音を止めて書き起こす。成功時は結合後の説明文を返す。
    pub async fn stop_capture(&self) -> Result<String, AppError> {
        let clip = self.recorder.stop()?;
        self.transcribe(clip).await
    }

    /// アップロードされた音声ファイルを書き起こす
    pub async fn upload(&self, clip: Attachment) -> Result<String, AppError> {
        self.transcribe(clip).await
    }

    async fn transcribe(&self, clip: Attachment) -> Result<String, AppError> {
        let _permit = self
            .transcribing
            .try_acquire()
            .ok_or_else(|| AppError::busy(TRANSCRIBE_BUSY_MESSAGE))?;

        self.ctx.emit(SessionEvent::TranscriptionStarted);
        let response = self.ctx.api.transcribe_audio(clip).await;

        let transcript = match response {
            Ok(response) => match response.transcript() {
                Some(text) => Ok(text.to_string()),
                None => Err(failed(response.error.as_deref())),
            },
            Err(ApiError::Status { message, .. }) => Err(failed(message.as_deref())),
            Err(e) => {
                log::error!("Transcription request failed: {e}");
                Err(if e.is_connectivity() {
                    AppError::unreachable(TRANSCRIBE_ERROR_MESSAGE)
                } else {
                    AppError::rejected(TRANSCRIBE_ERROR_MESSAGE)
                })
            }
        };

        let transcript = match transcript {
            Ok(text) => text,
            Err(error) => {
                self.ctx.emit(SessionEvent::TranscriptionFailed {
                    error: error.clone(),
                });
                return Err(error);
            }
        };

        let combined = self
            .ctx
            .with_session(|s| s.form.append_transcript(&transcript).to_string());
        log::info!(
            "Transcript merged: +{} chars, description now {} chars",
            transcript.chars().count(),
            combined.chars().count()
        );
        self.ctx.emit(SessionEvent::DescriptionChanged {
            length: combined.chars().count(),
        });
        self.analyzer.analyze(&combined);
        Ok(combined)
    }
}

fn failed(server_error: Option<&str>) -> AppError {
    let detail = server_error
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .unwrap_or("Unknown error");
    AppError::rejected(format!("{TRANSCRIBE_FAILED_PREFIX}{detail}"))
}
