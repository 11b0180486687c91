//! ユースケーステスト用のモック。

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::error::AppError;
use crate::domain::session::Session;
use crate::domain::types::{Attachment, Language};
use crate::domain::wire::{AnalyzeResponse, FirResponse, HealthResponse, TranscribeResponse};
use crate::infra::api::{ApiError, FirApi, GenerationPayload};
use crate::infra::audio::{AudioRecorder, RecordingError};
use crate::infra::export::{ExportError, PrintDocument, PrintTarget};
use crate::infra::output::OutputTarget;

use super::SessionContext;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Health,
    Analyze(String),
    Generate(GenerationPayload),
    Transcribe(Attachment),
}

pub(crate) struct MockFirApi {
    pub health: Mutex<Result<HealthResponse, ApiError>>,
    pub analyze: Mutex<Result<AnalyzeResponse, ApiError>>,
    pub generate: Mutex<VecDeque<Result<FirResponse, ApiError>>>,
    pub transcribe: Mutex<Result<TranscribeResponse, ApiError>>,
    /// 各呼び出しの応答遅延（tokio の仮想時間）
    pub delay: Mutex<Duration>,
    pub calls: Mutex<Vec<Call>>,
}

impl MockFirApi {
    pub fn new() -> Self {
        Self {
            health: Mutex::new(Ok(HealthResponse {
                status: "healthy".into(),
            })),
            analyze: Mutex::new(Ok(analyze_ok("Theft", 0.8))),
            generate: Mutex::new(VecDeque::new()),
            transcribe: Mutex::new(Ok(TranscribeResponse {
                success: true,
                text: Some("transcribed words".into()),
                error: None,
            })),
            delay: Mutex::new(Duration::ZERO),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn push_generate(&self, response: Result<FirResponse, ApiError>) {
        self.generate.lock().push_back(response);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn analyze_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Analyze(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn generate_calls(&self) -> Vec<GenerationPayload> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Generate(payload) => Some(payload),
                _ => None,
            })
            .collect()
    }

    async fn pause(&self) {
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl FirApi for MockFirApi {
    async fn health(&self) -> Result<HealthResponse, ApiError> {
        self.calls.lock().push(Call::Health);
        self.pause().await;
        self.health.lock().clone()
    }

    async fn analyze_realtime(&self, text: &str) -> Result<AnalyzeResponse, ApiError> {
        self.calls.lock().push(Call::Analyze(text.to_string()));
        self.pause().await;
        self.analyze.lock().clone()
    }

    async fn generate_fir(&self, payload: GenerationPayload) -> Result<FirResponse, ApiError> {
        self.calls.lock().push(Call::Generate(payload));
        self.pause().await;
        self.generate
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(fir_ok("FIR001", "FIRST INFORMATION REPORT")))
    }

    async fn transcribe_audio(&self, audio: Attachment) -> Result<TranscribeResponse, ApiError> {
        self.calls.lock().push(Call::Transcribe(audio));
        self.pause().await;
        self.transcribe.lock().clone()
    }

    fn name(&self) -> &str {
        "mock"
    }
}

pub(crate) fn analyze_ok(offence: &str, confidence: f64) -> AnalyzeResponse {
    AnalyzeResponse {
        success: true,
        offence_type: Some(offence.to_string()),
        confidence: Some(confidence),
        ..Default::default()
    }
}

pub(crate) fn fir_ok(id: &str, text: &str) -> FirResponse {
    FirResponse {
        success: true,
        fir_id: Some(id.to_string()),
        fir_text: Some(text.to_string()),
        offence_type: Some("Theft".to_string()),
        confidence: Some(0.9),
        ..Default::default()
    }
}

/// 録音モック
pub(crate) struct MockRecorder {
    pub start_result: Mutex<Result<(), RecordingError>>,
    pub active: Mutex<bool>,
}

impl MockRecorder {
    pub fn new() -> Self {
        Self {
            start_result: Mutex::new(Ok(())),
            active: Mutex::new(false),
        }
    }

    pub fn denied() -> Self {
        let recorder = Self::new();
        *recorder.start_result.lock() =
            Err(RecordingError::PermissionDenied("access denied".into()));
        recorder
    }
}

impl AudioRecorder for MockRecorder {
    fn start(&self) -> Result<(), RecordingError> {
        let mut active = self.active.lock();
        if *active {
            return Err(RecordingError::AlreadyRecording);
        }
        self.start_result.lock().clone()?;
        *active = true;
        Ok(())
    }

    fn stop(&self) -> Result<Attachment, RecordingError> {
        let mut active = self.active.lock();
        if !*active {
            return Err(RecordingError::NotRecording);
        }
        *active = false;
        Ok(Attachment::new("recording.wav", "audio/wav", vec![0u8; 16]))
    }

    fn is_active(&self) -> bool {
        *self.active.lock()
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// クリップボードモック
pub(crate) struct MockClipboard {
    pub fail: bool,
    pub delivered: Mutex<Vec<String>>,
}

impl MockClipboard {
    pub fn new(fail: bool) -> Self {
        Self {
            fail,
            delivered: Mutex::new(Vec::new()),
        }
    }
}

impl OutputTarget for MockClipboard {
    fn deliver(&self, text: &str) -> Result<(), AppError> {
        if self.fail {
            return Err(AppError::clipboard(crate::infra::output::CLIPBOARD_FAILED_MESSAGE));
        }
        self.delivered.lock().push(text.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// 印刷モック
pub(crate) struct MockPrinter {
    pub printed: Mutex<Vec<PrintDocument>>,
}

impl MockPrinter {
    pub fn new() -> Self {
        Self {
            printed: Mutex::new(Vec::new()),
        }
    }
}

impl PrintTarget for MockPrinter {
    fn present(&self, document: &PrintDocument) -> Result<std::path::PathBuf, ExportError> {
        self.printed.lock().push(document.clone());
        Ok(std::path::PathBuf::from(format!("mock://{}", document.fir_id)))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

pub(crate) fn context(api: Arc<MockFirApi>) -> SessionContext {
    let session = Session::new("test-session".into(), Language::En, "2025-01-15T10:30:00Z".into());
    SessionContext::new(session, api)
}
