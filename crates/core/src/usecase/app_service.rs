use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::domain::error::AppError;
use crate::domain::events::SessionEvent;
use crate::domain::report::{ResultSummary, TabView};
use crate::domain::session::{Session, SessionSnapshot};
use crate::domain::settings::ClientSettings;
use crate::domain::types::{
    ActiveTab, AnalysisPreview, ApiStatus, Attachment, FirResult, Language,
};
use crate::infra::api::{FirApi, HttpFirApi};
use crate::infra::audio::{self, AudioRecorder};
use crate::infra::export::{HtmlFilePrinter, PrintTarget};
use crate::infra::output::{ClipboardOutput, OutputTarget};

use super::analyzer::DebouncedAnalyzer;
use super::audio_ingest::AudioIngestor;
use super::health::ApiStatusMonitor;
use super::presenter::ResultPresenter;
use super::regeneration::{RegenerationOutcome, RegenerationReactor};
use super::submission::SubmissionCoordinator;
use super::SessionContext;

/// 外部コラボレーター（テストではモックに差し替える）
pub struct ServiceDeps {
    pub api: Arc<dyn FirApi>,
    pub recorder: Arc<dyn AudioRecorder>,
    pub clipboard: Arc<dyn OutputTarget>,
    pub printer: Arc<dyn PrintTarget>,
}

/// アプリケーションサービス（フロントエンドが保持する唯一の型）
pub struct AppService {
    ctx: SessionContext,
    settings: ClientSettings,
    monitor: ApiStatusMonitor,
    analyzer: Arc<DebouncedAnalyzer>,
    ingestor: AudioIngestor,
    coordinator: Arc<SubmissionCoordinator>,
    reactor: Arc<RegenerationReactor>,
    presenter: ResultPresenter,
}

/// 出力先が未設定ならダウンロードフォルダ（無ければカレント）
pub fn resolve_export_dir(settings: &ClientSettings) -> PathBuf {
    settings
        .export_dir
        .clone()
        .or_else(dirs::download_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

impl AppService {
    pub fn new(settings: ClientSettings, deps: ServiceDeps) -> Self {
        let session_id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        let session = Session::new(session_id.clone(), settings.language, now);
        let ctx = SessionContext::new(session, deps.api.clone());

        let analyzer = Arc::new(DebouncedAnalyzer::new(ctx.clone(), &settings));
        let coordinator = Arc::new(SubmissionCoordinator::new(ctx.clone()));
        let reactor = Arc::new(RegenerationReactor::new(ctx.clone(), coordinator.clone()));
        let ingestor = AudioIngestor::new(ctx.clone(), deps.recorder, analyzer.clone());
        let presenter = ResultPresenter::new(
            ctx.clone(),
            deps.clipboard,
            deps.printer,
            resolve_export_dir(&settings),
            settings.copy_confirmation(),
        );

        log::info!(
            "Session {session_id} started (api={}, backend={})",
            deps.api.name(),
            settings.api_base_url
        );

        Self {
            monitor: ApiStatusMonitor::new(ctx.clone()),
            ctx,
            settings,
            analyzer,
            ingestor,
            coordinator,
            reactor,
            presenter,
        }
    }

    /// HTTP クライアント・システムクリップボード・HTML 印刷で構築する
    pub fn with_defaults(settings: ClientSettings) -> Result<Self, AppError> {
        let api = HttpFirApi::new(&settings).map_err(AppError::from)?;
        let deps = ServiceDeps {
            api: Arc::new(api),
            recorder: audio::default_recorder(),
            clipboard: Arc::new(ClipboardOutput::new()),
            printer: Arc::new(HtmlFilePrinter::new(resolve_export_dir(&settings))),
        };
        Ok(Self::new(settings, deps))
    }

    // ==================== Session ====================

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.ctx.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let mut snapshot = self.ctx.with_session(|s| s.snapshot());
        snapshot.analysis_pending = self.analyzer.is_pending();
        snapshot
    }

    pub fn error(&self) -> Option<String> {
        self.ctx.with_session(|s| s.error().map(str::to_string))
    }

    /// フォーム・結果・プレビューを消去する（言語と API 状態は保持）
    pub fn reset(&self) {
        self.analyzer.cancel();
        let had_preview = self.ctx.with_session(|s| {
            let had_preview = s.preview().is_some();
            s.reset();
            had_preview
        });
        if had_preview {
            self.ctx.emit(SessionEvent::PreviewCleared);
        }
        self.ctx.emit(SessionEvent::DescriptionChanged { length: 0 });
        log::info!("Session reset");
    }

    // ==================== Health ====================

    pub async fn probe_health(&self) -> ApiStatus {
        self.monitor.probe().await
    }

    pub fn api_status(&self) -> ApiStatus {
        self.monitor.status()
    }

    // ==================== Form ====================

    pub fn set_name(&self, name: impl Into<String>) {
        let name = name.into();
        self.ctx.with_session(|s| s.form.name = name);
    }

    pub fn set_contact(&self, contact: impl Into<String>) {
        let contact = contact.into();
        self.ctx.with_session(|s| s.form.contact = contact);
    }

    pub fn set_witness(&self, name: impl Into<String>, contact: impl Into<String>) {
        let (name, contact) = (name.into(), contact.into());
        self.ctx.with_session(|s| {
            s.form.witness_name = name;
            s.form.witness_contact = contact;
        });
    }

    pub fn toggle_witness(&self) -> bool {
        self.ctx.with_session(|s| {
            s.form.toggle_witness();
            s.form.show_witness
        })
    }

    /// 説明文を更新し、リアルタイム解析を予約する
    pub fn set_description(&self, text: impl Into<String>) {
        let text = text.into();
        let length = self.ctx.with_session(|s| {
            s.form.description = text.clone();
            s.form.description_len()
        });
        self.ctx.emit(SessionEvent::DescriptionChanged { length });
        self.analyzer.analyze(&text);
    }

    pub fn description(&self) -> String {
        self.ctx.with_session(|s| s.form.description.clone())
    }

    pub fn add_evidence(&self, files: Vec<Attachment>) -> usize {
        self.ctx.with_session(|s| {
            s.form.add_evidence(files);
            s.form.evidence_files.len()
        })
    }

    pub fn remove_evidence(&self, index: usize) -> Result<Attachment, AppError> {
        self.ctx.with_session(|s| s.form.remove_evidence(index))
    }

    pub fn preview(&self) -> Option<AnalysisPreview> {
        self.ctx.with_session(|s| s.preview().cloned())
    }

    /// 生成ボタンの有効条件
    pub fn can_submit(&self) -> bool {
        !self.ctx.gate.is_busy()
            && self.ctx.with_session(|s| {
                s.form.has_description() && s.api_status() == ApiStatus::Online
            })
    }

    // ==================== Audio ====================

    pub fn start_recording(&self) -> Result<(), AppError> {
        self.ingestor.start_capture()
    }

    pub async fn stop_recording(&self) -> Result<String, AppError> {
        self.ingestor.stop_capture().await
    }

    pub async fn upload_audio(&self, clip: Attachment) -> Result<String, AppError> {
        self.ingestor.upload(clip).await
    }

    pub fn is_recording(&self) -> bool {
        self.ingestor.is_recording()
    }

    // ==================== Generation ====================

    pub async fn submit(&self) -> Result<Arc<FirResult>, AppError> {
        self.coordinator.submit().await
    }

    pub fn is_generating(&self) -> bool {
        self.ctx.gate.is_busy()
    }

    pub fn language(&self) -> Language {
        self.ctx.with_session(|s| s.language())
    }

    /// 表示言語を変更する（結果があれば再生成）
    pub async fn set_language(&self, language: Language) -> RegenerationOutcome {
        self.reactor.on_language_changed(language).await
    }

    /// 言語スイッチャー（en ⇔ te）
    pub async fn toggle_language(&self) -> RegenerationOutcome {
        let next = self.language().toggle();
        self.set_language(next).await
    }

    // ==================== Result ====================

    pub fn result(&self) -> Option<Arc<FirResult>> {
        self.ctx.with_session(|s| s.result())
    }

    pub fn select_tab(&self, tab: ActiveTab) {
        self.presenter.select_tab(tab);
    }

    pub fn view(&self) -> Option<TabView> {
        self.presenter.view()
    }

    pub fn summary(&self) -> Option<ResultSummary> {
        self.presenter.summary()
    }

    pub fn copy_to_clipboard(&self) -> Result<(), AppError> {
        self.presenter.copy()
    }

    pub fn export_pdf(&self, dir: Option<&Path>) -> Result<PathBuf, AppError> {
        self.presenter.export_pdf(dir)
    }

    pub fn print(&self) -> Result<PathBuf, AppError> {
        self.presenter.print()
    }
}
