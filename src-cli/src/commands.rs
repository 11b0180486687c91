use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;

use fir_core::domain::error::AppError;
use fir_core::domain::events::SessionEvent;
use fir_core::domain::report::{
    EntitiesView, LegalView, TabView, NO_ENTITIES_MESSAGE, NO_SECTIONS_MESSAGE,
};
use fir_core::domain::settings::ClientSettings;
use fir_core::domain::types::{AnalysisPreview, ApiStatus, Attachment};
use fir_core::usecase::app_service::AppService;
use fir_core::usecase::regeneration::RegenerationOutcome;

use crate::GenerateArgs;

/// コマンドエラー型
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    App(#[from] AppError),
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Usage(String),
}

pub type CmdResult<T> = Result<T, CommandError>;

/// 出力先（テキスト / JSON）
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) {
        if self.json {
            match serde_json::to_string_pretty(value) {
                Ok(json) => println!("{json}"),
                Err(e) => log::error!("Failed to serialize output: {e}"),
            }
        } else {
            println!("{}", text());
        }
    }
}

fn read_attachment(path: &Path) -> CmdResult<Attachment> {
    let bytes = std::fs::read(path).map_err(|source| CommandError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(Attachment::new(file_name, mime_for(path), bytes))
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "ogg" => "audio/ogg",
        "webm" => "audio/webm",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// プレビュー待ちの上限（待機時間 + ヘルスチェック相当）
fn preview_wait(settings: &ClientSettings) -> Duration {
    settings.analysis_debounce() + settings.health_timeout()
}

/// 送信前にヘルスチェックを一度だけ行う（Offline の場合は submit 側で拒否される）
async fn probe_before_submit(app: &AppService) {
    let status = app.probe_health().await;
    if status != ApiStatus::Online {
        log::warn!("FIR service status is {status:?}");
    }
}

// --- Commands ---

pub async fn health(app: &AppService, out: &Output) -> CmdResult<()> {
    let status = app.probe_health().await;
    #[derive(Serialize)]
    struct HealthOutput<'a> {
        api_base_url: &'a str,
        status: ApiStatus,
    }
    out.emit(
        &HealthOutput {
            api_base_url: &app.settings().api_base_url,
            status,
        },
        || format!("{}: {status:?}", app.settings().api_base_url),
    );
    if status == ApiStatus::Online {
        Ok(())
    } else {
        Err(CommandError::Usage("FIR service is not reachable".into()))
    }
}

pub async fn analyze(app: &AppService, out: &Output, text: String) -> CmdResult<()> {
    let min_chars = app.settings().analysis_min_chars;
    if text.chars().count() < min_chars {
        return Err(CommandError::Usage(format!(
            "Realtime analysis needs at least {min_chars} characters"
        )));
    }

    let mut rx = app.subscribe();
    app.set_description(text);

    let preview = tokio::time::timeout(preview_wait(app.settings()), async {
        loop {
            match tokio::time::timeout(POLL_INTERVAL, rx.recv()).await {
                Ok(Ok(SessionEvent::PreviewUpdated { preview })) => return Some(preview),
                Ok(Ok(_)) | Ok(Err(RecvError::Lagged(_))) => continue,
                Ok(Err(RecvError::Closed)) => return None,
                // 解析の失敗は通知されないため、タスクの終了で判断する
                Err(_) if !app.snapshot().analysis_pending => return app.preview(),
                Err(_) => continue,
            }
        }
    })
    .await
    .ok()
    .flatten();

    match preview {
        Some(preview) => {
            let chars = app.snapshot().description_chars;
            out.emit(&preview, || {
                format!("{}\nDescription: {chars} characters", format_preview(&preview))
            });
            Ok(())
        }
        None => Err(CommandError::Usage("No analysis preview available".into())),
    }
}

pub async fn transcribe(app: &AppService, out: &Output, file: &Path) -> CmdResult<()> {
    let clip = read_attachment(file)?;
    let text = app.upload_audio(clip).await?;
    out.emit(&serde_json::json!({ "text": text }), || text.clone());
    Ok(())
}

#[cfg(feature = "microphone")]
pub async fn record(app: &AppService, out: &Output, seconds: u64) -> CmdResult<()> {
    app.start_recording()?;
    eprintln!("Recording for {seconds}s...");
    tokio::time::sleep(Duration::from_secs(seconds)).await;
    let text = app.stop_recording().await?;
    out.emit(&serde_json::json!({ "text": text }), || text.clone());
    Ok(())
}

pub async fn generate(app: &AppService, out: &Output, args: GenerateArgs) -> CmdResult<()> {
    let description = match (&args.description, &args.description_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path).map_err(|source| CommandError::Read {
            path: path.clone(),
            source,
        })?,
        (None, None) if args.audio.is_some() => String::new(),
        (None, None) => {
            return Err(CommandError::Usage(
                "Provide --description, --description-file or --audio".into(),
            ))
        }
    };

    probe_before_submit(app).await;

    app.set_name(&args.name);
    app.set_contact(&args.contact);
    if args.witness_name.is_some() || args.witness_contact.is_some() {
        app.toggle_witness();
        app.set_witness(
            args.witness_name.clone().unwrap_or_default(),
            args.witness_contact.clone().unwrap_or_default(),
        );
    }
    app.set_description(description);

    if let Some(audio) = &args.audio {
        let clip = read_attachment(audio)?;
        app.upload_audio(clip).await?;
    }

    let evidence = args
        .evidence
        .iter()
        .map(|p| read_attachment(p))
        .collect::<CmdResult<Vec<_>>>()?;
    if !evidence.is_empty() {
        app.add_evidence(evidence);
    }

    app.submit().await?;

    if let Some(language) = args.regenerate_in {
        match app.set_language(language).await {
            RegenerationOutcome::Failed(e) => return Err(e.into()),
            outcome => log::info!("Regeneration in {language}: {}", outcome_label(&outcome)),
        }
    }

    app.select_tab(args.tab);
    if let (Some(summary), Some(view)) = (app.summary(), app.view()) {
        out.emit(&serde_json::json!({ "summary": summary, "view": view }), || {
            format!(
                "FIR {} | {} ({}%) | {} {} | {} | persons: {} | {}\n\n{}",
                summary.fir_id,
                summary.offence_type,
                summary.confidence_percent,
                summary.date,
                summary.time,
                summary.location,
                summary.persons,
                summary.processing_time,
                format_view(&view)
            )
        });
    }

    if args.copy {
        app.copy_to_clipboard()?;
        // 終了直後にクリップボードの所有者が消えないよう少し待つ
        tokio::time::sleep(Duration::from_millis(200)).await;
        eprintln!("Copied FIR text to clipboard");
    }
    if let Some(dir) = &args.export {
        let dir = (!dir.as_os_str().is_empty()).then_some(dir.as_path());
        let path = app.export_pdf(dir)?;
        eprintln!("PDF saved: {}", path.display());
    }
    if args.print {
        let path = app.print()?;
        eprintln!("Print document: {}", path.display());
    }
    Ok(())
}

fn outcome_label(outcome: &RegenerationOutcome) -> &'static str {
    match outcome {
        RegenerationOutcome::Unchanged => "language unchanged",
        RegenerationOutcome::NoResult => "no result to regenerate",
        RegenerationOutcome::Busy => "skipped, generation in progress",
        RegenerationOutcome::MissingFields => "skipped, name or description empty",
        RegenerationOutcome::Regenerated(_) => "regenerated",
        RegenerationOutcome::Failed(_) => "failed",
    }
}

fn format_preview(preview: &AnalysisPreview) -> String {
    let join = |set: &std::collections::BTreeSet<String>| {
        if set.is_empty() {
            "-".to_string()
        } else {
            set.iter().cloned().collect::<Vec<_>>().join(", ")
        }
    };
    format!(
        "Offence: {} ({:.0}%, {:?})\nPersons: {}\nLocations: {}\nOrganizations: {}",
        preview.offence_type.as_deref().unwrap_or("unknown"),
        preview.confidence * 100.0,
        preview.confidence_level,
        join(&preview.detected_persons),
        join(&preview.detected_locations),
        join(&preview.detected_organizations),
    )
}

fn format_view(view: &TabView) -> String {
    match view {
        TabView::Document(doc) => format!("[{}]\n{}", doc.id, doc.text),
        TabView::Entities(EntitiesView::Empty) => NO_ENTITIES_MESSAGE.to_string(),
        TabView::Entities(EntitiesView::Groups { groups }) => groups
            .iter()
            .map(|g| format!("{}:\n  {}", g.category.title(), g.values.join("\n  ")))
            .collect::<Vec<_>>()
            .join("\n"),
        TabView::Legal(LegalView::Empty) => NO_SECTIONS_MESSAGE.to_string(),
        TabView::Legal(LegalView::Sections {
            offence_type,
            sections,
            disclaimer,
        }) => {
            let lines = sections
                .iter()
                .map(|s| format!("  Section {}: {}", s.section_number, s.description))
                .collect::<Vec<_>>()
                .join("\n");
            format!("{offence_type}\n{lines}\n\n{disclaimer}")
        }
    }
}
