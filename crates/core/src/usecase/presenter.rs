use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::error::AppError;
use crate::domain::events::SessionEvent;
use crate::domain::report::{self, ResultSummary, TabView};
use crate::domain::types::{ActiveTab, FirResult};
use crate::infra::export::{self, PageLayout, PrintDocument, PrintTarget};
use crate::infra::output::OutputTarget;

use super::SessionContext;

pub const NO_RESULT_MESSAGE: &str = "No FIR has been generated yet";

/// 生成済みFIRの表示とアクション（コピー / PDF / 印刷）
pub struct ResultPresenter {
    ctx: SessionContext,
    clipboard: Arc<dyn OutputTarget>,
    printer: Arc<dyn PrintTarget>,
    export_dir: PathBuf,
    layout: PageLayout,
    copy_confirmation: Duration,
    /// 最新のコピー操作の世代（古いタイマーが表示を消さないように）
    copy_epoch: Arc<AtomicU64>,
}

impl ResultPresenter {
    pub fn new(
        ctx: SessionContext,
        clipboard: Arc<dyn OutputTarget>,
        printer: Arc<dyn PrintTarget>,
        export_dir: PathBuf,
        copy_confirmation: Duration,
    ) -> Self {
        Self {
            ctx,
            clipboard,
            printer,
            export_dir,
            layout: PageLayout::default(),
            copy_confirmation,
            copy_epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn select_tab(&self, tab: ActiveTab) {
        self.ctx.with_session(|s| s.select_tab(tab));
    }

    pub fn active_tab(&self) -> ActiveTab {
        self.ctx.with_session(|s| s.active_tab())
    }

    fn current(&self) -> Result<Arc<FirResult>, AppError> {
        self.ctx
            .with_session(|s| s.result())
            .ok_or_else(|| AppError::invalid_state(NO_RESULT_MESSAGE))
    }

    /// 選択中タブのビュー（結果がなければ `None`）
    pub fn view(&self) -> Option<TabView> {
        let (result, tab) = self.ctx.with_session(|s| (s.result(), s.active_tab()));
        result.map(|r| report::render_tab(&r, tab))
    }

    pub fn summary(&self) -> Option<ResultSummary> {
        self.ctx
            .with_session(|s| s.result())
            .map(|r| report::summary(&r))
    }

    /// 本文をクリップボードへコピーし、一定時間 copied 表示にする。
    /// tokio ランタイム上で呼ぶこと。
    pub fn copy(&self) -> Result<(), AppError> {
        let result = self.current()?;

        if let Err(error) = self.clipboard.deliver(&result.generated_text) {
            self.ctx.with_session(|s| s.set_error(error.message.clone()));
            return Err(error);
        }

        let epoch = self.copy_epoch.fetch_add(1, Ordering::AcqRel) + 1;
        self.ctx.with_session(|s| s.set_copied(true));
        self.ctx.emit(SessionEvent::CopyConfirmed);

        let ctx = self.ctx.clone();
        let latest = self.copy_epoch.clone();
        let hold = self.copy_confirmation;
        tokio::spawn(async move {
            tokio::time::sleep(hold).await;
            if latest.load(Ordering::Acquire) != epoch {
                return;
            }
            let expired = ctx.with_session(|s| {
                let was_copied = s.copied();
                s.set_copied(false);
                was_copied
            });
            if expired {
                ctx.emit(SessionEvent::CopyConfirmationExpired);
            }
        });
        Ok(())
    }

    /// PDF を書き出す（`dir` 省略時は既定の出力先）
    pub fn export_pdf(&self, dir: Option<&Path>) -> Result<PathBuf, AppError> {
        let result = self.current()?;
        let dir = dir.unwrap_or(&self.export_dir);
        Ok(export::export_pdf(&result, dir, &self.layout)?)
    }

    /// 本文のみの印刷面を開く
    pub fn print(&self) -> Result<PathBuf, AppError> {
        let result = self.current()?;
        let document = PrintDocument::for_result(&result);
        log::info!("Opening print surface via {}: {}", self.printer.name(), document.title);
        Ok(self.printer.present(&document)?)
    }
}
