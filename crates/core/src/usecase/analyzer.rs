use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::domain::events::SessionEvent;
use crate::domain::settings::ClientSettings;

use super::SessionContext;

/// 予約中の解析タイマー
struct PendingAnalysis {
    cancel_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// 説明文の入力ごとに呼ばれ、静止期間後に1回だけ `/analyze_realtime` を送る
pub struct DebouncedAnalyzer {
    ctx: SessionContext,
    min_chars: usize,
    quiet_period: Duration,
    pending: Mutex<Option<PendingAnalysis>>,
}

impl DebouncedAnalyzer {
    pub fn new(ctx: SessionContext, settings: &ClientSettings) -> Self {
        Self {
            ctx,
            min_chars: settings.analysis_min_chars,
            quiet_period: settings.analysis_debounce(),
            pending: Mutex::new(None),
        }
    }

    /// 入力テキストを受け取る。tokio ランタイム上で呼ぶこと。
    ///
    /// 閾値未満ならプレビューを消して予約を取り消す。
    /// 閾値以上なら予約を張り替える（発火時点の説明文を送信する）。
    pub fn analyze(&self, text: &str) {
        if text.chars().count() < self.min_chars {
            self.cancel();
            if self.ctx.with_session(|s| s.clear_preview()) {
                self.ctx.emit(SessionEvent::PreviewCleared);
            }
            return;
        }

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let handle = tokio::spawn(run_after_quiet_period(
            self.ctx.clone(),
            self.min_chars,
            self.quiet_period,
            cancel_rx,
        ));

        let previous = self.pending.lock().replace(PendingAnalysis { cancel_tx, handle });
        if let Some(previous) = previous {
            // 発火済みならリクエストはそのまま走らせる
            let _ = previous.cancel_tx.send(());
        }
    }

    /// 予約中のタイマーを取り消す（送信済みのリクエストには影響しない）
    pub fn cancel(&self) {
        if let Some(pending) = self.pending.lock().take() {
            let _ = pending.cancel_tx.send(());
        }
    }

    /// 予約または送信中の解析があるか
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|p| !p.handle.is_finished())
    }
}

impl Drop for DebouncedAnalyzer {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_after_quiet_period(
    ctx: SessionContext,
    min_chars: usize,
    quiet_period: Duration,
    cancel_rx: oneshot::Receiver<()>,
) {
    tokio::select! {
        _ = cancel_rx => return,
        _ = tokio::time::sleep(quiet_period) => {}
    }

    let below = |text: &str| text.chars().count() < min_chars;

    let text = ctx.with_session(|s| s.form.description.clone());
    if below(&text) {
        log::debug!("analysis skipped: description shorter than {min_chars} chars at fire time");
        return;
    }

    let response = match ctx.api.analyze_realtime(&text).await {
        Ok(response) => response,
        Err(e) => {
            log::debug!("realtime analysis failed: {e}");
            return;
        }
    };
    let Some(preview) = response.into_preview() else {
        log::debug!("realtime analysis returned success=false");
        return;
    };

    let applied = ctx.with_session(|s| {
        if below(&s.form.description) {
            return false;
        }
        s.set_preview(preview.clone());
        true
    });
    if applied {
        ctx.emit(SessionEvent::PreviewUpdated { preview });
    } else {
        log::debug!("analysis response discarded: description fell below threshold");
    }
}
