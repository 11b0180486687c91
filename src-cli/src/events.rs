use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use fir_core::domain::events::SessionEvent;

/// セッションイベントをログへ流すリスナーを起動する
pub fn spawn_listener(mut rx: broadcast::Receiver<SessionEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("イベント受信遅延: {skipped} 件をスキップ");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// 統一イベントログ関数
fn log_event(event: &SessionEvent) {
    let name = event.name();
    match event {
        SessionEvent::Alert { error } | SessionEvent::TranscriptionFailed { error } => {
            log::warn!("[{name}] {}", error.message);
        }
        SessionEvent::GenerationFailed { kind, error } => {
            log::warn!("[{name}] {kind:?}: {}", error.message);
        }
        _ => match serde_json::to_string(event) {
            Ok(payload) => log::debug!("[{name}] {payload}"),
            Err(e) => log::error!("イベントのシリアライズ失敗 [{name}]: {e}"),
        },
    }
}
