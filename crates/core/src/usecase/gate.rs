use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// 単一実行ゲート。同時に1つの処理だけが permit を持てる。
#[derive(Debug, Clone, Default)]
pub struct GenerationGate {
    busy: Arc<AtomicBool>,
    released: Arc<Notify>,
}

impl GenerationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// 空いていれば permit を返す。使用中なら `None`。
    pub fn try_acquire(&self) -> Option<GenerationPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GenerationPermit {
                busy: self.busy.clone(),
                released: self.released.clone(),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// permit が解放されるまで待つ（空いていれば即座に返る）
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.released.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if !self.is_busy() {
                return;
            }
            notified.await;
        }
    }
}

/// drop 時にゲートを解放する（早期 return / panic でも解放される）
#[derive(Debug)]
pub struct GenerationPermit {
    busy: Arc<AtomicBool>,
    released: Arc<Notify>,
}

impl Drop for GenerationPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
        self.released.notify_waiters();
    }
}
