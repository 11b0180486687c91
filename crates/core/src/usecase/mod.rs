pub mod analyzer;
pub mod app_service;
pub mod audio_ingest;
pub mod gate;
pub mod health;
pub mod presenter;
pub mod regeneration;
pub mod submission;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::domain::events::SessionEvent;
use crate::domain::session::Session;
use crate::infra::api::FirApi;

use self::gate::GenerationGate;

/// イベントチャネルの容量（遅い購読者は古いイベントを取りこぼす）
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// 全コンポーネントが共有するセッション文脈
///
/// セッションのロックは `.await` をまたいで保持しないこと。
#[derive(Clone)]
pub struct SessionContext {
    pub session: Arc<Mutex<Session>>,
    pub api: Arc<dyn FirApi>,
    pub gate: GenerationGate,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionContext {
    pub fn new(session: Session, api: Arc<dyn FirApi>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            session: Arc::new(Mutex::new(session)),
            api,
            gate: GenerationGate::new(),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// イベント送信（購読者がいない場合は捨てる）
    pub fn emit(&self, event: SessionEvent) {
        let name = event.name();
        if self.events.send(event).is_err() {
            log::trace!("no subscribers for event [{name}]");
        }
    }

    /// セッションを短時間ロックして読み書きする
    pub fn with_session<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        f(&mut self.session.lock())
    }
}
