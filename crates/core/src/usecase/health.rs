use tokio::sync::OnceCell;

use crate::domain::events::SessionEvent;
use crate::domain::types::ApiStatus;

use super::SessionContext;

/// 起動時に一度だけ `/health` を確認する
pub struct ApiStatusMonitor {
    ctx: SessionContext,
    outcome: OnceCell<ApiStatus>,
}

impl ApiStatusMonitor {
    pub fn new(ctx: SessionContext) -> Self {
        Self {
            ctx,
            outcome: OnceCell::new(),
        }
    }

    /// ヘルスチェックを実行する。2回目以降はネットワークに触れず初回の結果を返す。
    pub async fn probe(&self) -> ApiStatus {
        *self
            .outcome
            .get_or_init(|| async {
                let status = match self.ctx.api.health().await {
                    Ok(resp) if resp.is_healthy() => ApiStatus::Online,
                    Ok(resp) => {
                        log::warn!("FIR service reported status {:?}", resp.status);
                        ApiStatus::Offline
                    }
                    Err(e) => {
                        log::warn!("Health check failed: {e}");
                        ApiStatus::Offline
                    }
                };

                self.ctx.with_session(|s| s.set_api_status(status));
                log::info!("FIR service status: {status:?}");
                self.ctx.emit(SessionEvent::ApiStatusChanged { status });
                status
            })
            .await
    }

    pub fn status(&self) -> ApiStatus {
        self.ctx.with_session(|s| s.api_status())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::wire::HealthResponse;
    use crate::infra::api::ApiError;
    use crate::usecase::testing::{context, Call, MockFirApi};

    #[tokio::test]
    async fn test_healthy_is_online() {
        let api = Arc::new(MockFirApi::new());
        let ctx = context(api.clone());
        let mut rx = ctx.subscribe();
        let monitor = ApiStatusMonitor::new(ctx);

        assert_eq!(monitor.status(), ApiStatus::Checking);
        assert_eq!(monitor.probe().await, ApiStatus::Online);
        assert_eq!(monitor.status(), ApiStatus::Online);
        assert!(matches!(
            rx.try_recv().unwrap(),
            SessionEvent::ApiStatusChanged {
                status: ApiStatus::Online
            }
        ));
    }

    #[tokio::test]
    async fn test_other_status_is_offline() {
        let api = Arc::new(MockFirApi::new());
        *api.health.lock() = Ok(HealthResponse {
            status: "degraded".into(),
        });
        let monitor = ApiStatusMonitor::new(context(api));
        assert_eq!(monitor.probe().await, ApiStatus::Offline);
    }

    #[tokio::test]
    async fn test_network_failure_is_offline() {
        let api = Arc::new(MockFirApi::new());
        *api.health.lock() = Err(ApiError::Unreachable("connection refused".into()));
        let monitor = ApiStatusMonitor::new(context(api));
        assert_eq!(monitor.probe().await, ApiStatus::Offline);
    }

    #[tokio::test]
    async fn test_probe_runs_once() {
        let api = Arc::new(MockFirApi::new());
        let monitor = ApiStatusMonitor::new(context(api.clone()));

        monitor.probe().await;
        *api.health.lock() = Err(ApiError::Timeout);
        assert_eq!(monitor.probe().await, ApiStatus::Online);

        let health_calls = api.calls().iter().filter(|c| **c == Call::Health).count();
        assert_eq!(health_calls, 1);
    }
}
