use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::error::AppError;
use crate::domain::events::GenerationKind;
use crate::domain::session::Session;
use crate::domain::types::{FirResult, Language};
use crate::domain::wire::GenerateFirRequest;
use crate::infra::api::GenerationPayload;

use super::gate::GenerationPermit;
use super::submission::SubmissionCoordinator;
use super::SessionContext;

/// 言語変更に対する再生成の結果
#[derive(Debug, Clone)]
pub enum RegenerationOutcome {
    /// 言語が変わっていない
    Unchanged,
    /// 再生成対象の結果がない
    NoResult,
    /// 生成中のためスキップ
    Busy,
    /// 氏名 / 説明文が空
    MissingFields,
    Regenerated(Arc<FirResult>),
    Failed(AppError),
}

impl RegenerationOutcome {
    pub fn sent_request(&self) -> bool {
        matches!(self, Self::Regenerated(_) | Self::Failed(_))
    }
}

/// 表示言語の変更を受けて既存のFIRを再生成する（常に JSON）
///
/// 生成中に届いた変更はその場では `Busy` を返し、ゲート解放後に
/// 最新の言語で追いかけて再生成する。
pub struct RegenerationReactor {
    ctx: SessionContext,
    coordinator: Arc<SubmissionCoordinator>,
    deferred: Arc<AtomicBool>,
}

impl RegenerationReactor {
    pub fn new(ctx: SessionContext, coordinator: Arc<SubmissionCoordinator>) -> Self {
        Self {
            ctx,
            coordinator,
            deferred: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn on_language_changed(&self, language: Language) -> RegenerationOutcome {
        let request = self.ctx.with_session(|s| {
            if !s.set_language(language) {
                return Err(RegenerationOutcome::Unchanged);
            }
            prepare(s)
        });

        let request = match request {
            Ok(request) => request,
            Err(skipped) => {
                log::debug!("Language set to {language}, regeneration skipped: {skipped:?}");
                return skipped;
            }
        };

        let Some(permit) = self.ctx.gate.try_acquire() else {
            log::info!("Language set to {language} while a generation is in flight, deferring");
            self.defer();
            return RegenerationOutcome::Busy;
        };

        log::info!("Regenerating FIR in {language}");
        regenerate(&self.coordinator, request, permit).await
    }

    /// ゲート解放後に追いかけ再生成するタスクを1つだけ起動する
    fn defer(&self) {
        if self
            .deferred
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let ctx = self.ctx.clone();
        let coordinator = self.coordinator.clone();
        let deferred = self.deferred.clone();
        tokio::spawn(async move {
            loop {
                let outcome = catch_up(&ctx, &coordinator).await;
                log::debug!("Deferred regeneration settled: {outcome:?}");
                deferred.store(false, Ordering::Release);

                // 解除直前に届いた変更を取りこぼさない
                let failed = matches!(outcome, RegenerationOutcome::Failed(_));
                if failed || !ctx.with_session(|s| is_stale(s)) {
                    break;
                }
                if deferred
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    break;
                }
            }
        });
    }

    /// 言語シグナルを監視するタスクを起動する。
    /// 再生成中に届いた変更は完了後に最新値で処理される。
    pub fn spawn_watch(self: Arc<Self>, mut language_rx: watch::Receiver<Language>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while language_rx.changed().await.is_ok() {
                let language = *language_rx.borrow_and_update();
                self.on_language_changed(language).await;
            }
            log::debug!("Language signal closed, regeneration watcher stopped");
        })
    }
}

/// 既存の結果・氏名・説明文を確認してリクエストを組み立てる
fn prepare(s: &Session) -> Result<GenerateFirRequest, RegenerationOutcome> {
    if !s.has_result() {
        return Err(RegenerationOutcome::NoResult);
    }
    if s.form.name.is_empty() || !s.form.has_description() {
        return Err(RegenerationOutcome::MissingFields);
    }
    Ok(GenerateFirRequest::from_form(&s.form, s.language()))
}

/// 表示中の結果が選択言語と食い違っている
fn is_stale(s: &Session) -> bool {
    s.result().is_some_and(|r| r.language != s.language())
}

async fn regenerate(
    coordinator: &SubmissionCoordinator,
    request: GenerateFirRequest,
    permit: GenerationPermit,
) -> RegenerationOutcome {
    match coordinator
        .generate(
            GenerationPayload::Json(request),
            GenerationKind::Regeneration,
            permit,
        )
        .await
    {
        Ok(result) => RegenerationOutcome::Regenerated(result),
        Err(error) => RegenerationOutcome::Failed(error),
    }
}

async fn catch_up(ctx: &SessionContext, coordinator: &SubmissionCoordinator) -> RegenerationOutcome {
    loop {
        ctx.gate.wait_idle().await;

        let request = ctx.with_session(|s| {
            if !is_stale(s) {
                return Err(RegenerationOutcome::Unchanged);
            }
            prepare(s)
        });
        let request = match request {
            Ok(request) => request,
            Err(skipped) => return skipped,
        };

        // 別の生成に先を越されたら再度待つ
        let Some(permit) = ctx.gate.try_acquire() else {
            continue;
        };
        log::info!("Regenerating FIR in {} after the previous generation settled", request.language);
        return regenerate(coordinator, request, permit).await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::events::SessionEvent;
    use crate::domain::types::{ActiveTab, ApiStatus, Attachment};
    use crate::domain::wire::FirResponse;
    use crate::usecase::testing::{context, fir_ok, MockFirApi};

    fn setup() -> (
        Arc<MockFirApi>,
        SessionContext,
        Arc<SubmissionCoordinator>,
        Arc<RegenerationReactor>,
    ) {
        let api = Arc::new(MockFirApi::new());
        let ctx = context(api.clone());
        ctx.with_session(|s| {
            s.set_api_status(ApiStatus::Online);
            s.form.name = "Ravi Kumar".into();
            s.form.description = "My bike was stolen last night".into();
        });
        let coordinator = Arc::new(SubmissionCoordinator::new(ctx.clone()));
        let reactor = Arc::new(RegenerationReactor::new(ctx.clone(), coordinator.clone()));
        (api, ctx, coordinator, reactor)
    }

    #[tokio::test]
    async fn test_no_result_makes_no_request() {
        let (api, ctx, _, reactor) = setup();
        let outcome = reactor.on_language_changed(Language::Te).await;
        assert!(matches!(outcome, RegenerationOutcome::NoResult));
        assert!(api.calls().is_empty());
        assert_eq!(ctx.with_session(|s| s.language()), Language::Te);
    }

    #[tokio::test]
    async fn test_regenerates_as_json_and_replaces_result() {
        let (api, ctx, coordinator, reactor) = setup();
        ctx.with_session(|s| {
            s.form
                .add_evidence([Attachment::new("photo.jpg", "image/jpeg", vec![1])])
        });
        let first = coordinator.submit().await.unwrap();
        ctx.with_session(|s| s.select_tab(ActiveTab::Legal));

        let mut te = fir_ok("FIR001", "ప్రథమ సమాచార నివేదిక");
        te.offence_type = Some("Robbery".into());
        api.push_generate(Ok(te));

        let outcome = reactor.on_language_changed(Language::Te).await;
        let RegenerationOutcome::Regenerated(second) = outcome else {
            panic!("expected regeneration, got {outcome:?}");
        };

        let payloads = api.generate_calls();
        assert_eq!(payloads.len(), 2);
        assert!(payloads[0].is_multipart());
        assert!(!payloads[1].is_multipart());
        assert_eq!(payloads[1].fields().language, Language::Te);

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.offence_type, "Theft");
        assert_eq!(second.offence_type, "Robbery");
        assert_eq!(second.language, Language::Te);
        ctx.with_session(|s| {
            assert!(Arc::ptr_eq(&s.result().unwrap(), &second));
            assert_eq!(s.active_tab(), ActiveTab::Document);
        });
    }

    #[tokio::test]
    async fn test_same_language_is_ignored() {
        let (api, _, coordinator, reactor) = setup();
        coordinator.submit().await.unwrap();
        let outcome = reactor.on_language_changed(Language::En).await;
        assert!(matches!(outcome, RegenerationOutcome::Unchanged));
        assert_eq!(api.generate_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_name_skips() {
        let (api, ctx, coordinator, reactor) = setup();
        coordinator.submit().await.unwrap();
        ctx.with_session(|s| s.form.name.clear());

        let outcome = reactor.on_language_changed(Language::Te).await;
        assert!(matches!(outcome, RegenerationOutcome::MissingFields));
        assert_eq!(api.generate_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_result() {
        let (api, ctx, coordinator, reactor) = setup();
        coordinator.submit().await.unwrap();
        api.push_generate(Ok(FirResponse::rejected("Translation unavailable")));

        let outcome = reactor.on_language_changed(Language::Te).await;
        assert!(matches!(outcome, RegenerationOutcome::Failed(_)));
        ctx.with_session(|s| {
            assert_eq!(s.result().unwrap().language, Language::En);
            assert_eq!(s.error(), Some("Translation unavailable"));
            assert_eq!(s.language(), Language::Te);
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_during_submission_regenerates_after_it_settles() {
        let (api, ctx, coordinator, reactor) = setup();
        coordinator.submit().await.unwrap();
        api.set_delay(Duration::from_secs(1));
        let mut rx = ctx.subscribe();

        let pending = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.submit().await }
        });
        tokio::task::yield_now().await;
        assert!(ctx.gate.is_busy());

        let outcome = reactor.on_language_changed(Language::Te).await;
        assert!(matches!(outcome, RegenerationOutcome::Busy));
        assert!(!outcome.sent_request());
        assert_eq!(api.generate_calls().len(), 2);

        let submitted = pending.await.unwrap().unwrap();
        assert_eq!(submitted.language, Language::En);

        loop {
            if let SessionEvent::ResultReady {
                kind: GenerationKind::Regeneration,
                ..
            } = rx.recv().await.unwrap()
            {
                break;
            }
        }
        let payloads = api.generate_calls();
        assert_eq!(payloads.len(), 3);
        assert!(!payloads[2].is_multipart());
        assert_eq!(payloads[2].fields().language, Language::Te);
        ctx.with_session(|s| assert_eq!(s.result().unwrap().language, Language::Te));
        assert!(!ctx.gate.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_reverted_during_submission_sends_nothing_extra() {
        let (api, ctx, coordinator, reactor) = setup();
        coordinator.submit().await.unwrap();
        api.set_delay(Duration::from_secs(1));

        let pending = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.submit().await }
        });
        tokio::task::yield_now().await;

        assert!(matches!(
            reactor.on_language_changed(Language::Te).await,
            RegenerationOutcome::Busy
        ));
        assert!(matches!(
            reactor.on_language_changed(Language::En).await,
            RegenerationOutcome::Busy
        ));

        pending.await.unwrap().unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(api.generate_calls().len(), 2);
        ctx.with_session(|s| assert_eq!(s.result().unwrap().language, Language::En));
    }

    #[tokio::test]
    async fn test_watch_channel_triggers_regeneration() {
        let (api, ctx, coordinator, reactor) = setup();
        coordinator.submit().await.unwrap();
        let mut rx = ctx.subscribe();

        let (tx, language_rx) = watch::channel(Language::En);
        let handle = reactor.spawn_watch(language_rx);
        tx.send(Language::Te).unwrap();

        loop {
            if let SessionEvent::ResultReady { kind, .. } = rx.recv().await.unwrap() {
                assert_eq!(kind, GenerationKind::Regeneration);
                break;
            }
        }
        assert_eq!(api.generate_calls()[1].fields().language, Language::Te);

        drop(tx);
        handle.await.unwrap();
    }
}
