use std::sync::Arc;

use crate::domain::error::AppError;
use crate::domain::events::{GenerationKind, SessionEvent};
use crate::domain::types::{ApiStatus, FirResult};
use crate::domain::wire::GenerateFirRequest;
use crate::infra::api::{GenerationPayload, REJECTED_MESSAGE};

use super::gate::GenerationPermit;
use super::SessionContext;

pub const EMPTY_DESCRIPTION_MESSAGE: &str = "Please describe the incident before generating the FIR.";
pub const BUSY_MESSAGE: &str = "A FIR is already being generated. Please wait.";
pub const OFFLINE_MESSAGE: &str = "The FIR service is offline. Make sure the backend is running.";
pub const CHECKING_MESSAGE: &str = "Still checking the FIR service status. Please try again shortly.";

/// FIR生成リクエストの組み立てと応答の反映
pub struct SubmissionCoordinator {
    ctx: SessionContext,
}

impl SubmissionCoordinator {
    pub fn new(ctx: SessionContext) -> Self {
        Self { ctx }
    }

    /// フォームからFIRを生成する。
    ///
    /// 生成中・説明文が空・サービス未確認 / オフラインの場合は
    /// ネットワークに触れずセッションも変更しない。
    pub async fn submit(&self) -> Result<Arc<FirResult>, AppError> {
        let permit = self
            .ctx
            .gate
            .try_acquire()
            .ok_or_else(|| AppError::busy(BUSY_MESSAGE))?;

        let payload = self.ctx.with_session(|s| {
            if !s.form.has_description() {
                return Err(AppError::validation(EMPTY_DESCRIPTION_MESSAGE));
            }
            match s.api_status() {
                ApiStatus::Online => {}
                ApiStatus::Offline => return Err(AppError::unreachable(OFFLINE_MESSAGE)),
                ApiStatus::Checking => return Err(AppError::invalid_state(CHECKING_MESSAGE)),
            }
            let fields = GenerateFirRequest::from_form(&s.form, s.language());
            Ok(GenerationPayload::build(fields, s.form.evidence_files.clone()))
        })?;

        self.generate(payload, GenerationKind::Submission, permit).await
    }

    /// 生成リクエストの送信と成功 / 失敗の反映（再生成と共通）
    pub(crate) async fn generate(
        &self,
        payload: GenerationPayload,
        kind: GenerationKind,
        permit: GenerationPermit,
    ) -> Result<Arc<FirResult>, AppError> {
        let language = payload.fields().language;
        let fallback_name = payload.fields().name.clone();
        let multipart = payload.is_multipart();

        self.ctx.with_session(|s| s.begin_attempt());
        log::info!(
            "Generating FIR ({kind:?}): encoding={}, evidence_files={}, language={language}",
            if multipart { "multipart" } else { "json" },
            payload.evidence_count()
        );
        self.ctx.emit(SessionEvent::GenerationStarted {
            kind,
            language,
            multipart,
        });

        let outcome = match self.ctx.api.generate_fir(payload).await {
            Ok(response) if response.success => response
                .into_result(&fallback_name, language)
                .map_err(|missing| {
                    log::warn!("generate_fir succeeded but {missing}");
                    AppError::rejected(REJECTED_MESSAGE)
                }),
            Ok(response) => Err(AppError::rejected(
                response.server_error().unwrap_or(REJECTED_MESSAGE),
            )),
            Err(e) => Err(e.into()),
        };

        let outcome = match outcome {
            Ok(result) => {
                let result = self.ctx.with_session(|s| s.on_generation_success(result));
                log::info!("FIR {} ready ({kind:?})", result.id);
                self.ctx.emit(SessionEvent::ResultReady {
                    kind,
                    fir_id: result.id.clone(),
                });
                Ok(result)
            }
            Err(error) => {
                log::warn!("FIR generation failed ({kind:?}): {error}");
                self.ctx
                    .with_session(|s| s.on_generation_failure(error.message.clone()));
                self.ctx.emit(SessionEvent::GenerationFailed {
                    kind,
                    error: error.clone(),
                });
                Err(error)
            }
        };

        drop(permit);
        outcome
    }
}
