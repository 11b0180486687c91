use std::sync::Arc;

use serde::Serialize;

use super::form::FormState;
use super::types::{ActiveTab, AnalysisPreview, ApiStatus, FirResult, Language};

/// UIセッションが所有する状態。全コンポーネントがこれを共有する。
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: String,
    pub form: FormState,
    language: Language,
    api_status: ApiStatus,
    preview: Option<AnalysisPreview>,
    result: Option<Arc<FirResult>>,
    active_tab: ActiveTab,
    error: Option<String>,
    copied: bool,
    pub created_at: String,
}

/// エラー / 結果表示用のスナップショット
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub language: Language,
    pub api_status: ApiStatus,
    pub has_preview: bool,
    pub result_id: Option<String>,
    pub active_tab: ActiveTab,
    pub error: Option<String>,
    pub copied: bool,
    /// 説明文の文字数（入力欄の下の表示）
    pub description_chars: usize,
    /// クリアボタンを出すか
    pub has_content: bool,
    /// 解析の予約または送信中
    pub analysis_pending: bool,
}

impl Session {
    pub fn new(session_id: String, language: Language, now: String) -> Self {
        Self {
            session_id,
            form: FormState::new(),
            language,
            api_status: ApiStatus::Checking,
            preview: None,
            result: None,
            active_tab: ActiveTab::Document,
            error: None,
            copied: false,
            created_at: now,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// 言語を更新し、変化があったかを返す
    pub fn set_language(&mut self, language: Language) -> bool {
        let changed = self.language != language;
        self.language = language;
        changed
    }

    pub fn api_status(&self) -> ApiStatus {
        self.api_status
    }

    pub fn set_api_status(&mut self, status: ApiStatus) {
        self.api_status = status;
    }

    pub fn preview(&self) -> Option<&AnalysisPreview> {
        self.preview.as_ref()
    }

    pub fn set_preview(&mut self, preview: AnalysisPreview) {
        self.preview = Some(preview);
    }

    /// プレビューを破棄し、存在していたかを返す
    pub fn clear_preview(&mut self) -> bool {
        self.preview.take().is_some()
    }

    pub fn result(&self) -> Option<Arc<FirResult>> {
        self.result.clone()
    }

    pub fn has_result(&self) -> bool {
        self.result.is_some()
    }

    pub fn active_tab(&self) -> ActiveTab {
        self.active_tab
    }

    pub fn select_tab(&mut self, tab: ActiveTab) {
        self.active_tab = tab;
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn copied(&self) -> bool {
        self.copied
    }

    pub fn set_copied(&mut self, copied: bool) {
        self.copied = copied;
    }

    /// 生成開始: エラーバナーとコピー確認を消す（既存結果は保持）
    pub fn begin_attempt(&mut self) {
        self.error = None;
        self.copied = false;
    }

    /// 生成成功: 結果を丸ごと差し替え、タブを document に戻す
    pub fn on_generation_success(&mut self, result: FirResult) -> Arc<FirResult> {
        let result = Arc::new(result);
        self.result = Some(result.clone());
        self.active_tab = ActiveTab::Document;
        self.error = None;
        result
    }

    /// 生成失敗: 既存の結果とタブには触れない
    pub fn on_generation_failure(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// 明示的なリセット（フォーム・結果・エラー・プレビュー）
    pub fn reset(&mut self) {
        self.form.clear();
        self.preview = None;
        self.result = None;
        self.active_tab = ActiveTab::Document;
        self.error = None;
        self.copied = false;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            language: self.language,
            api_status: self.api_status,
            has_preview: self.preview.is_some(),
            result_id: self.result.as_ref().map(|r| r.id.clone()),
            active_tab: self.active_tab,
            error: self.error.clone(),
            copied: self.copied,
            description_chars: self.form.description_len(),
            has_content: self.form.has_content(),
            analysis_pending: false,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::types::{ConfidenceLevel, ExtractedEntities};

    fn now() -> String {
        "2025-01-15T10:30:00Z".to_string()
    }

    pub(crate) fn sample_result(id: &str) -> FirResult {
        FirResult {
            id: id.to_string(),
            generated_text: format!("FIRST INFORMATION REPORT {id}"),
            complainant_name: "Ravi Kumar".to_string(),
            date: "2025-01-14".to_string(),
            time: "21:30".to_string(),
            location: "Ameerpet".to_string(),
            offence_type: "Theft".to_string(),
            confidence: 0.92,
            confidence_level: ConfidenceLevel::High,
            per_offence_scores: Default::default(),
            extracted_persons: vec![],
            extracted_entities: ExtractedEntities::default(),
            extracted_phone_numbers: vec![],
            extracted_emails: vec![],
            extracted_national_ids: vec![],
            extracted_vehicle_numbers: vec![],
            extracted_tax_ids: vec![],
            applicable_legal_sections: vec![],
            processing_time_seconds: Some(1.25),
            language: Language::En,
            received_at: chrono::Utc::now(),
        }
    }

    fn setup_session() -> Session {
        Session::new("test-session".to_string(), Language::En, now())
    }

    #[test]
    fn test_new_session_is_checking() {
        let session = setup_session();
        assert_eq!(session.api_status(), ApiStatus::Checking);
        assert!(!session.has_result());
        assert_eq!(session.active_tab(), ActiveTab::Document);
    }

    #[test]
    fn test_success_resets_tab_and_error() {
        let mut session = setup_session();
        session.select_tab(ActiveTab::Legal);
        session.set_error("old error");
        session.on_generation_success(sample_result("FIR001"));
        assert_eq!(session.active_tab(), ActiveTab::Document);
        assert!(session.error().is_none());
        assert_eq!(session.result().unwrap().id, "FIR001");
    }

    #[test]
    fn test_failure_preserves_result_and_tab() {
        let mut session = setup_session();
        session.on_generation_success(sample_result("FIR001"));
        session.select_tab(ActiveTab::Entities);
        session.on_generation_failure("Description too vague");
        assert_eq!(session.result().unwrap().id, "FIR001");
        assert_eq!(session.active_tab(), ActiveTab::Entities);
        assert_eq!(session.error(), Some("Description too vague"));
    }

    #[test]
    fn test_success_replaces_not_merges() {
        let mut session = setup_session();
        let first = session.on_generation_success(sample_result("FIR001"));
        let second = session.on_generation_success(sample_result("FIR002"));
        assert_eq!(first.id, "FIR001");
        assert_eq!(second.id, "FIR002");
        assert!(!Arc::ptr_eq(&first, &session.result().unwrap()));
    }

    #[test]
    fn test_begin_attempt_clears_banner_only() {
        let mut session = setup_session();
        session.on_generation_success(sample_result("FIR001"));
        session.set_error("boom");
        session.set_copied(true);
        session.begin_attempt();
        assert!(session.error().is_none());
        assert!(!session.copied());
        assert!(session.has_result());
    }

    #[test]
    fn test_reset_keeps_language_and_status() {
        let mut session = setup_session();
        session.set_language(Language::Te);
        session.set_api_status(ApiStatus::Online);
        session.form.description = "something happened".to_string();
        session.on_generation_success(sample_result("FIR001"));
        session.reset();
        assert!(!session.has_result());
        assert!(session.form.description.is_empty());
        assert_eq!(session.language(), Language::Te);
        assert_eq!(session.api_status(), ApiStatus::Online);
    }

    #[test]
    fn test_set_language_reports_change() {
        let mut session = setup_session();
        assert!(!session.set_language(Language::En));
        assert!(session.set_language(Language::Te));
    }
}
