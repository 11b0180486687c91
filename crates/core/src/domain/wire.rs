//! FIRサービスとのワイヤーフォーマット。
//!
//! サーバーは配列フィールドを `null` で返すことや、
//! セクション番号を数値で返すことがある。どちらも寛容に受け取る。

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize};

use super::form::FormState;
use super::types::{
    AnalysisPreview, ConfidenceLevel, ExtractedEntities, FirResult, Language, LegalSection,
};

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

// ─── /health ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

// ─── /analyze_realtime ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRequest {
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreviewPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub persons: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub locations: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub organizations: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub offence_type: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub confidence_level: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub preview: PreviewPayload,
}

impl AnalyzeResponse {
    /// success フラグが立っている場合のみプレビューに変換する
    pub fn into_preview(self) -> Option<AnalysisPreview> {
        if !self.success {
            return None;
        }
        let confidence = self.confidence.unwrap_or(0.0).clamp(0.0, 1.0);
        let confidence_level = self
            .confidence_level
            .as_deref()
            .and_then(ConfidenceLevel::parse)
            .unwrap_or_else(|| ConfidenceLevel::from_score(confidence));

        Some(AnalysisPreview {
            offence_type: self.offence_type.filter(|s| !s.is_empty()),
            confidence,
            confidence_level,
            detected_persons: self.preview.persons.into_iter().collect::<BTreeSet<_>>(),
            detected_locations: self.preview.locations.into_iter().collect(),
            detected_organizations: self.preview.organizations.into_iter().collect(),
        })
    }
}

// ─── /generate_fir ──────────────────────────────────────────────

/// 生成リクエストのスカラーフィールド（JSON / multipart 共通）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateFirRequest {
    pub name: String,
    pub contact: String,
    pub description: String,
    pub witness_name: String,
    pub witness_contact: String,
    pub language: Language,
}

impl GenerateFirRequest {
    pub fn from_form(form: &FormState, language: Language) -> Self {
        Self {
            name: form.name.clone(),
            contact: form.contact.clone(),
            description: form.description.clone(),
            witness_name: form.witness_name.clone(),
            witness_contact: form.witness_contact.clone(),
            language,
        }
    }

    /// multipart 用のフィールド列。名前は JSON のキーと一致させる。
    pub fn scalar_fields(&self) -> [(&'static str, String); 6] {
        [
            ("name", self.name.clone()),
            ("contact", self.contact.clone()),
            ("description", self.description.clone()),
            ("witness_name", self.witness_name.clone()),
            ("witness_contact", self.witness_contact.clone()),
            ("language", self.language.code().to_string()),
        ]
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegalSectionPayload {
    #[serde(default, deserialize_with = "string_or_number")]
    pub section: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntitiesPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub locations: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dates: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub times: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub organizations: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub money: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FirResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub fir_id: Option<String>,
    #[serde(default)]
    pub fir_text: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub offence_type: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub confidence_level: Option<String>,
    #[serde(default, alias = "all_scores", deserialize_with = "null_as_default")]
    pub offence_scores: BTreeMap<String, f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub extracted_persons: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub extracted_entities: EntitiesPayload,
    #[serde(default, deserialize_with = "null_as_default")]
    pub extracted_phone_numbers: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub extracted_emails: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub extracted_aadhar: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub extracted_vehicle_numbers: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub extracted_pan_numbers: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ipc_sections: Vec<LegalSectionPayload>,
    #[serde(default)]
    pub processing_time_seconds: Option<f64>,
}

/// 成功レスポンスに必須フィールドが欠けている
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingField(pub &'static str);

impl std::fmt::Display for MissingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "response is missing `{}`", self.0)
    }
}

impl FirResponse {
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// サーバーが返したエラー文言（空文字は無視）
    pub fn server_error(&self) -> Option<&str> {
        self.error.as_deref().map(str::trim).filter(|e| !e.is_empty())
    }

    /// 成功レスポンスを FirResult に変換する。`fir_id` と `fir_text` は必須。
    pub fn into_result(
        self,
        fallback_name: &str,
        language: Language,
    ) -> Result<FirResult, MissingField> {
        let id = self
            .fir_id
            .filter(|s| !s.trim().is_empty())
            .ok_or(MissingField("fir_id"))?;
        let generated_text = self
            .fir_text
            .filter(|s| !s.trim().is_empty())
            .ok_or(MissingField("fir_text"))?;

        let confidence = self.confidence.unwrap_or(0.0).clamp(0.0, 1.0);
        let confidence_level = self
            .confidence_level
            .as_deref()
            .and_then(ConfidenceLevel::parse)
            .unwrap_or_else(|| ConfidenceLevel::from_score(confidence));

        Ok(FirResult {
            id,
            generated_text,
            complainant_name: self
                .name
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| fallback_name.to_string()),
            date: self.date.unwrap_or_default(),
            time: self.time.unwrap_or_default(),
            location: self.location.unwrap_or_default(),
            offence_type: self.offence_type.unwrap_or_default(),
            confidence,
            confidence_level,
            per_offence_scores: self.offence_scores,
            extracted_persons: self.extracted_persons,
            extracted_entities: ExtractedEntities {
                locations: self.extracted_entities.locations,
                dates: self.extracted_entities.dates,
                times: self.extracted_entities.times,
                organizations: self.extracted_entities.organizations,
                money: self.extracted_entities.money,
            },
            extracted_phone_numbers: self.extracted_phone_numbers,
            extracted_emails: self.extracted_emails,
            extracted_national_ids: self.extracted_aadhar,
            extracted_vehicle_numbers: self.extracted_vehicle_numbers,
            extracted_tax_ids: self.extracted_pan_numbers,
            applicable_legal_sections: self
                .ipc_sections
                .into_iter()
                .map(|s| LegalSection {
                    section_number: s.section,
                    description: s.description,
                })
                .collect(),
            processing_time_seconds: self.processing_time_seconds,
            language,
            received_at: chrono::Utc::now(),
        })
    }
}

// ─── /transcribe_audio ──────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranscribeResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TranscribeResponse {
    /// 成功かつ空でない書き起こしのみ返す
    pub fn transcript(&self) -> Option<&str> {
        if !self.success {
            return None;
        }
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}
