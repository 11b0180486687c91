use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 表示言語（生成されるFIRの言語）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    En,
    Te,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Te => "te",
        }
    }

    /// 言語スイッチャー: en ⇔ te
    pub fn toggle(self) -> Self {
        match self {
            Self::En => Self::Te,
            Self::Te => Self::En,
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Self::En),
            "te" | "telugu" => Ok(Self::Te),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// バックエンドの状態（ヘルスチェック結果）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiStatus {
    #[default]
    Checking,
    Online,
    Offline,
}

/// 信頼度レベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    /// サーバーがレベルを返さない場合の導出
    pub fn from_score(confidence: f64) -> Self {
        if confidence >= 0.7 {
            Self::High
        } else if confidence >= 0.4 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn parse(level: &str) -> Option<Self> {
        match level.trim().to_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

/// 添付ファイル（証拠ファイル / 音声クリップ共通）
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// バイト列はログに出さない
impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// リアルタイム解析のプレビュー
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AnalysisPreview {
    pub offence_type: Option<String>,
    /// 0.0–1.0
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
    pub detected_persons: BTreeSet<String>,
    pub detected_locations: BTreeSet<String>,
    pub detected_organizations: BTreeSet<String>,
}

/// 適用法令セクション
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalSection {
    pub section_number: String,
    pub description: String,
}

/// 抽出エンティティ
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtractedEntities {
    pub locations: Vec<String>,
    pub dates: Vec<String>,
    pub times: Vec<String>,
    pub organizations: Vec<String>,
    pub money: Vec<String>,
}

/// 生成済みFIR（イミュータブルなスナップショット）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FirResult {
    pub id: String,
    pub generated_text: String,
    pub complainant_name: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub offence_type: String,
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
    pub per_offence_scores: BTreeMap<String, f64>,
    pub extracted_persons: Vec<String>,
    pub extracted_entities: ExtractedEntities,
    pub extracted_phone_numbers: Vec<String>,
    pub extracted_emails: Vec<String>,
    pub extracted_national_ids: Vec<String>,
    pub extracted_vehicle_numbers: Vec<String>,
    pub extracted_tax_ids: Vec<String>,
    pub applicable_legal_sections: Vec<LegalSection>,
    pub processing_time_seconds: Option<f64>,
    pub language: Language,
    pub received_at: chrono::DateTime<chrono::Utc>,
}

/// 結果表示タブ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveTab {
    #[default]
    Document,
    Entities,
    Legal,
}

impl ActiveTab {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Entities => "entities",
            Self::Legal => "legal",
        }
    }
}

impl FromStr for ActiveTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "document" | "fir" => Ok(Self::Document),
            "entities" => Ok(Self::Entities),
            "legal" => Ok(Self::Legal),
            other => Err(format!("unknown tab: {other}")),
        }
    }
}
