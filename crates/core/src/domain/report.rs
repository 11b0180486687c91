//! FirResult に対する読み取り専用ビュー（ドキュメント / エンティティ / 法令）。

use serde::Serialize;

use super::types::{ActiveTab, FirResult, LegalSection};

pub const LEGAL_DISCLAIMER: &str =
    "These are AI-suggested sections. Final determination should be made by legal authorities.";
pub const NO_ENTITIES_MESSAGE: &str = "No specific entities were extracted from the description.";
pub const NO_SECTIONS_MESSAGE: &str = "No applicable legal sections identified.";

/// エンティティのカテゴリ（表示順）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    Persons,
    Locations,
    DatesAndTimes,
    PhoneNumbers,
    Emails,
    NationalIds,
    VehicleNumbers,
    TaxIds,
    Organizations,
    Money,
}

impl EntityCategory {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Persons => "Persons Mentioned",
            Self::Locations => "Locations",
            Self::DatesAndTimes => "Dates & Times",
            Self::PhoneNumbers => "Phone Numbers",
            Self::Emails => "Email Addresses",
            Self::NationalIds => "Aadhaar Numbers",
            Self::VehicleNumbers => "Vehicle Numbers",
            Self::TaxIds => "PAN Numbers",
            Self::Organizations => "Organizations",
            Self::Money => "Monetary Amounts",
        }
    }

    /// 識別子系は等幅で表示する
    pub fn monospace(&self) -> bool {
        matches!(
            self,
            Self::PhoneNumbers | Self::Emails | Self::NationalIds | Self::VehicleNumbers | Self::TaxIds
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityGroup {
    pub category: EntityCategory,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EntitiesView {
    Empty,
    Groups { groups: Vec<EntityGroup> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LegalView {
    Empty,
    Sections {
        offence_type: String,
        sections: Vec<LegalSection>,
        disclaimer: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentView {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "tab", rename_all = "snake_case")]
pub enum TabView {
    Document(DocumentView),
    Entities(EntitiesView),
    Legal(LegalView),
}

/// 結果サマリーカード
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSummary {
    pub fir_id: String,
    pub offence_type: String,
    pub confidence_percent: u8,
    pub date: String,
    pub time: String,
    pub location: String,
    pub persons: String,
    pub processing_time: String,
}

pub fn document_view(result: &FirResult) -> DocumentView {
    DocumentView {
        id: result.id.clone(),
        text: result.generated_text.clone(),
    }
}

pub fn entities_view(result: &FirResult) -> EntitiesView {
    let entities = &result.extracted_entities;
    let mut dates_and_times = entities.dates.clone();
    dates_and_times.extend(entities.times.iter().cloned());

    let candidates = [
        (EntityCategory::Persons, result.extracted_persons.clone()),
        (EntityCategory::Locations, entities.locations.clone()),
        (EntityCategory::DatesAndTimes, dates_and_times),
        (EntityCategory::PhoneNumbers, result.extracted_phone_numbers.clone()),
        (EntityCategory::Emails, result.extracted_emails.clone()),
        (EntityCategory::NationalIds, result.extracted_national_ids.clone()),
        (EntityCategory::VehicleNumbers, result.extracted_vehicle_numbers.clone()),
        (EntityCategory::TaxIds, result.extracted_tax_ids.clone()),
        (EntityCategory::Organizations, entities.organizations.clone()),
        (EntityCategory::Money, entities.money.clone()),
    ];

    let groups: Vec<EntityGroup> = candidates
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(category, values)| EntityGroup { category, values })
        .collect();

    if groups.is_empty() {
        EntitiesView::Empty
    } else {
        EntitiesView::Groups { groups }
    }
}

pub fn legal_view(result: &FirResult) -> LegalView {
    if result.applicable_legal_sections.is_empty() {
        return LegalView::Empty;
    }
    LegalView::Sections {
        offence_type: result.offence_type.clone(),
        sections: result.applicable_legal_sections.clone(),
        disclaimer: LEGAL_DISCLAIMER,
    }
}

pub fn render_tab(result: &FirResult, tab: ActiveTab) -> TabView {
    match tab {
        ActiveTab::Document => TabView::Document(document_view(result)),
        ActiveTab::Entities => TabView::Entities(entities_view(result)),
        ActiveTab::Legal => TabView::Legal(legal_view(result)),
    }
}

pub fn summary(result: &FirResult) -> ResultSummary {
    ResultSummary {
        fir_id: result.id.clone(),
        offence_type: result.offence_type.clone(),
        confidence_percent: (result.confidence * 100.0).round() as u8,
        date: result.date.clone(),
        time: result.time.clone(),
        location: result.location.clone(),
        persons: format!("{} found", result.extracted_persons.len()),
        processing_time: result
            .processing_time_seconds
            .map(|s| format!("{s:.2}s"))
            .unwrap_or_else(|| "N/A".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::tests::sample_result;

    #[test]
    fn test_entities_empty_state() {
        let result = sample_result("FIR001");
        assert_eq!(entities_view(&result), EntitiesView::Empty);
    }

    #[test]
    fn test_entities_grouping_order() {
        let mut result = sample_result("FIR001");
        result.extracted_persons = vec!["Ravi".into()];
        result.extracted_entities.money = vec!["Rs. 15,000".into()];
        result.extracted_entities.times = vec!["9:30 PM".into()];
        result.extracted_entities.dates = vec!["14 January".into()];
        result.extracted_vehicle_numbers = vec!["TS09AB1234".into()];

        let EntitiesView::Groups { groups } = entities_view(&result) else {
            panic!("expected groups");
        };
        let categories: Vec<_> = groups.iter().map(|g| g.category).collect();
        assert_eq!(
            categories,
            [
                EntityCategory::Persons,
                EntityCategory::DatesAndTimes,
                EntityCategory::VehicleNumbers,
                EntityCategory::Money,
            ]
        );
        assert_eq!(groups[1].values, ["14 January", "9:30 PM"]);
        assert!(groups[2].category.monospace());
    }

    #[test]
    fn test_dates_only_is_not_empty() {
        let mut result = sample_result("FIR001");
        result.extracted_entities.dates = vec!["yesterday".into()];
        assert_ne!(entities_view(&result), EntitiesView::Empty);
    }

    #[test]
    fn test_legal_view_states() {
        let mut result = sample_result("FIR001");
        assert_eq!(legal_view(&result), LegalView::Empty);

        result.applicable_legal_sections = vec![LegalSection {
            section_number: "379".into(),
            description: "Punishment for theft".into(),
        }];
        match legal_view(&result) {
            LegalView::Sections {
                offence_type,
                sections,
                disclaimer,
            } => {
                assert_eq!(offence_type, "Theft");
                assert_eq!(sections.len(), 1);
                assert_eq!(disclaimer, LEGAL_DISCLAIMER);
            }
            LegalView::Empty => panic!("expected sections"),
        }
    }

    #[test]
    fn test_summary_formatting() {
        let mut result = sample_result("FIR001");
        result.extracted_persons = vec!["A".into(), "B".into()];
        let s = summary(&result);
        assert_eq!(s.persons, "2 found");
        assert_eq!(s.processing_time, "1.25s");
        assert_eq!(s.confidence_percent, 92);

        result.processing_time_seconds = None;
        assert_eq!(summary(&result).processing_time, "N/A");
    }

    #[test]
    fn test_render_tab_matches_selection() {
        let result = sample_result("FIR001");
        assert!(matches!(render_tab(&result, ActiveTab::Document), TabView::Document(_)));
        assert!(matches!(render_tab(&result, ActiveTab::Entities), TabView::Entities(_)));
        assert!(matches!(render_tab(&result, ActiveTab::Legal), TabView::Legal(_)));
    }
}
