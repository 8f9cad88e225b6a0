//! Checklist catalog: the fixed set of items a verification answers.
//!
//! Items are seeded by migration and read-only at runtime. Selection rules
//! (applicability, category, active flag, ordering) live here so every store
//! implementation filters the same way.

use serde::{Deserialize, Serialize};

use crate::codes::define_code_enum;
use crate::types::{Amount, DbId, Timestamp};
use crate::verification::SourceType;

define_code_enum! {
    /// Grouping used by the checklist UI.
    CheckCategory {
        Document = "DOCUMENT",
        Safety = "SAFETY",
        Equipment = "EQUIPMENT",
        Lighting = "LIGHTING",
        Visibility = "VISIBILITY",
        Identification = "IDENTIFICATION",
        Environment = "ENVIRONMENT",
    }
}

define_code_enum! {
    /// Which kind of source an item may be answered for.
    Applicability {
        Inspection = "INSPECTION",
        Control = "CONTROL",
        Both = "BOTH",
    }
}

impl Applicability {
    /// `BOTH` matches either source type; the others match only their own.
    pub fn allows(self, source_type: SourceType) -> bool {
        matches!(
            (self, source_type),
            (Applicability::Both, _)
                | (Applicability::Control, SourceType::Control)
                | (Applicability::Inspection, SourceType::Inspection)
        )
    }
}

/// One checklist question, e.g. "insurance certificate valid?".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckItem {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category: CheckCategory,
    pub applicable_to: Applicability,
    pub mandatory: bool,
    pub active: bool,
    pub display_order: i32,
    pub default_fine: Amount,
    pub default_points: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Filter for [`crate::store::CatalogStore::list_check_items`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckItemFilter {
    pub applicable_to: Option<SourceType>,
    pub category: Option<CheckCategory>,
    #[serde(default)]
    pub active_only: bool,
}

impl CheckItemFilter {
    pub fn matches(&self, item: &CheckItem) -> bool {
        if let Some(source_type) = self.applicable_to {
            if !item.applicable_to.allows(source_type) {
                return false;
            }
        }
        if let Some(category) = self.category {
            if item.category != category {
                return false;
            }
        }
        !self.active_only || item.active
    }
}

/// Catalog ordering: display order ascending, code as tie-break.
pub fn sort_check_items(items: &mut [CheckItem]) {
    items.sort_by(|a, b| {
        a.display_order
            .cmp(&b.display_order)
            .then_with(|| a.code.cmp(&b.code))
    });
}

#[cfg(test)]
pub(crate) fn sample_item(id: DbId, code: &str, applicable_to: Applicability) -> CheckItem {
    let at = chrono::DateTime::UNIX_EPOCH;
    CheckItem {
        id,
        code: code.to_string(),
        name: code.to_lowercase(),
        description: None,
        category: CheckCategory::Document,
        applicable_to,
        mandatory: false,
        active: true,
        display_order: id as i32,
        default_fine: 5000,
        default_points: 1,
        created_at: at,
        updated_at: at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_is_selectable_for_either_source() {
        assert!(Applicability::Both.allows(SourceType::Control));
        assert!(Applicability::Both.allows(SourceType::Inspection));
        assert!(Applicability::Control.allows(SourceType::Control));
        assert!(!Applicability::Control.allows(SourceType::Inspection));
        assert!(!Applicability::Inspection.allows(SourceType::Control));
    }

    #[test]
    fn filter_applies_every_criterion() {
        let mut lights = sample_item(1, "FEUX", Applicability::Inspection);
        lights.category = CheckCategory::Lighting;
        let mut retired = sample_item(2, "VIGNETTE", Applicability::Both);
        retired.active = false;
        let insurance = sample_item(3, "ASSURANCE", Applicability::Control);

        let filter = CheckItemFilter {
            applicable_to: Some(SourceType::Control),
            category: None,
            active_only: true,
        };
        assert!(!filter.matches(&lights));
        assert!(!filter.matches(&retired));
        assert!(filter.matches(&insurance));

        let by_category = CheckItemFilter {
            category: Some(CheckCategory::Lighting),
            ..Default::default()
        };
        assert!(by_category.matches(&lights));
        assert!(!by_category.matches(&insurance));
    }

    #[test]
    fn sort_orders_by_display_order_then_code() {
        let mut b = sample_item(1, "B", Applicability::Both);
        b.display_order = 2;
        let mut a = sample_item(2, "A", Applicability::Both);
        a.display_order = 2;
        let mut first = sample_item(3, "Z", Applicability::Both);
        first.display_order = 1;

        let mut items = vec![b, a, first];
        sort_check_items(&mut items);
        let codes: Vec<_> = items.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, ["Z", "A", "B"]);
    }

    #[test]
    fn category_codes_round_trip_through_parse() {
        assert_eq!(CheckCategory::parse("SAFETY"), Some(CheckCategory::Safety));
        assert_eq!(CheckCategory::parse("safety"), None);
        assert!("BOGUS".parse::<Applicability>().is_err());
    }
}
