//! Category module - the closed set of document kinds

use std::fmt;

/// Kind of document, decided once per document by the classifier
///
/// The set is closed: every classification outcome, including a failed
/// or ambiguous one, maps onto one of these variants.
/// - MeetingMaterial: notices, agendas and minutes of meetings
/// - OfficialDocument: day-to-day administrative documents and letters
/// - PolicyDocument: policies, regulations and their interpretations
/// - Unknown: anything the model could not place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Meeting notices, plans, minutes and arrangements
    MeetingMaterial,

    /// Administrative documents: letters, notices, reports, requests
    OfficialDocument,

    /// Policies, regulations, normative documents and interpretations
    PolicyDocument,

    /// Not classifiable; never extracted or persisted
    Unknown,
}

impl Category {
    /// Every category, Unknown last
    pub const ALL: [Category; 4] = [
        Category::MeetingMaterial,
        Category::OfficialDocument,
        Category::PolicyDocument,
        Category::Unknown,
    ];

    /// Categories that have a schema and a workbook
    pub const KNOWN: [Category; 3] = [
        Category::MeetingMaterial,
        Category::OfficialDocument,
        Category::PolicyDocument,
    ];

    /// Get the category label as it appears in prompts and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::MeetingMaterial => "MeetingMaterial",
            Category::OfficialDocument => "OfficialDocument",
            Category::PolicyDocument => "PolicyDocument",
            Category::Unknown => "Unknown",
        }
    }

    /// Snake-case key used in configuration files
    pub fn config_key(&self) -> &'static str {
        match self {
            Category::MeetingMaterial => "meeting_material",
            Category::OfficialDocument => "official_document",
            Category::PolicyDocument => "policy_document",
            Category::Unknown => "unknown",
        }
    }

    /// Default description offered to the model when classifying
    pub fn description(&self) -> &'static str {
        match self {
            Category::MeetingMaterial => {
                "Documents whose core purpose is to organise, announce or record a meeting: \
                 meeting notices (time, place, attendees), meeting plans and agendas, \
                 meeting minutes and meeting arrangements."
            }
            Category::OfficialDocument => {
                "Day-to-day administrative documents not about organising a meeting: letters (函), \
                 general notices, reports, requests, replies, opinions, circulars, decisions, \
                 work summaries, work plans, research reports and work exchanges."
            }
            Category::PolicyDocument => {
                "Policy and regulatory documents: policy provisions and opinions, laws and \
                 regulations, administrative normative documents, and policy interpretations."
            }
            Category::Unknown => "None of the above.",
        }
    }

    /// Whether documents of this category go through extraction
    pub fn is_known(&self) -> bool {
        !matches!(self, Category::Unknown)
    }

    /// Parse a label, trimmed and case-insensitive
    ///
    /// Accepts both the label (`PolicyDocument`) and the config key
    /// (`policy_document`). Returns `None` for anything else.
    pub fn parse(s: &str) -> Option<Self> {
        let needle = s.trim();
        Category::ALL.into_iter().find(|category| {
            category.as_str().eq_ignore_ascii_case(needle)
                || category.config_key().eq_ignore_ascii_case(needle)
        })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid category: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_labels() {
        assert_eq!(Category::parse("PolicyDocument"), Some(Category::PolicyDocument));
        assert_eq!(Category::parse("  meetingmaterial \n"), Some(Category::MeetingMaterial));
        assert_eq!(Category::parse("OFFICIALDOCUMENT"), Some(Category::OfficialDocument));
        assert_eq!(Category::parse("policy_document"), Some(Category::PolicyDocument));
        assert_eq!(Category::parse("unknown"), Some(Category::Unknown));
    }

    #[test]
    fn test_parse_rejects_near_misses() {
        assert_eq!(Category::parse("Policy Document"), None);
        assert_eq!(Category::parse("PolicyDocument."), None);
        assert_eq!(Category::parse("3"), None);
        assert_eq!(Category::parse(""), None);
    }

    #[test]
    fn test_known_excludes_unknown() {
        assert!(Category::KNOWN.iter().all(|c| c.is_known()));
        assert!(!Category::Unknown.is_known());
    }

    #[test]
    fn test_display_round_trip() {
        for category in Category::ALL {
            let parsed: Category = category.to_string().parse().unwrap();
            assert_eq!(parsed, category);
        }
    }

    proptest! {
        #[test]
        fn parse_never_invents_a_label(s in ".*") {
            if let Some(category) = Category::parse(&s) {
                let trimmed = s.trim();
                prop_assert!(
                    category.as_str().eq_ignore_ascii_case(trimmed)
                        || category.config_key().eq_ignore_ascii_case(trimmed)
                );
            }
        }
    }
}
