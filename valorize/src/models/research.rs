use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Patent,
    Publication,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Patent => write!(f, "patent"),
            Self::Publication => write!(f, "publication"),
        }
    }
}

impl std::str::FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "patent" => Ok(Self::Patent),
            "publication" => Ok(Self::Publication),
            _ => Err(format!("Unknown research item kind: {s}")),
        }
    }
}

/// One scored prior-art document in its normalized form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResearchItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub title: String,
    pub authors_or_assignee: Vec<String>,
    pub year: i32,
    pub date: String,
    /// 0–100, higher means more overlap with the submission.
    pub similarity: u8,
    pub similarities: Vec<String>,
    pub differences: Vec<String>,
    /// Patents only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_warning: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_kind_from_str() {
        assert_eq!("patent".parse::<ItemKind>(), Ok(ItemKind::Patent));
        assert_eq!(" Publication ".parse::<ItemKind>(), Ok(ItemKind::Publication));
        assert!("thesis".parse::<ItemKind>().is_err());
    }

    #[test]
    fn test_research_item_uses_persisted_field_names() {
        let item = ResearchItem {
            id: "US123".to_string(),
            kind: ItemKind::Patent,
            title: "Battery anode".to_string(),
            authors_or_assignee: vec!["Acme Corp".to_string()],
            year: 2021,
            date: "2021-03-04".to_string(),
            similarity: 72,
            similarities: vec![],
            differences: vec![],
            license_warning: Some(true),
            venue: None,
            jurisdiction: Some("US".to_string()),
            citation_count: None,
            url: None,
        };

        let json = serde_json::to_value(&item).expect("Failed to serialize");
        assert_eq!(json["type"], "patent");
        assert_eq!(json["authorsOrAssignee"][0], "Acme Corp");
        assert_eq!(json["licenseWarning"], true);
        assert!(json.get("venue").is_none());
        assert!(json.get("citationCount").is_none());
    }
}
