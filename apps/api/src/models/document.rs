use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// A press-release document as edited by the user.
///
/// The core never owns storage: snapshots are handed to it per request and
/// handed back inside proposals or generated text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentSnapshot {
    pub title: String,
    pub introduction: String,
    pub sections: Vec<Section>,
    pub images: Vec<ImageRef>,
    pub contact: Contact,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Section {
    pub heading: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageRef {
    pub url: String,
    pub caption: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Contact {
    pub company_name: String,
    pub person: String,
    pub email: String,
    pub phone: String,
}

impl Section {
    pub fn new(heading: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            content: content.into(),
        }
    }
}

impl DocumentSnapshot {
    /// Sections with non-empty content, excluding the one being edited.
    pub fn other_sections<'a>(&'a self, heading: Option<&'a str>) -> impl Iterator<Item = &'a Section> {
        self.sections.iter().filter(move |s| {
            !s.content.trim().is_empty() && heading.map_or(true, |h| s.heading != h)
        })
    }
}

/// A saved snapshot in the `documents` table.
#[derive(Debug, Clone, FromRow)]
pub struct DocumentRow {
    pub id: Uuid,
    pub body: Json<DocumentSnapshot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// API view of a saved document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDocument {
    pub id: Uuid,
    pub document: DocumentSnapshot,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DocumentRow> for StoredDocument {
    fn from(row: DocumentRow) -> Self {
        Self {
            id: row.id,
            document: row.body.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_deserializes_with_missing_fields() {
        let json = r#"{"title": "新製品発表", "contact": {"companyName": "株式会社テスト"}}"#;
        let doc: DocumentSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(doc.title, "新製品発表");
        assert!(doc.introduction.is_empty());
        assert!(doc.sections.is_empty());
        assert_eq!(doc.contact.company_name, "株式会社テスト");
    }

    #[test]
    fn test_other_sections_skips_edited_and_empty() {
        let doc = DocumentSnapshot {
            sections: vec![
                Section::new("背景", "市場が拡大している"),
                Section::new("特徴", "軽量で丈夫"),
                Section::new("価格", "  "),
            ],
            ..Default::default()
        };
        let headings: Vec<&str> = doc
            .other_sections(Some("特徴"))
            .map(|s| s.heading.as_str())
            .collect();
        assert_eq!(headings, vec!["背景"]);
    }

    #[test]
    fn test_stored_document_unwraps_row_body() {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let row = DocumentRow {
            id,
            body: Json(DocumentSnapshot {
                title: "保存済み".to_string(),
                ..Default::default()
            }),
            created_at: now,
            updated_at: now,
        };
        let stored = StoredDocument::from(row);
        assert_eq!(stored.id, id);
        assert_eq!(stored.document.title, "保存済み");

        let json = serde_json::to_value(&stored).unwrap();
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["document"]["title"], "保存済み");
    }
}
