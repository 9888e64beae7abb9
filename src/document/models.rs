use crate::error::DocuploadError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use std::{fmt::Display, str::FromStr};

/// Coarse document category, persisted as its discriminant.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i16)]
pub enum DocumentType {
    #[default]
    Unknown = 0,
    Text = 1,
    Image = 2,
    #[serde(rename = "PDF", alias = "Pdf")]
    Pdf = 3,
}

impl DocumentType {
    /// Name used in generated fallback descriptions.
    pub fn name(&self) -> &'static str {
        match self {
            DocumentType::Unknown => "Unknown",
            DocumentType::Text => "Text",
            DocumentType::Image => "Image",
            DocumentType::Pdf => "PDF",
        }
    }
}

impl From<i16> for DocumentType {
    fn from(value: i16) -> Self {
        match value {
            1 => DocumentType::Text,
            2 => DocumentType::Image,
            3 => DocumentType::Pdf,
            _ => DocumentType::Unknown,
        }
    }
}

impl From<DocumentType> for i16 {
    fn from(value: DocumentType) -> Self {
        value as i16
    }
}

impl Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for DocumentType {
    type Err = DocuploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unknown" | "0" => Ok(DocumentType::Unknown),
            "text" | "1" => Ok(DocumentType::Text),
            "image" | "2" => Ok(DocumentType::Image),
            "pdf" | "3" => Ok(DocumentType::Pdf),
            _ => Err(DocuploadError::InvalidArgument(format!(
                "unknown document type '{s}'"
            ))),
        }
    }
}

/// Database model for the `documents` table. Content lives in
/// `document_content` and is never loaded with the metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(rename = "documentId")]
    pub id: i64,
    pub file_name: String,
    pub title: String,
    pub description: String,
    pub file_size: i64,
    pub create_date: DateTime<Utc>,
    pub owner: String,
    pub document_type: DocumentType,
}

impl<'r> FromRow<'r, PgRow> for Document {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            file_name: row.try_get("file_name")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            file_size: row.try_get("file_size")?,
            create_date: row.try_get("create_date")?,
            owner: row.try_get("owner")?,
            document_type: DocumentType::from(row.try_get::<i16, _>("document_type")?),
        })
    }
}

/// Insert payload. The id and creation date are assigned by the store.
#[derive(Debug, Default, Clone)]
pub struct NewDocument {
    pub file_name: String,
    pub title: String,
    /// Generated from the content when blank
    pub description: String,
    pub file_size: i64,
    pub owner: String,
    pub document_type: DocumentType,
}

#[derive(Debug, Default, Clone)]
pub struct SearchParameters {
    /// 1-based
    pub page: Option<i32>,
    pub page_size: Option<i32>,
    pub document_types: Vec<DocumentType>,
}

#[derive(Debug, Default, Clone)]
pub struct DocumentPage {
    /// Count of all documents matching the filter, regardless of paging
    pub total: i64,
    pub documents: Vec<Document>,
}

impl DocumentPage {
    pub fn returned(&self) -> usize {
        self.documents.len()
    }
}
