//! Review records and the identifiers they are collected for.

use serde::{Deserialize, Serialize};

/// One review extracted from a listing page.
///
/// Every field is single-line plain text without double quotes. A field whose
/// element was not rendered for a review is the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub author: String,
    #[serde(rename = "reviewTitle", alias = "title")]
    pub title: String,
    #[serde(rename = "reviewRating", alias = "rating")]
    pub rating: String,
    #[serde(rename = "reviewDate", alias = "date")]
    pub date: String,
    #[serde(rename = "reviewText", alias = "body")]
    pub body: String,
}

impl ReviewRecord {
    /// Fields in output column order.
    pub fn fields(&self) -> [&str; 5] {
        [
            self.author.as_str(),
            self.title.as_str(),
            self.rating.as_str(),
            self.date.as_str(),
            self.body.as_str(),
        ]
    }
}

/// A product identifier to collect reviews for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierTarget {
    /// Catalog identifier (an ASIN for the default storefront).
    #[serde(alias = "asin")]
    pub id: String,

    /// Number of listing pages to walk, overriding the global parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
}

impl IdentifierTarget {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pages: None,
        }
    }

    /// Pages to walk for this target given the global default.
    pub fn pages_or(&self, default_pages: u32) -> u32 {
        self.pages.unwrap_or(default_pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_accepts_asin_key() {
        let target: IdentifierTarget = serde_json::from_str(r#"{"asin": "B00TEST1"}"#).unwrap();
        assert_eq!(target.id, "B00TEST1");
        assert_eq!(target.pages, None);
        assert_eq!(target.pages_or(3), 3);
    }

    #[test]
    fn target_page_override_wins() {
        let target: IdentifierTarget =
            serde_json::from_str(r#"{"id": "B00TEST2", "pages": 7}"#).unwrap();
        assert_eq!(target.pages_or(3), 7);
    }

    #[test]
    fn record_json_uses_listing_field_names() {
        let record = ReviewRecord {
            author: "Alice".into(),
            title: "Great".into(),
            rating: "5.0".into(),
            date: "Jan 1, 2024".into(),
            body: "Loved it".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["reviewTitle"], "Great");
        assert_eq!(json["reviewText"], "Loved it");
        assert_eq!(record.fields()[0], "Alice");
    }
}
