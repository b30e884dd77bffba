//! Review listing configuration: where the listing lives and how to read it.

use serde::{Deserialize, Serialize};

/// What the pager does when a listing page has no "next page" control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingNextPage {
    /// Log and keep iterating; remaining iterations re-read the loaded page,
    /// so its reviews are repeated in the output.
    #[default]
    Repeat,
    /// Log and finish the identifier with what was collected so far.
    Stop,
}

impl std::fmt::Display for MissingNextPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repeat => write!(f, "repeat"),
            Self::Stop => write!(f, "stop"),
        }
    }
}

/// CSS selectors for one review and its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewSelectors {
    /// One element per review.
    pub review: String,
    pub author: String,
    pub title: String,
    pub rating: String,
    pub date: String,
    pub body: String,
}

impl Default for ReviewSelectors {
    fn default() -> Self {
        Self {
            review: "div[data-hook='review']".to_string(),
            author: "span.a-profile-name".to_string(),
            title: "a[data-hook='review-title']".to_string(),
            rating: "i[data-hook='review-star-rating']".to_string(),
            date: "span[data-hook='review-date']".to_string(),
            body: "span[data-hook='review-body']".to_string(),
        }
    }
}

impl ReviewSelectors {
    /// Field selectors in record order.
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

/// Placeholder replaced by the (URL-encoded) identifier.
pub const ID_PLACEHOLDER: &str = "{id}";

/// Review listing configuration (`[reviews]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewPageConfig {
    /// Product page URL template containing `{id}`.
    pub listing_url: String,
    /// Visible text of the link leading to the full review listing.
    pub see_more_text: String,
    /// `<select>` holding the star-rating filter.
    pub star_filter_select: String,
    /// Option value chosen in the star-rating filter.
    pub star_filter_value: String,
    /// Pagination control advancing to the next listing page.
    pub next_page: String,
    pub on_missing_next_page: MissingNextPage,
    #[serde(flatten)]
    pub selectors: ReviewSelectors,
}

impl Default for ReviewPageConfig {
    fn default() -> Self {
        Self {
            listing_url: "https://www.amazon.com/exec/obidos/ASIN/{id}".to_string(),
            see_more_text: "See more reviews".to_string(),
            star_filter_select: "#star-count-dropdown".to_string(),
            star_filter_value: "five_star".to_string(),
            next_page: "#cm_cr-pagination_bar > ul > li.a-last > a".to_string(),
            on_missing_next_page: MissingNextPage::default(),
            selectors: ReviewSelectors::default(),
        }
    }
}

impl ReviewPageConfig {
    /// Listing URL for one identifier.
    pub fn listing_url_for(&self, id: &str) -> String {
        self.listing_url
            .replace(ID_PLACEHOLDER, &urlencoding::encode(id))
    }

    /// Check the URL template before any browser work starts.
    pub fn validate(&self) -> Result<(), String> {
        if !self.listing_url.contains(ID_PLACEHOLDER) {
            return Err(format!(
                "listing_url '{}' must contain the {} placeholder",
                self.listing_url, ID_PLACEHOLDER
            ));
        }
        url::Url::parse(&self.listing_url_for("SAMPLE"))
            .map_err(|e| format!("listing_url '{}' is not a valid URL: {}", self.listing_url, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_url_substitutes_identifier() {
        let config = ReviewPageConfig::default();
        assert_eq!(
            config.listing_url_for("B00TEST1"),
            "https://www.amazon.com/exec/obidos/ASIN/B00TEST1"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn listing_url_encodes_identifier() {
        let config = ReviewPageConfig {
            listing_url: "https://shop.example/p/{id}".into(),
            ..Default::default()
        };
        assert_eq!(config.listing_url_for("a b/c"), "https://shop.example/p/a%20b%2Fc");
    }

    #[test]
    fn validate_rejects_missing_placeholder() {
        let config = ReviewPageConfig {
            listing_url: "https://shop.example/p/".into(),
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("{id}"));

        let config = ReviewPageConfig {
            listing_url: "not a url {id}".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn selectors_flatten_into_reviews_table() {
        let config: ReviewPageConfig = toml::from_str(
            r#"
            on_missing_next_page = "stop"
            author = "span.author"
            "#,
        )
        .unwrap();
        assert_eq!(config.on_missing_next_page, MissingNextPage::Stop);
        assert_eq!(config.selectors.author, "span.author");
        assert_eq!(config.selectors.review, ReviewSelectors::default().review);
        assert_eq!(config.star_filter_value, "five_star");
    }
}
