//! Field extraction from one review fragment.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::ReviewSelectors;
use crate::models::ReviewRecord;
use crate::session::Fragment;

/// Star-rating phrase the storefront renders inside the title link.
static RATING_PHRASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d\.0 out of 5 stars").unwrap());

/// Build a record from one review fragment.
///
/// Missing sub-elements produce empty fields.
pub fn extract_review(fragment: &impl Fragment, selectors: &ReviewSelectors) -> ReviewRecord {
    let text = |selector: &str| fragment.text_content(selector).unwrap_or("");

    let record = ReviewRecord {
        author: clean_text(text(&selectors.author)),
        title: clean_title(text(&selectors.title)),
        rating: clean_text(text(&selectors.rating)),
        date: clean_text(text(&selectors.date)),
        body: clean_text(text(&selectors.body)),
    };

    if tracing::enabled!(tracing::Level::DEBUG) {
        match serde_json::to_string(&record) {
            Ok(json) => tracing::debug!("Extracted review: {}", json),
            Err(e) => tracing::debug!("Extracted review (unserializable: {})", e),
        }
    }

    record
}

fn strip_newlines(raw: &str) -> String {
    raw.chars().filter(|c| *c != '\n' && *c != '\r').collect()
}

/// Newlines, double quotes and the rendered star-rating phrase removed, then trimmed.
pub fn clean_title(raw: &str) -> String {
    let mut title = strip_newlines(raw).replace('"', "");
    // Removing one phrase can join digits and text into a new one
    while RATING_PHRASE.is_match(&title) {
        title = RATING_PHRASE.replace_all(&title, "").into_owned();
    }
    title.trim().to_string()
}

/// Author, rating, date and body: newlines and double quotes removed, then trimmed.
pub fn clean_text(raw: &str) -> String {
    strip_newlines(raw).replace('"', "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::FragmentSnapshot;

    fn full_fragment(selectors: &ReviewSelectors) -> FragmentSnapshot {
        FragmentSnapshot::new()
            .with(&selectors.author, "\n  Alice  \n")
            .with(&selectors.title, "\n5.0 out of 5 stars\n\"Great\" product\n")
            .with(&selectors.rating, "5.0 out of 5 stars")
            .with(&selectors.date, " Reviewed in the United States on January 1, 2024 ")
            .with(&selectors.body, "\nLoved \"it\".\r\nWould buy again.\n")
    }

    #[test]
    fn extracts_and_cleans_all_fields() {
        let selectors = ReviewSelectors::default();
        let record = extract_review(&full_fragment(&selectors), &selectors);

        assert_eq!(record.author, "Alice");
        assert_eq!(record.title, "Great product");
        assert_eq!(record.rating, "5.0 out of 5 stars");
        assert_eq!(
            record.date,
            "Reviewed in the United States on January 1, 2024"
        );
        assert_eq!(record.body, "Loved it.Would buy again.");
    }

    #[test]
    fn absent_elements_yield_empty_fields() {
        let selectors = ReviewSelectors::default();
        let record = extract_review(&FragmentSnapshot::new(), &selectors);
        assert_eq!(record, ReviewRecord::default());

        // Only the body present
        let fragment = FragmentSnapshot::new().with(&selectors.body, "Just text");
        let record = extract_review(&fragment, &selectors);
        assert_eq!(record.author, "");
        assert_eq!(record.title, "");
        assert_eq!(record.rating, "");
        assert_eq!(record.date, "");
        assert_eq!(record.body, "Just text");
    }

    #[test]
    fn author_loses_quotes() {
        let selectors = ReviewSelectors::default();
        let fragment = FragmentSnapshot::new().with(&selectors.author, " \"Bob\"\n");
        assert_eq!(extract_review(&fragment, &selectors).author, "Bob");
    }

    #[test]
    fn title_cleanup_is_idempotent() {
        let inputs = [
            "5.0 out of 5 stars Works",
            "4.0 out of 5 stars\n\"Nice\"",
            "45.0 out of 5 stars out of 5 stars",
            "5 out of 5 stars",
            "5.05.0 out of 5 stars out of 5 stars",
            "  plain  ",
            "",
        ];
        for input in inputs {
            let once = clean_title(input);
            assert_eq!(clean_title(&once), once, "input {:?}", input);
            assert!(!RATING_PHRASE.is_match(&once), "input {:?}", input);
        }
    }

    #[test]
    fn title_removes_every_rating_phrase() {
        assert_eq!(clean_title("5.0 out of 5 stars A 3.0 out of 5 stars B"), "A  B");
    }

    #[test]
    fn title_keeps_customer_written_ratings() {
        assert_eq!(
            clean_title("5.0 out of 5 stars\nHonestly 5 out of 5 stars!"),
            "Honestly 5 out of 5 stars!"
        );
        assert_eq!(
            clean_title("5.0 out of 5 stars I'd give it 10 out of 5 stars if I could"),
            "I'd give it 10 out of 5 stars if I could"
        );
        assert_eq!(clean_title("4.5 out of 5 stars"), "4.5 out of 5 stars");
    }

    #[test]
    fn custom_selectors_are_honored() {
        let selectors = ReviewSelectors {
            author: ".who".into(),
            ..Default::default()
        };
        let fragment = FragmentSnapshot::new().with(".who", "Carol");
        assert_eq!(extract_review(&fragment, &selectors).author, "Carol");
    }
}
