//! In-page scripts and XPath helpers used by the Chrome session.

use serde_json::Value;

/// JavaScript string literal for `s`.
fn js_string(s: &str) -> String {
    Value::from(s).to_string()
}

/// Set a `<select>` to `value` and fire the events a user change would.
/// Evaluates to `false` when no element matches `selector`.
pub fn select_option(selector: &str, value: &str) -> String {
    format!(
        r#"(() => {{
    const el = document.querySelector({selector});
    if (!el) return false;
    el.value = {value};
    el.dispatchEvent(new Event('input', {{ bubbles: true }}));
    el.dispatchEvent(new Event('change', {{ bubbles: true }}));
    return true;
}})()"#,
        selector = js_string(selector),
        value = js_string(value),
    )
}

/// For every element matching `selector`, map each of `fields` that has a
/// matching descendant to that descendant's `textContent`.
pub fn query_fragments(selector: &str, fields: &[&str]) -> String {
    let fields = Value::from(fields.to_vec()).to_string();
    format!(
        r#"(() => Array.from(document.querySelectorAll({selector})).map((el) => {{
    const out = {{}};
    for (const field of {fields}) {{
        const found = el.querySelector(field);
        if (found) out[field] = found.textContent || '';
    }}
    return out;
}}))()"#,
        selector = js_string(selector),
        fields = fields,
    )
}

/// XPath matching elements whose own text contains `text`.
pub fn text_xpath(text: &str) -> String {
    format!("//*[text()[contains(., {})]]", xpath_literal(text))
}

/// XPath 1.0 has no escapes, so mixed quotes need `concat()`.
fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        format!("'{}'", s)
    } else if !s.contains('"') {
        format!("\"{}\"", s)
    } else {
        let parts: Vec<String> = s
            .split('\'')
            .map(|part| format!("'{}'", part))
            .collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_xpath_quotes() {
        assert_eq!(
            text_xpath("See more reviews"),
            "//*[text()[contains(., 'See more reviews')]]"
        );
        assert_eq!(text_xpath("Don't"), "//*[text()[contains(., \"Don't\")]]");
        assert_eq!(
            text_xpath(r#"a'b"c"#),
            r#"//*[text()[contains(., concat('a', "'", 'b"c'))]]"#
        );
    }

    #[test]
    fn scripts_embed_selectors_as_json_strings() {
        let script = select_option("#star-count-dropdown", "five_star");
        assert!(script.contains(r##"document.querySelector("#star-count-dropdown")"##));
        assert!(script.contains(r#"el.value = "five_star";"#));

        let script = query_fragments("div[data-hook='review']", &["span.a-profile-name"]);
        assert!(script.contains(r#"querySelectorAll("div[data-hook='review']")"#));
        assert!(script.contains(r#"["span.a-profile-name"]"#));
    }
}
