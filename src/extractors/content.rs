//! Raw value extraction from a matched element

use scraper::ElementRef;

use crate::rules::{ContentMode, Rule};

/// Pull the raw string for `rule.content` out of `element`.
/// A missing attribute yields an empty string.
pub fn extract_content(element: ElementRef<'_>, rule: &Rule) -> String {
    match &rule.content {
        ContentMode::Attribute(name) => element.value().attr(name).unwrap_or_default().to_string(),
        ContentMode::InnerMarkup => element.inner_html(),
        ContentMode::OuterMarkup => element.html(),
        ContentMode::Text => element.text().collect::<String>().trim().to_string(),
    }
}
