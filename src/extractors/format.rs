//! Formatting pipeline: extract, process, wrap, coerce

use scraper::ElementRef;
use tracing::trace;

use super::content::extract_content;
use crate::dates::{to_iso8601, DateParser};
use crate::rules::{Rule, ValueType};

/// Final string for `element` under `rule`. No element means an empty
/// string; the rest of the pipeline is skipped.
pub fn format_content(element: Option<ElementRef<'_>>, rule: &Rule, dates: &dyn DateParser) -> String {
    let Some(element) = element else {
        return String::new();
    };

    let text = extract_content(element, rule);

    let processed = match &rule.processor {
        Some(processor) => processor(&text, rule),
        None => text,
    };

    let wrapped = if rule.prefix.is_some() || rule.suffix.is_some() {
        format!(
            "{}{}{}",
            rule.prefix.as_deref().unwrap_or_default(),
            processed,
            rule.suffix.as_deref().unwrap_or_default()
        )
    } else {
        processed
    };

    coerce(wrapped, rule.value_type, dates)
}

/// Apply the value type. CDATA content is not escaped, so a value
/// containing `]]>` produces a broken section.
pub fn coerce(value: String, value_type: ValueType, dates: &dyn DateParser) -> String {
    match value_type {
        ValueType::PlainText => value,
        ValueType::Cdata => format!("<![CDATA[{value}]]>"),
        ValueType::DateTime => match dates.parse(&value) {
            Some(moment) => to_iso8601(&moment),
            None => {
                trace!(value = %value, "unparseable date");
                String::new()
            }
        },
    }
}
