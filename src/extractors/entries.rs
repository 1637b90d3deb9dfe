//! Entry extraction
//!
//! Two strategies build the entry list:
//!
//! - unwrapped: every field selector runs over the whole document and the
//!   n-th match of each field lands in the n-th entry
//! - wrapped: one container selector yields one entry per match, and field
//!   selectors run inside each container

use std::collections::BTreeMap;

use scraper::Html;
use tracing::{debug, trace};

use super::format::format_content;
use super::{select_all, select_first, Entry};
use crate::dates::DateParser;
use crate::rules::{Rule, RuleSet};

/// Dispatch on the strategy chosen by the rule set
pub fn extract_entries(document: &Html, rules: &RuleSet, dates: &dyn DateParser) -> Vec<Entry> {
    match &rules.entries_container {
        Some(container) => extract_entries_wrapped(document, rules, container, dates),
        None => extract_entries_unwrapped(document, rules, dates),
    }
}

/// Align independent per-field matches by index.
///
/// The entry count is the largest match count among selector fields. A
/// field with fewer matches has no key in the trailing entries. Literal and
/// absolute fields are copied into every entry; with no selector fields at
/// all there are no entries to copy them into.
pub fn extract_entries_unwrapped(document: &Html, rules: &RuleSet, dates: &dyn DateParser) -> Vec<Entry> {
    let mut columns: BTreeMap<usize, Entry> = BTreeMap::new();
    let mut statics = Entry::new();

    for (name, rule) in &rules.entry {
        if let Some(literal) = &rule.literal {
            statics.insert(name.clone(), literal.clone());
            continue;
        }

        if rule.absolute {
            let value = format_content(select_first(document, rule), rule, dates);
            statics.insert(name.clone(), value);
            continue;
        }

        let mut matched = 0;
        for (index, element) in select_all(document, rule).enumerate() {
            columns
                .entry(index)
                .or_default()
                .insert(name.clone(), format_content(Some(element), rule, dates));
            matched += 1;
        }
        trace!(field = %name, matched, "entry column");
    }

    // Every column starts at index 0, so the keys are contiguous.
    let mut entries: Vec<Entry> = columns.into_values().collect();

    if !statics.is_empty() {
        for entry in &mut entries {
            entry.extend(statics.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
    }

    debug!(entries = entries.len(), statics = statics.len(), "unwrapped entries");
    entries
}

/// One entry per container match, fields resolved inside each container.
///
/// Every declared field is present on every entry, empty when nothing
/// matched. The container's filter, if any, drops entries in place.
pub fn extract_entries_wrapped(
    document: &Html,
    rules: &RuleSet,
    container: &Rule,
    dates: &dyn DateParser,
) -> Vec<Entry> {
    let absolutes: BTreeMap<&str, String> = rules
        .entry
        .iter()
        .filter(|(_, rule)| rule.literal.is_none() && rule.absolute)
        .map(|(name, rule)| {
            (
                name.as_str(),
                format_content(select_first(document, rule), rule, dates),
            )
        })
        .collect();

    let entries: Vec<Entry> = select_all(document, container)
        .map(|node| {
            rules
                .entry
                .iter()
                .map(|(name, rule)| {
                    let value = if let Some(literal) = &rule.literal {
                        literal.clone()
                    } else if rule.absolute {
                        absolutes.get(name.as_str()).cloned().unwrap_or_default()
                    } else {
                        match &rule.selector {
                            Some(selector) => {
                                format_content(node.select(selector.selector()).next(), rule, dates)
                            }
                            None => format_content(Some(node), rule, dates),
                        }
                    };
                    (name.clone(), value)
                })
                .collect::<Entry>()
        })
        .collect();

    let matched = entries.len();
    let entries = match &container.filter {
        Some(filter) => entries.into_iter().filter(|entry| filter(entry)).collect(),
        None => entries,
    };

    debug!(
        containers = matched,
        entries = entries.len(),
        filtered = matched - entries.len(),
        "wrapped entries"
    );
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::ChronoDateParser;
    use crate::rules::{ContentMode, ValueType};
    use pretty_assertions::assert_eq;

    fn entry(fields: &[(&str, &str)]) -> Entry {
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    const PAIRS: &str = r#"
    <html>
    <body>
        <h2>Updated today</h2>
        <h1>Title 1</h1>
        <p>Summary 1</p>
        <h1>Title 2</h1>
        <p>Summary 2</p>
    </body>
    </html>
    "#;

    #[test]
    fn test_unwrapped_pairs_with_absolute() {
        let document = Html::parse_document(PAIRS);
        let rules = RuleSet::new()
            .with_entry("title", Rule::selector("h1").unwrap())
            .with_entry("summary", Rule::selector("p").unwrap())
            .with_entry("updated", Rule::selector("h2").unwrap().absolute());

        let entries = extract_entries(&document, &rules, &ChronoDateParser);

        assert_eq!(
            entries,
            vec![
                entry(&[("title", "Title 1"), ("summary", "Summary 1"), ("updated", "Updated today")]),
                entry(&[("title", "Title 2"), ("summary", "Summary 2"), ("updated", "Updated today")]),
            ]
        );
    }

    #[test]
    fn test_unwrapped_short_column_omits_keys() {
        let html = r#"
        <ul>
            <li><a href="/1">One</a><span>tag</span></li>
            <li><a href="/2">Two</a></li>
            <li><a href="/3">Three</a></li>
        </ul>
        "#;
        let document = Html::parse_document(html);
        let rules = RuleSet::new()
            .with_entry("title", Rule::selector("li a").unwrap())
            .with_entry("tag", Rule::selector("li span").unwrap())
            .with_entry("source", Rule::literal("example"));

        let entries = extract_entries_unwrapped(&document, &rules, &ChronoDateParser);

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], entry(&[("title", "One"), ("tag", "tag"), ("source", "example")]));
        assert_eq!(entries[1], entry(&[("title", "Two"), ("source", "example")]));
        assert!(!entries[2].contains_key("tag"));
    }

    #[test]
    fn test_unwrapped_only_static_fields_is_empty() {
        let document = Html::parse_document(PAIRS);
        let rules = RuleSet::new()
            .with_entry("source", Rule::literal("example"))
            .with_entry("updated", Rule::selector("h2").unwrap().absolute());

        assert!(extract_entries(&document, &rules, &ChronoDateParser).is_empty());
    }

    #[test]
    fn test_unwrapped_literal_ignores_document() {
        let document = Html::parse_document(PAIRS);
        let mut literal = Rule::selector("h1").unwrap();
        literal.literal = Some("fixed".to_string());
        let rules = RuleSet::new()
            .with_entry("title", Rule::selector("h1").unwrap())
            .with_entry("kind", literal);

        let entries = extract_entries(&document, &rules, &ChronoDateParser);
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e["kind"] == "fixed"));
    }

    const ARTICLES: &str = r#"
    <html>
    <body>
        <time class="stamp">2024-03-01</time>
        <article><h1>First</h1><a href="/first">more</a></article>
        <article><h1>Second</h1></article>
        <article><h1>Third</h1><a href="/third">more</a></article>
    </body>
    </html>
    "#;

    #[test]
    fn test_wrapped_every_key_present() {
        let document = Html::parse_document(ARTICLES);
        let rules = RuleSet::new()
            .with_entry("title", Rule::selector("h1").unwrap())
            .with_entry(
                "link",
                Rule::selector("a")
                    .unwrap()
                    .content(ContentMode::Attribute("href".to_string())),
            )
            .with_entry(
                "updated",
                Rule::selector("time.stamp")
                    .unwrap()
                    .absolute()
                    .value_type(ValueType::DateTime),
            )
            .with_entry("author", Rule::literal("staff"))
            .with_entries_container(Rule::selector("article").unwrap());

        let entries = extract_entries(&document, &rules, &ChronoDateParser);

        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries[1],
            entry(&[
                ("title", "Second"),
                ("link", ""),
                ("updated", "2024-03-01T00:00:00+00:00"),
                ("author", "staff"),
            ])
        );
        assert!(entries.iter().all(|e| e.len() == 4));
        assert!(entries.iter().all(|e| e["updated"] == entries[0]["updated"]));
    }

    #[test]
    fn test_wrapped_filter_preserves_order() {
        let document = Html::parse_document(ARTICLES);
        let rules = RuleSet::new()
            .with_entry("title", Rule::selector("h1").unwrap())
            .with_entries_container(
                Rule::selector("article")
                    .unwrap()
                    .filter(|entry: &Entry| entry["title"] != "Second"),
            );

        let entries = extract_entries(&document, &rules, &ChronoDateParser);

        assert_eq!(entries, vec![entry(&[("title", "First")]), entry(&[("title", "Third")])]);
    }

    #[test]
    fn test_wrapped_container_itself() {
        let document = Html::parse_document("<div><h1>Title 1</h1></div>");
        let rules = RuleSet::new()
            .with_entry(
                "content",
                Rule::selector("")
                    .unwrap()
                    .content(ContentMode::InnerMarkup)
                    .value_type(ValueType::Cdata),
            )
            .with_entries_container(Rule::selector("div").unwrap());

        let entries = extract_entries(&document, &rules, &ChronoDateParser);

        assert_eq!(entries, vec![entry(&[("content", "<![CDATA[<h1>Title 1</h1>]]>")])]);
    }

    #[test]
    fn test_wrapped_without_containers() {
        let document = Html::parse_document(PAIRS);
        let rules = RuleSet::new()
            .with_entry("title", Rule::selector("h1").unwrap())
            .with_entries_container(Rule::selector("article").unwrap());

        assert!(extract_entries(&document, &rules, &ChronoDateParser).is_empty());
    }
}
