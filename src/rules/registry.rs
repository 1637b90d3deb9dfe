//! Named processors and filters
//!
//! Serialized rule sets refer to processors and filters by name. A
//! [`Registry`] resolves those names to functions when the rule set is
//! compiled.

use std::collections::HashMap;
use std::sync::Arc;

use scraper::Html;

use super::{Filter, Processor, Rule};
use crate::extractors::Entry;

#[derive(Clone, Default)]
pub struct Registry {
    processors: HashMap<String, Processor>,
    filters: HashMap<String, Filter>,
}

impl Registry {
    /// Registry with no entries
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the text processors every rule set can use:
    /// `trim`, `squish`, `lowercase`, `uppercase` and `strip_tags`.
    pub fn builtin() -> Self {
        Self::new()
            .with_processor("trim", |text: &str, _: &Rule| text.trim().to_string())
            .with_processor("squish", |text: &str, _: &Rule| squish(text))
            .with_processor("lowercase", |text: &str, _: &Rule| text.to_lowercase())
            .with_processor("uppercase", |text: &str, _: &Rule| text.to_uppercase())
            .with_processor("strip_tags", |text: &str, _: &Rule| strip_tags(text))
    }

    pub fn with_processor<F>(mut self, name: impl Into<String>, processor: F) -> Self
    where
        F: Fn(&str, &Rule) -> String + Send + Sync + 'static,
    {
        self.processors.insert(name.into(), Arc::new(processor));
        self
    }

    pub fn with_filter<F>(mut self, name: impl Into<String>, filter: F) -> Self
    where
        F: Fn(&Entry) -> bool + Send + Sync + 'static,
    {
        self.filters.insert(name.into(), Arc::new(filter));
        self
    }

    pub fn processor(&self, name: &str) -> Option<Processor> {
        self.processors.get(name).cloned()
    }

    pub fn filter(&self, name: &str) -> Option<Filter> {
        self.filters.get(name).cloned()
    }
}

/// Collapse every whitespace run into a single space and trim the ends
fn squish(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text content of a markup fragment
fn strip_tags(text: &str) -> String {
    let fragment = Html::parse_fragment(text);
    fragment.root_element().text().collect::<String>()
}
