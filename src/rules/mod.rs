//! Rule model
//!
//! A [`Rule`] says how to find one value in a document and how to format it.
//! A [`RuleSet`] groups the rules for the feed info, the entry fields and the
//! optional entries container.

mod registry;
mod spec;

pub use registry::*;
pub use spec::*;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use scraper::Selector;

use crate::error::{Error, Result};
use crate::extractors::Entry;

/// Post-processing hook applied to extracted text before wrapping.
///
/// Must be pure: the same input always yields the same output and nothing
/// outside the returned string is touched. A processor shared between
/// threads must also be reentrant.
pub type Processor = Arc<dyn Fn(&str, &Rule) -> String + Send + Sync>;

/// Predicate over a finished entry. Only valid on the entries container rule.
pub type Filter = Arc<dyn Fn(&Entry) -> bool + Send + Sync>;

/// What part of a matched node becomes the raw value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ContentMode {
    /// Trimmed text content
    #[default]
    Text,
    /// Markup of the node's children
    InnerMarkup,
    /// Markup of the node itself, children included
    OuterMarkup,
    /// Value of the named attribute, empty if absent
    Attribute(String),
}

/// Final coercion applied to the wrapped value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValueType {
    #[default]
    PlainText,
    Cdata,
    DateTime,
}

/// A compiled CSS selector together with the text it was parsed from
#[derive(Debug, Clone)]
pub struct RuleSelector {
    source: String,
    selector: Selector,
}

impl RuleSelector {
    pub fn parse(source: &str) -> Result<Self> {
        let selector = Selector::parse(source).map_err(|e| Error::InvalidSelector {
            selector: source.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            selector,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }
}

/// One extraction rule.
///
/// When `literal` is set it wins over everything else: the value is the
/// literal, no selector is evaluated and no formatting is applied.
#[derive(Clone, Default)]
pub struct Rule {
    pub selector: Option<RuleSelector>,
    pub absolute: bool,
    pub literal: Option<String>,
    pub content: ContentMode,
    pub processor: Option<Processor>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub value_type: ValueType,
    pub filter: Option<Filter>,
}

impl Rule {
    /// Rule matching `selector`. An empty string yields a rule without a
    /// selector, which in the wrapped strategy targets the container itself.
    pub fn selector(selector: &str) -> Result<Self> {
        if selector.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(Self {
            selector: Some(RuleSelector::parse(selector)?),
            ..Self::default()
        })
    }

    /// Rule that always yields `value`
    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            literal: Some(value.into()),
            ..Self::default()
        }
    }

    /// Rule without a selector
    pub fn container_node() -> Self {
        Self::default()
    }

    pub fn absolute(mut self) -> Self {
        self.absolute = true;
        self
    }

    pub fn content(mut self, content: ContentMode) -> Self {
        self.content = content;
        self
    }

    pub fn processor<F>(mut self, processor: F) -> Self
    where
        F: Fn(&str, &Rule) -> String + Send + Sync + 'static,
    {
        self.processor = Some(Arc::new(processor));
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Entry) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn selector_str(&self) -> Option<&str> {
        self.selector.as_ref().map(RuleSelector::as_str)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("selector", &self.selector_str())
            .field("absolute", &self.absolute)
            .field("literal", &self.literal)
            .field("content", &self.content)
            .field("processor", &self.processor.as_ref().map(|_| "<fn>"))
            .field("prefix", &self.prefix)
            .field("suffix", &self.suffix)
            .field("value_type", &self.value_type)
            .field("filter", &self.filter.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Complete set of rules for one feed
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub info: BTreeMap<String, Rule>,
    pub entry: BTreeMap<String, Rule>,
    /// Presence selects the wrapped entry strategy
    pub entries_container: Option<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_info(mut self, name: impl Into<String>, rule: Rule) -> Self {
        self.info.insert(name.into(), rule);
        self
    }

    pub fn with_entry(mut self, name: impl Into<String>, rule: Rule) -> Self {
        self.entry.insert(name.into(), rule);
        self
    }

    pub fn with_entries_container(mut self, rule: Rule) -> Self {
        self.entries_container = Some(rule);
        self
    }

    pub fn is_wrapped(&self) -> bool {
        self.entries_container.is_some()
    }

    /// Reject filters placed anywhere but on the entries container.
    pub fn validate(&self) -> Result<()> {
        let misplaced = self
            .info
            .iter()
            .map(|(name, rule)| ("info", name, rule))
            .chain(self.entry.iter().map(|(name, rule)| ("entry", name, rule)))
            .find(|(_, _, rule)| rule.filter.is_some());

        match misplaced {
            Some((section, name, _)) => Err(Error::Config(format!(
                "`{section}.{name}` has a filter; filters are only allowed on the entries container"
            ))),
            None => Ok(()),
        }
    }
}
