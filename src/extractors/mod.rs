//! Extraction engine
//!
//! Runs a [`RuleSet`] over a parsed document and produces a [`Feed`]: the
//! flat info record plus the ordered entry list.

mod content;
mod entries;
mod format;
mod info;

pub use content::*;
pub use entries::*;
pub use format::*;
pub use info::*;

use std::collections::BTreeMap;

use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dates::{ChronoDateParser, DateParser};
use crate::error::Result;
use crate::render::Render;
use crate::rules::{Rule, RuleSet};

/// Feed-level metadata, one key per info rule
pub type Info = BTreeMap<String, String>;

/// One item's fields
pub type Entry = BTreeMap<String, String>;

/// Result of one extraction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub info: Info,
    pub entries: Vec<Entry>,
}

/// Rule set bound to a date parser, ready to run over documents.
///
/// Holds no per-document state; one instance can extract from any number
/// of documents, from any number of threads.
pub struct Feedstock {
    rules: RuleSet,
    dates: Box<dyn DateParser + Send + Sync>,
}

impl Feedstock {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            dates: Box::new(ChronoDateParser),
        }
    }

    /// Replace the parser used for `datetime` fields
    pub fn with_date_parser(mut self, dates: impl DateParser + Send + Sync + 'static) -> Self {
        self.dates = Box::new(dates);
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn extract(&self, document: &Html) -> Feed {
        debug!(wrapped = self.rules.is_wrapped(), "extracting feed");
        let dates = self.dates.as_ref();
        Feed {
            info: extract_info(document, &self.rules, dates),
            entries: extract_entries(document, &self.rules, dates),
        }
    }

    /// Parse `html` as a full document and extract from it
    pub fn extract_html(&self, html: &str) -> Feed {
        let document = Html::parse_document(html);
        self.extract(&document)
    }

    pub fn render(&self, document: &Html, renderer: &dyn Render) -> Result<String> {
        renderer.render(&self.extract(document))
    }
}

/// First document-order match of the rule's selector
pub(crate) fn select_first<'a>(document: &'a Html, rule: &Rule) -> Option<ElementRef<'a>> {
    let selector = rule.selector.as_ref()?;
    document.select(selector.selector()).next()
}

/// All document-order matches of the rule's selector; none without one
pub(crate) fn select_all<'a>(document: &'a Html, rule: &'a Rule) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    rule.selector
        .iter()
        .flat_map(move |selector| document.select(selector.selector()))
}
