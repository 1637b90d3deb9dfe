//! Feed-level info extraction

use scraper::Html;
use tracing::trace;

use super::format::format_content;
use super::{select_first, Info};
use crate::dates::DateParser;
use crate::rules::RuleSet;

/// One value per info rule: the literal if set, otherwise the first
/// document-wide match formatted, or an empty string.
pub fn extract_info(document: &Html, rules: &RuleSet, dates: &dyn DateParser) -> Info {
    rules
        .info
        .iter()
        .map(|(name, rule)| {
            let value = match &rule.literal {
                Some(literal) => literal.clone(),
                None => format_content(select_first(document, rule), rule, dates),
            };
            trace!(field = %name, value = %value, "info field");
            (name.clone(), value)
        })
        .collect()
}
