//! Serialized rule sets
//!
//! Rule sets arrive as JSON or YAML in this shape:
//!
//! ```yaml
//! info:
//!   title: h1                      # bare selector
//!   updated: { selector: time, type: datetime }
//! entry:
//!   title: h2
//!   link: { selector: a, content: { attribute: href } }
//! entries: article                 # optional, selects the wrapped strategy
//! ```
//!
//! A field is either a bare selector string or a full record. [`RuleSetSpec::normalize`]
//! rewrites bare strings into records; [`RuleSetSpec::compile`] turns the
//! normalized shape into a [`RuleSet`].

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use super::{ContentMode, Registry, Rule, RuleSet, ValueType};
use crate::error::{Error, Result};

/// One field as written by the user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RuleSpec {
    Selector(String),
    Record(RuleRecord),
}

// Hand-written so a bad key inside a record reports the key itself
// instead of "did not match any variant".
impl<'de> Deserialize<'de> for RuleSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct RuleSpecVisitor;

        impl<'de> Visitor<'de> for RuleSpecVisitor {
            type Value = RuleSpec;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a selector string or a rule record")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<RuleSpec, E> {
                Ok(RuleSpec::Selector(value.to_string()))
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> std::result::Result<RuleSpec, A::Error> {
                RuleRecord::deserialize(de::value::MapAccessDeserializer::new(map)).map(RuleSpec::Record)
            }
        }

        deserializer.deserialize_any(RuleSpecVisitor)
    }
}

/// Full form of a rule. Unknown keys, including the legacy `repeat`, are
/// rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub absolute: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub literal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentSpec>,
    /// Name of a processor in the [`Registry`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    /// `text`, `cdata` or `datetime`
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    /// Name of a filter in the [`Registry`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// `content` is a mode name or an attribute descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentSpec {
    Named(String),
    Attribute { attribute: String },
}

/// Whole rule set as written by the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSetSpec {
    #[serde(default)]
    pub info: BTreeMap<String, RuleSpec>,
    /// Required; kept optional here so its absence gets a clear error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<BTreeMap<String, RuleSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entries: Option<RuleSpec>,
}

impl RuleSpec {
    pub fn into_record(self) -> RuleRecord {
        match self {
            RuleSpec::Selector(selector) => RuleRecord {
                selector: Some(selector),
                ..RuleRecord::default()
            },
            RuleSpec::Record(record) => record,
        }
    }

    pub fn normalize(self) -> Self {
        RuleSpec::Record(self.into_record())
    }
}

impl RuleRecord {
    /// Resolve names against `registry` and compile the selector.
    pub fn compile(&self, registry: &Registry) -> Result<Rule> {
        let mut rule = match self.selector.as_deref() {
            Some(selector) => Rule::selector(selector)?,
            None => Rule::container_node(),
        };

        rule.absolute = self.absolute;
        rule.literal = self.literal.clone();
        rule.prefix = self.prefix.clone();
        rule.suffix = self.suffix.clone();

        if let Some(content) = &self.content {
            rule.content = content.to_mode()?;
        }
        if let Some(value_type) = &self.value_type {
            rule.value_type = parse_value_type(value_type)?;
        }
        if let Some(name) = &self.processor {
            rule.processor = Some(
                registry
                    .processor(name)
                    .ok_or_else(|| Error::Config(format!("unknown processor `{name}`")))?,
            );
        }
        if let Some(name) = &self.filter {
            rule.filter = Some(
                registry
                    .filter(name)
                    .ok_or_else(|| Error::Config(format!("unknown filter `{name}`")))?,
            );
        }

        Ok(rule)
    }
}

impl ContentSpec {
    pub fn to_mode(&self) -> Result<ContentMode> {
        match self {
            ContentSpec::Attribute { attribute } => Ok(ContentMode::Attribute(attribute.clone())),
            ContentSpec::Named(name) => match name.as_str() {
                "text" => Ok(ContentMode::Text),
                "inner_html" | "inner_markup" => Ok(ContentMode::InnerMarkup),
                "html" | "outer_html" | "outer_markup" => Ok(ContentMode::OuterMarkup),
                other => Err(Error::Config(format!("unknown content mode `{other}`"))),
            },
        }
    }
}

fn parse_value_type(name: &str) -> Result<ValueType> {
    match name {
        "text" => Ok(ValueType::PlainText),
        "cdata" => Ok(ValueType::Cdata),
        "datetime" => Ok(ValueType::DateTime),
        other => Err(Error::Config(format!("unknown type `{other}`"))),
    }
}

impl RuleSetSpec {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Rewrite every bare selector string into a full record.
    /// Normalizing an already normalized rule set changes nothing.
    pub fn normalize(self) -> Self {
        Self {
            info: normalize_section(self.info),
            entry: self.entry.map(normalize_section),
            entries: self.entries.map(RuleSpec::normalize),
        }
    }

    pub fn compile(&self, registry: &Registry) -> Result<RuleSet> {
        let spec = self.clone().normalize();

        let entry = spec
            .entry
            .ok_or_else(|| Error::Config("rule set has no `entry` map".to_string()))?;

        let rules = RuleSet {
            info: compile_section("info", spec.info, registry)?,
            entry: compile_section("entry", entry, registry)?,
            entries_container: spec
                .entries
                .map(|container| {
                    container
                        .into_record()
                        .compile(registry)
                        .map_err(|e| with_context("entries", e))
                })
                .transpose()?,
        };
        rules.validate()?;

        debug!(
            info_rules = rules.info.len(),
            entry_rules = rules.entry.len(),
            wrapped = rules.is_wrapped(),
            "compiled rule set"
        );
        Ok(rules)
    }
}

impl RuleSet {
    pub fn from_json(json: &str, registry: &Registry) -> Result<Self> {
        RuleSetSpec::from_json(json)?.compile(registry)
    }

    pub fn from_yaml(yaml: &str, registry: &Registry) -> Result<Self> {
        RuleSetSpec::from_yaml(yaml)?.compile(registry)
    }
}

fn normalize_section(section: BTreeMap<String, RuleSpec>) -> BTreeMap<String, RuleSpec> {
    section
        .into_iter()
        .map(|(name, spec)| (name, spec.normalize()))
        .collect()
}

fn compile_section(
    section: &str,
    specs: BTreeMap<String, RuleSpec>,
    registry: &Registry,
) -> Result<BTreeMap<String, Rule>> {
    specs
        .into_iter()
        .map(|(name, spec)| {
            let rule = spec
                .into_record()
                .compile(registry)
                .map_err(|e| with_context(&format!("{section}.{name}"), e))?;
            Ok((name, rule))
        })
        .collect()
}

fn with_context(field: &str, error: Error) -> Error {
    match error {
        Error::Config(message) => Error::Config(format!("`{field}`: {message}")),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RULES_JSON: &str = r#"
    {
        "info": {
            "title": "h1",
            "updated": { "selector": "time", "type": "datetime" }
        },
        "entry": {
            "title": "h2",
            "link": { "selector": "a", "content": { "attribute": "href" }, "prefix": "https://example.com" },
            "body": { "selector": "div.body", "content": "inner_html", "type": "cdata", "processor": "squish" }
        },
        "entries": "article"
    }
    "#;

    #[test]
    fn test_normalize_rewrites_bare_selectors() {
        let spec = RuleSetSpec::from_json(RULES_JSON).unwrap().normalize();

        assert_eq!(
            spec.info["title"],
            RuleSpec::Record(RuleRecord {
                selector: Some("h1".to_string()),
                ..RuleRecord::default()
            })
        );
        assert_eq!(
            spec.entries,
            Some(RuleSpec::Record(RuleRecord {
                selector: Some("article".to_string()),
                ..RuleRecord::default()
            }))
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = RuleSetSpec::from_json(RULES_JSON).unwrap().normalize();
        let twice = once.clone().normalize();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_compile_resolves_modes_and_types() {
        let rules = RuleSet::from_json(RULES_JSON, &Registry::builtin()).unwrap();

        assert!(rules.is_wrapped());
        assert_eq!(rules.info["updated"].value_type, ValueType::DateTime);

        let link = &rules.entry["link"];
        assert_eq!(link.content, ContentMode::Attribute("href".to_string()));
        assert_eq!(link.prefix.as_deref(), Some("https://example.com"));

        let body = &rules.entry["body"];
        assert_eq!(body.content, ContentMode::InnerMarkup);
        assert_eq!(body.value_type, ValueType::Cdata);
        assert!(body.processor.is_some());
    }

    #[test]
    fn test_compile_from_yaml() {
        let yaml = r#"
info:
  title: h1
entry:
  title: h2
  source: { literal: "Example" }
  updated: { selector: "p.date", absolute: true }
"#;
        let rules = RuleSet::from_yaml(yaml, &Registry::new()).unwrap();

        assert!(!rules.is_wrapped());
        assert_eq!(rules.entry["source"].literal.as_deref(), Some("Example"));
        assert!(rules.entry["updated"].absolute);
    }

    #[test]
    fn test_missing_entry_map_fails() {
        let err = RuleSet::from_json(r#"{ "info": { "title": "h1" } }"#, &Registry::new()).unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("entry")));
    }

    #[test]
    fn test_unknown_names_fail_with_field_context() {
        let json = r#"{ "entry": { "title": { "selector": "h2", "processor": "shout" } } }"#;
        let err = RuleSet::from_json(json, &Registry::builtin()).unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("entry.title") && msg.contains("shout")));

        let json = r#"{ "entry": { "title": { "selector": "h2", "content": "markdown" } } }"#;
        assert!(matches!(
            RuleSet::from_json(json, &Registry::new()),
            Err(Error::Config(_))
        ));

        let json = r#"{ "entry": { "title": { "selector": "h2", "type": "number" } } }"#;
        assert!(matches!(
            RuleSet::from_json(json, &Registry::new()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_filter_on_field_rule_fails() {
        let registry = Registry::new().with_filter("all", |_: &crate::extractors::Entry| true);
        let json = r#"{ "entry": { "title": { "selector": "h2", "filter": "all" } } }"#;
        assert!(matches!(RuleSet::from_json(json, &registry), Err(Error::Config(_))));

        let json = r#"{ "entry": { "title": "h2" }, "entries": { "selector": "article", "filter": "all" } }"#;
        let rules = RuleSet::from_json(json, &registry).unwrap();
        assert!(rules.entries_container.unwrap().filter.is_some());
    }

    #[test]
    fn test_misspelled_key_fails() {
        let json = r#"{ "entry": { "title": { "selecter": "h2" } }, "entries": "article" }"#;
        let err = RuleSet::from_json(json, &Registry::new()).unwrap_err();
        assert!(matches!(err, Error::Json(ref e) if e.to_string().contains("selecter")));

        let yaml = "entry:\n  title: { selecter: h2 }\n";
        let err = RuleSet::from_yaml(yaml, &Registry::new()).unwrap_err();
        assert!(matches!(err, Error::Yaml(ref e) if e.to_string().contains("selecter")));
    }

    #[test]
    fn test_repeat_is_not_accepted() {
        let json = r#"{ "entry": { "date": { "selector": "time", "repeat": true } } }"#;
        let err = RuleSet::from_json(json, &Registry::new()).unwrap_err();
        assert!(matches!(err, Error::Json(ref e) if e.to_string().contains("repeat")));
    }

    #[test]
    fn test_unknown_top_level_key_fails() {
        let json = r#"{ "entry": { "title": "h2" }, "entires": "article" }"#;
        let err = RuleSet::from_json(json, &Registry::new()).unwrap_err();
        assert!(matches!(err, Error::Json(ref e) if e.to_string().contains("entires")));
    }

    #[test]
    fn test_invalid_entry_shape_fails() {
        let err = RuleSet::from_json(r#"{ "entry": "h2" }"#, &Registry::new()).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
