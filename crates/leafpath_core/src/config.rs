use std::path::Path;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::tag;

/// How leaf paths are assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Addressing {
    /// Filtered ancestor steps joined by `/` or `//`.
    #[default]
    Plain,
    /// `(//outer/inner)[n]` numbering of repeating container pairs.
    Composite,
}

/// Engine configuration.
///
/// Field names follow the keys of the JSON defaults file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Prefix written before every emitted tag. Empty keeps the source's own.
    #[serde(default = "default_namespace_prefix")]
    pub namespace_prefix: String,

    /// Bare tags that take part in path construction.
    #[serde(default = "default_include_elements")]
    pub include_elements: IndexSet<String>,

    /// The single attribute eligible for an attribute predicate.
    #[serde(default = "default_predicate_attribute")]
    pub predicate_attribute_name: Option<String>,

    /// Container type used for child-text predicates and composite grouping.
    #[serde(default = "default_filter_parent")]
    pub filter_parent_type: Option<String>,

    /// Child of the filter parent whose text becomes its predicate.
    #[serde(default = "default_filter_child")]
    pub filter_child_type: Option<String>,

    #[serde(default)]
    pub addressing: Addressing,

    /// Emit `[1]` instead of omitting it.
    #[serde(default)]
    pub always_show_index: bool,

    #[serde(default)]
    pub debug: bool,
}

fn default_namespace_prefix() -> String {
    "d".to_string()
}

fn default_include_elements() -> IndexSet<String> {
    ["PROPERTY", "IMAGE"].into_iter().map(String::from).collect()
}

fn default_predicate_attribute() -> Option<String> {
    Some("ValuationUseType".to_string())
}

fn default_filter_parent() -> Option<String> {
    Some("IMAGE".to_string())
}

fn default_filter_child() -> Option<String> {
    Some("ImageCategoryType".to_string())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace_prefix: default_namespace_prefix(),
            include_elements: default_include_elements(),
            predicate_attribute_name: default_predicate_attribute(),
            filter_parent_type: default_filter_parent(),
            filter_child_type: default_filter_child(),
            addressing: Addressing::default(),
            always_show_index: false,
            debug: false,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl Config {
    /// Parse a JSON defaults document; absent keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json_str(&content)
    }

    pub fn with_namespace_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.namespace_prefix = prefix.into();
        self
    }

    pub fn with_include_elements<I, S>(mut self, elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_elements = elements.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_predicate_attribute(mut self, name: Option<String>) -> Self {
        self.predicate_attribute_name = name;
        self
    }

    pub fn with_filter_pair(mut self, parent: Option<String>, child: Option<String>) -> Self {
        self.filter_parent_type = parent;
        self.filter_child_type = child;
        self
    }

    pub fn with_addressing(mut self, addressing: Addressing) -> Self {
        self.addressing = addressing;
        self
    }

    pub fn with_always_show_index(mut self, value: bool) -> Self {
        self.always_show_index = value;
        self
    }

    pub fn with_debug(mut self, value: bool) -> Self {
        self.debug = value;
        self
    }

    /// Whether an element with this bare tag takes part in path construction.
    pub fn includes(&self, bare_tag: &str) -> bool {
        self.include_elements
            .iter()
            .any(|entry| tag::bare(entry.trim()) == bare_tag)
    }

    pub fn predicate_attribute(&self) -> Option<&str> {
        non_empty(&self.predicate_attribute_name).map(tag::bare)
    }

    pub fn filter_parent(&self) -> Option<&str> {
        non_empty(&self.filter_parent_type).map(tag::bare)
    }

    pub fn filter_child(&self) -> Option<&str> {
        non_empty(&self.filter_child_type).map(tag::bare)
    }
}
