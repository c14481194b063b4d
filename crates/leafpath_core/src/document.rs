//! Owned element tree built from a `roxmltree` document.
//!
//! The tree is normalized once after parsing: children are kept as one
//! ordered list whether a tag occurs once or many times, and sibling groups
//! are derived on demand for traversal.

use indexmap::IndexMap;
use roxmltree::{Document, Node, ParsingOptions};

use crate::error::Result;
use crate::tag::ElementName;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedElement {
    pub name: ElementName,
    /// Attributes keyed by qualified name, in document order.
    pub attributes: IndexMap<String, String>,
    pub children: Vec<ParsedElement>,
    /// Direct text content, `None` when the element has no text nodes.
    pub text: Option<String>,
}

/// Same-tag siblings, in the order the tag first appears under its parent.
#[derive(Debug)]
pub struct SiblingGroup<'a> {
    pub name: &'a ElementName,
    pub members: Vec<&'a ParsedElement>,
}

impl ParsedElement {
    /// Parse a complete document and return its document element.
    pub fn parse(source: &str) -> Result<Self> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let doc = Document::parse_with_options(source, options)?;
        Ok(Self::from_node(doc.root_element()))
    }

    fn from_node(node: Node) -> Self {
        let tag = node.tag_name();
        let prefix = tag.namespace().and_then(|ns| node.lookup_prefix(ns));
        let name = ElementName::from_parts(prefix, tag.name());

        let attributes = node
            .attributes()
            .map(|attr| {
                let prefix = attr.namespace().and_then(|ns| node.lookup_prefix(ns));
                let key = ElementName::from_parts(prefix, attr.name());
                (key.qualified().to_string(), attr.value().to_string())
            })
            .collect();

        let mut children = Vec::new();
        let mut text: Option<String> = None;
        for child in node.children() {
            if child.is_element() {
                children.push(Self::from_node(child));
            } else if child.is_text() {
                if let Some(t) = child.text() {
                    text.get_or_insert_with(String::new).push_str(t);
                }
            }
        }

        Self {
            name,
            attributes,
            children,
            text,
        }
    }

    /// A leaf has no element children; it may still carry attributes.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn trimmed_text(&self) -> &str {
        self.text.as_deref().map(str::trim).unwrap_or_default()
    }

    /// Attribute value looked up by bare name.
    pub fn attribute(&self, bare_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| crate::tag::bare(key) == bare_name)
            .map(|(_, value)| value.as_str())
    }

    /// First direct child with the given bare tag.
    pub fn child(&self, bare_name: &str) -> Option<&ParsedElement> {
        self.children.iter().find(|c| c.name.bare() == bare_name)
    }

    /// Children grouped by qualified tag.
    ///
    /// Groups come in first-appearance order; members of a group keep
    /// document order. `<a/><b/><a/>` yields `[a, a]` then `[b]`.
    pub fn sibling_groups(&self) -> Vec<SiblingGroup<'_>> {
        let mut groups: IndexMap<&str, SiblingGroup<'_>> = IndexMap::new();
        for child in &self.children {
            groups
                .entry(child.name.qualified())
                .or_insert_with(|| SiblingGroup {
                    name: &child.name,
                    members: Vec::new(),
                })
                .members
                .push(child);
        }
        groups.into_values().collect()
    }
}
