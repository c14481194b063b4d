//! Copy a classification field from one document to another.
//!
//! Elements are matched by the text of a discriminator child (an image's
//! file name, say). The target is edited in place: only the field content
//! changes, every other byte is written back as it was read.

use std::fmt;
use std::fs;
use std::ops::Range;
use std::path::Path;

use indexmap::map::Entry;
use indexmap::IndexMap;
use leafpath_core::tag::bare;
use quick_xml::escape::escape;
use roxmltree::{Document, Node, ParsingOptions};
use tracing::{debug, trace, warn};

use crate::error::{MappingError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Element type that carries both children.
    pub element: String,
    /// Child whose text identifies an element across documents.
    pub discriminator: String,
    /// Child whose text is copied.
    pub field: String,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            element: "IMAGE".to_string(),
            discriminator: "ImageFileName".to_string(),
            field: "ImageCategoryType".to_string(),
        }
    }
}

impl SyncOptions {
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("element", &self.element),
            ("discriminator", &self.discriminator),
            ("field", &self.field),
        ] {
            if bare(value).trim().is_empty() {
                return Err(MappingError::MissingField(name));
            }
        }
        Ok(())
    }
}

/// Outcome counts, one per element of the configured type in the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub updated: usize,
    pub inserted: usize,
    pub unchanged: usize,
    pub unmatched: usize,
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} updated, {} inserted, {} unchanged, {} unmatched",
            self.updated, self.inserted, self.unchanged, self.unmatched
        )
    }
}

fn parse(text: &str) -> Result<Document<'_>> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Ok(Document::parse_with_options(text, options)?)
}

fn elements_named<'a, 'input>(
    doc: &'a Document<'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    doc.descendants()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == name)
}

/// Trimmed text of all descendants.
fn text_content(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

fn child_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    child(node, name)
        .map(text_content)
        .filter(|text| !text.is_empty())
}

/// Map each discriminator in `source` to its field value.
///
/// The first occurrence of a discriminator wins.
pub fn collect_classifications(source: &str, options: &SyncOptions) -> Result<IndexMap<String, String>> {
    options.validate()?;
    let doc = parse(source)?;
    let element = bare(&options.element);
    let discriminator = bare(&options.discriminator);
    let field = bare(&options.field);

    let mut values: IndexMap<String, String> = IndexMap::new();
    for node in elements_named(&doc, element) {
        let (Some(key), Some(value)) = (child_text(node, discriminator), child_text(node, field)) else {
            continue;
        };
        match values.entry(key) {
            Entry::Occupied(existing) => {
                if *existing.get() != value {
                    warn!(
                        key = existing.key().as_str(),
                        kept = existing.get().as_str(),
                        ignored = value.as_str(),
                        "conflicting classification"
                    );
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
        }
    }
    debug!(count = values.len(), "collected classifications");
    Ok(values)
}

/// A byte range of the target and its replacement.
struct Splice {
    range: Range<usize>,
    text: String,
}

/// Qualified name at the start of an element's source text.
fn qualified_name(markup: &str) -> &str {
    let rest = markup.strip_prefix('<').unwrap_or(markup);
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .unwrap_or(rest.len());
    &rest[..end]
}

/// Replace the content of an existing field element.
fn set_content(target: &str, field: Node<'_, '_>, value: &str) -> Splice {
    if let (Some(first), Some(last)) = (field.first_child(), field.last_child()) {
        return Splice {
            range: first.range().start..last.range().end,
            text: value.to_string(),
        };
    }

    let range = field.range();
    let markup = &target[range.clone()];
    let name = qualified_name(markup);
    match markup.strip_suffix("/>") {
        // <a/> becomes <a>value</a>
        Some(open) => Splice {
            range: range.start + open.len()..range.end,
            text: format!(">{value}</{name}>"),
        },
        // <a></a>
        None => {
            let at = range.start + markup.rfind("</").unwrap_or(markup.len());
            Splice {
                range: at..at,
                text: value.to_string(),
            }
        }
    }
}

/// Add a new field element just before `element`'s end tag.
fn insert_field(target: &str, element: Node<'_, '_>, field: &str, value: &str) -> Splice {
    let range = element.range();
    let markup = &target[range.clone()];
    let name = match qualified_name(markup).split_once(':') {
        Some((prefix, _)) => format!("{prefix}:{field}"),
        None => field.to_string(),
    };
    let at = range.start + markup.rfind("</").unwrap_or(markup.len());
    Splice {
        range: at..at,
        text: format!("<{name}>{value}</{name}>"),
    }
}

/// Write `values` into the field of every matching element in `target`.
pub fn apply_classifications(
    target: &str,
    values: &IndexMap<String, String>,
    options: &SyncOptions,
) -> Result<(String, SyncReport)> {
    options.validate()?;
    let doc = parse(target)?;
    let element = bare(&options.element);
    let discriminator = bare(&options.discriminator);
    let field = bare(&options.field);

    let mut report = SyncReport::default();
    let mut splices = Vec::new();
    for node in elements_named(&doc, element) {
        let Some((key, value)) = child_text(node, discriminator)
            .and_then(|key| values.get(&key).map(|value| (key, value)))
        else {
            report.unmatched += 1;
            continue;
        };
        let escaped = escape(value.as_str());
        match child(node, field) {
            Some(existing) if text_content(existing) == *value => {
                report.unchanged += 1;
            }
            Some(existing) => {
                trace!(%key, %value, "updating field");
                splices.push(set_content(target, existing, &escaped));
                report.updated += 1;
            }
            None => {
                trace!(%key, %value, "inserting field");
                splices.push(insert_field(target, node, field, &escaped));
                report.inserted += 1;
            }
        }
    }

    splices.sort_by(|a, b| b.range.start.cmp(&a.range.start));
    let mut output = target.to_string();
    for splice in splices {
        output.replace_range(splice.range, &splice.text);
    }
    debug!(%report, "applied classifications");
    Ok((output, report))
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| MappingError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Copy classifications from `source` into `target`, writing to `output`.
///
/// `output` may be the target itself.
pub fn sync_files(source: &Path, target: &Path, output: &Path, options: &SyncOptions) -> Result<SyncReport> {
    let values = collect_classifications(&read(source)?, options)?;
    let (updated, report) = apply_classifications(&read(target)?, &values, options)?;
    fs::write(output, updated).map_err(|source| MappingError::Write {
        path: output.to_path_buf(),
        source,
    })?;
    Ok(report)
}
