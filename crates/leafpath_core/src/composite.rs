//! Composite grouping: `(//outer/inner)[n]` addresses for leaves under
//! repeating container pairs.
//!
//! A slice of the selected ancestors, ending at a filter-parent frame, is
//! numbered as one unit. Three strategies are tried in order:
//!
//! 1. [`anchored_slice`]: from the first attribute-predicate frame (or the
//!    first selected frame) to the next filter-parent frame with a predicate.
//! 2. [`group_only_slice`]: the first filter-parent frame on its own.
//! 3. the plain path of [`crate::path::assemble`].

use std::collections::HashMap;
use std::ops::RangeInclusive;

use tracing::trace;

use crate::config::Config;
use crate::path::{self, separator};
use crate::predicate::PredicateSource;
use crate::step::step;
use crate::walker::AncestorFrame;

/// Signatures of the frames in a grouped slice.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeKey(Vec<String>);

/// A grouped slice pinned to concrete instances by their assigned indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeInstanceKey {
    key: CompositeKey,
    indices: Vec<usize>,
}

/// Composite numbers handed out during one run.
///
/// Every new instance takes the next number of a single run-wide sequence,
/// whatever its key; asking again for an instance that already has a
/// number returns the same number.
#[derive(Debug, Default)]
pub struct CompositeTable {
    last: usize,
    assigned: HashMap<CompositeInstanceKey, usize>,
}

impl CompositeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn number_for(&mut self, frames: &[&AncestorFrame<'_>]) -> usize {
        let key = CompositeKey(frames.iter().map(|f| f.signature.clone()).collect());
        let instance = CompositeInstanceKey {
            key,
            indices: frames.iter().map(|f| f.index).collect(),
        };
        if let Some(&number) = self.assigned.get(&instance) {
            return number;
        }
        self.last += 1;
        self.assigned.insert(instance, self.last);
        self.last
    }
}

/// Which strategy produced an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Anchored,
    GroupOnly,
    Plain,
}

/// Range into `selected` spanning the start anchor to the group anchor.
pub fn anchored_slice(
    chain: &[AncestorFrame<'_>],
    selected: &[usize],
    filter_parent: &str,
) -> Option<RangeInclusive<usize>> {
    let start = selected
        .iter()
        .position(|&pos| chain[pos].predicate.source() == Some(PredicateSource::Attribute))
        .unwrap_or(0);
    let group = selected[start..].iter().position(|&pos| {
        let frame = &chain[pos];
        frame.bare() == filter_parent && !frame.predicate.is_empty()
    })?;
    Some(start..=start + group)
}

/// Range into `selected` holding only the first filter-parent frame.
pub fn group_only_slice(
    chain: &[AncestorFrame<'_>],
    selected: &[usize],
    filter_parent: &str,
) -> Option<RangeInclusive<usize>> {
    let group = selected
        .iter()
        .position(|&pos| chain[pos].bare() == filter_parent)?;
    Some(group..=group)
}

/// Render the grouped address for `slice` (a range into `selected`).
fn render(
    chain: &[AncestorFrame<'_>],
    selected: &[usize],
    slice: RangeInclusive<usize>,
    config: &Config,
    table: &mut CompositeTable,
) -> String {
    let group_pos = selected[*slice.end()];
    let positions = &selected[slice.clone()];
    let frames: Vec<&AncestorFrame<'_>> = positions.iter().map(|&pos| &chain[pos]).collect();
    let number = table.number_for(&frames);

    let mut inner = String::new();
    let mut previous = None;
    for &pos in positions {
        if let Some(prev) = previous {
            inner.push_str(separator(prev, pos));
        }
        let frame = &chain[pos];
        if pos == group_pos {
            inner.push_str(&frame.step_name);
            inner.push_str(frame.predicate.as_str());
        } else {
            inner.push_str(&step(
                &frame.step_name,
                frame.predicate.as_str(),
                frame.index,
                config.always_show_index,
            ));
        }
        previous = Some(pos);
    }

    let mut out = format!("(//{inner})[{number}]");
    let after = &selected[*slice.end() + 1..];
    let last = path::push_selected(&mut out, chain, after, group_pos, config);
    path::push_leaf(&mut out, chain, last);
    out
}

/// Composite address for the leaf at the end of `chain`, falling back
/// through the strategies described at module level.
pub fn assemble(
    chain: &[AncestorFrame<'_>],
    selected: &[usize],
    config: &Config,
    table: &mut CompositeTable,
) -> Option<String> {
    let (strategy, xpath) = assemble_with_strategy(chain, selected, config, table)?;
    trace!(?strategy, "composite addressing");
    Some(xpath)
}

pub fn assemble_with_strategy(
    chain: &[AncestorFrame<'_>],
    selected: &[usize],
    config: &Config,
    table: &mut CompositeTable,
) -> Option<(Strategy, String)> {
    if selected.is_empty() {
        return None;
    }
    if let Some(parent) = config.filter_parent() {
        if let Some(slice) = anchored_slice(chain, selected, parent) {
            return Some((Strategy::Anchored, render(chain, selected, slice, config, table)));
        }
        if let Some(slice) = group_only_slice(chain, selected, parent) {
            return Some((Strategy::GroupOnly, render(chain, selected, slice, config, table)));
        }
    }
    path::assemble(chain, selected, config).map(|xpath| (Strategy::Plain, xpath))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ParsedElement;
    use crate::predicate::PredicateBuilder;
    use crate::signature::{signature, SignatureCounter};

    const DOC: &str = r#"<ROOT>
        <PROPERTY>
            <UNIT ValuationUseType="Main">
                <IMAGE><ImageCategoryType>Front</ImageCategoryType><Caption>Porch</Caption></IMAGE>
                <PHOTO><Caption>Plain</Caption></PHOTO>
            </UNIT>
        </PROPERTY>
    </ROOT>"#;

    /// Frames for the element reached by following `path` from `root`.
    fn chain<'d>(root: &'d ParsedElement, path: &[&str], config: &Config) -> Vec<AncestorFrame<'d>> {
        let mut elements: Vec<&'d ParsedElement> = vec![root];
        for name in path {
            let parent: &'d ParsedElement = elements[elements.len() - 1];
            elements.push(parent.child(name).unwrap());
        }
        let builder = PredicateBuilder::new(config);
        let mut counter = SignatureCounter::new();
        elements
            .into_iter()
            .enumerate()
            .map(|(depth, element)| {
                let step_name = element.name.step_name(&config.namespace_prefix);
                let predicate = builder.predicate_for(element);
                let signature = signature(&step_name, predicate.as_str());
                let index = counter.assign_index(&signature);
                AncestorFrame {
                    element,
                    step_name,
                    predicate,
                    signature,
                    index,
                    group_position: 1,
                    group_len: 1,
                    depth,
                }
            })
            .collect()
    }

    fn config() -> Config {
        Config::default().with_include_elements(["PROPERTY", "UNIT", "IMAGE", "PHOTO"])
    }

    #[test]
    fn anchored_slice_starts_at_attribute_predicate() {
        let root = ParsedElement::parse(DOC).unwrap();
        let config = config();
        let frames = chain(&root, &["PROPERTY", "UNIT", "IMAGE", "Caption"], &config);
        let selected = path::select(&frames, &config);
        assert_eq!(selected, vec![1, 2, 3]);
        assert_eq!(anchored_slice(&frames, &selected, "IMAGE"), Some(1..=2));
    }

    #[test]
    fn anchored_slice_defaults_to_first_selected() {
        let root = ParsedElement::parse(DOC).unwrap();
        let config = config().with_predicate_attribute(None);
        let frames = chain(&root, &["PROPERTY", "UNIT", "IMAGE", "Caption"], &config);
        let selected = path::select(&frames, &config);
        assert_eq!(anchored_slice(&frames, &selected, "IMAGE"), Some(0..=2));
    }

    #[test]
    fn group_only_slice_ignores_missing_predicate() {
        let root = ParsedElement::parse(DOC).unwrap();
        let config = config();
        let frames = chain(&root, &["PROPERTY", "UNIT", "PHOTO", "Caption"], &config);
        let selected = path::select(&frames, &config);
        assert_eq!(anchored_slice(&frames, &selected, "PHOTO"), None);
        assert_eq!(group_only_slice(&frames, &selected, "PHOTO"), Some(2..=2));
    }

    #[test]
    fn strategies_fall_back_in_order() {
        let root = ParsedElement::parse(DOC).unwrap();
        let mut table = CompositeTable::new();

        let config = config();
        let frames = chain(&root, &["PROPERTY", "UNIT", "IMAGE", "Caption"], &config);
        let selected = path::select(&frames, &config);
        let (strategy, xpath) =
            assemble_with_strategy(&frames, &selected, &config, &mut table).unwrap();
        assert_eq!(strategy, Strategy::Anchored);
        assert_eq!(
            xpath,
            "(//d:UNIT[@ValuationUseType='Main']/d:IMAGE[@ImageCategoryType='Front'])[1]//d:Caption"
        );

        let config = config.with_filter_pair(Some("PHOTO".into()), None);
        let frames = chain(&root, &["PROPERTY", "UNIT", "PHOTO", "Caption"], &config);
        let selected = path::select(&frames, &config);
        let (strategy, xpath) =
            assemble_with_strategy(&frames, &selected, &config, &mut table).unwrap();
        assert_eq!(strategy, Strategy::GroupOnly);
        assert_eq!(xpath, "(//d:PHOTO)[2]//d:Caption");

        let config = config.with_filter_pair(Some("GARAGE".into()), None);
        let (strategy, xpath) =
            assemble_with_strategy(&frames, &selected, &config, &mut table).unwrap();
        assert_eq!(strategy, Strategy::Plain);
        assert_eq!(
            xpath,
            "//d:PROPERTY/d:UNIT[@ValuationUseType='Main']/d:PHOTO//d:Caption"
        );
    }

    #[test]
    fn table_reuses_numbers_for_the_same_instance() {
        let root = ParsedElement::parse(DOC).unwrap();
        let config = config();
        let mut frames = chain(&root, &["PROPERTY", "UNIT", "IMAGE"], &config);
        let mut table = CompositeTable::new();

        let refs: Vec<&AncestorFrame<'_>> = frames[1..].iter().collect();
        assert_eq!(table.number_for(&refs), 1);
        assert_eq!(table.number_for(&refs), 1);

        frames[3].index = 2;
        let refs: Vec<&AncestorFrame<'_>> = frames[1..].iter().collect();
        assert_eq!(table.number_for(&refs), 2);

        // A different key continues the same sequence.
        let refs: Vec<&AncestorFrame<'_>> = frames[3..].iter().collect();
        assert_eq!(table.number_for(&refs), 3);
        let refs: Vec<&AncestorFrame<'_>> = frames[1..].iter().collect();
        assert_eq!(table.number_for(&refs), 2);
    }

    const LATE_ANCHOR: &str = r#"<ROOT>
        <PROPERTY>
            <IMAGE>
                <ImageCategoryType>Front</ImageCategoryType>
                <UNIT ValuationUseType="Main"><Caption>Den</Caption></UNIT>
            </IMAGE>
        </PROPERTY>
    </ROOT>"#;

    #[test]
    fn attribute_anchor_below_group_falls_back_to_group_only() {
        let root = ParsedElement::parse(LATE_ANCHOR).unwrap();
        let config = Config::default().with_include_elements(["PROPERTY", "IMAGE", "UNIT"]);
        let frames = chain(&root, &["PROPERTY", "IMAGE", "UNIT", "Caption"], &config);
        let selected = path::select(&frames, &config);
        assert_eq!(selected, vec![1, 2, 3]);
        assert_eq!(anchored_slice(&frames, &selected, "IMAGE"), None);

        let mut table = CompositeTable::new();
        let (strategy, xpath) =
            assemble_with_strategy(&frames, &selected, &config, &mut table).unwrap();
        assert_eq!(strategy, Strategy::GroupOnly);
        assert_eq!(
            xpath,
            "(//d:IMAGE[@ImageCategoryType='Front'])[1]/d:UNIT[@ValuationUseType='Main']//d:Caption"
        );
    }
}
