//! Document-order traversal and leaf classification.

use tracing::trace;

use crate::composite::{self, CompositeTable};
use crate::config::{Addressing, Config};
use crate::document::ParsedElement;
use crate::output::{OutputLine, Report};
use crate::path;
use crate::predicate::{Predicate, PredicateBuilder};
use crate::signature::{signature, SignatureCounter};

/// One element on the path from the document element down to the node
/// being visited. Frames live only as long as that path is being walked.
#[derive(Debug, Clone)]
pub struct AncestorFrame<'d> {
    pub element: &'d ParsedElement,
    /// Tag as written in emitted steps.
    pub step_name: String,
    pub predicate: Predicate,
    pub signature: String,
    /// Document-order index among all instances sharing `signature`.
    pub index: usize,
    /// 1-based position among same-tag siblings.
    pub group_position: usize,
    pub group_len: usize,
    /// Position in the ancestor chain; 0 is the document element.
    pub depth: usize,
}

impl AncestorFrame<'_> {
    pub fn bare(&self) -> &str {
        self.element.name.bare()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeafStats {
    /// Every element without element children.
    pub total_leaves: usize,
    /// Leaves with at least one included element on their chain.
    pub included_leaves: usize,
    pub emitted: usize,
}

/// Mutable state of a single run. Built fresh for every document.
#[derive(Debug, Default)]
pub struct TraversalContext {
    pub signatures: SignatureCounter,
    pub composites: CompositeTable,
    lines: Vec<OutputLine>,
    stats: LeafStats,
}

impl TraversalContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn finish(self) -> Report {
        Report {
            lines: self.lines,
            stats: self.stats,
        }
    }
}

pub struct Walker<'c> {
    config: &'c Config,
    predicates: PredicateBuilder<'c>,
}

impl<'c> Walker<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self {
            config,
            predicates: PredicateBuilder::new(config),
        }
    }

    /// Walk the tree rooted at `root` and collect one line per addressable leaf.
    pub fn walk(&self, root: &ParsedElement) -> Report {
        let mut cx = TraversalContext::new();
        let mut chain = Vec::new();
        self.visit_group(&[root], &mut chain, &mut cx);
        cx.finish()
    }

    fn visit_group<'d>(
        &self,
        members: &[&'d ParsedElement],
        chain: &mut Vec<AncestorFrame<'d>>,
        cx: &mut TraversalContext,
    ) {
        for (i, &element) in members.iter().enumerate() {
            let frame = self.frame(element, i + 1, members.len(), chain.len(), cx);
            chain.push(frame);
            if element.is_leaf() {
                self.visit_leaf(chain, cx);
            } else {
                for group in element.sibling_groups() {
                    self.visit_group(&group.members, chain, cx);
                }
            }
            chain.pop();
        }
    }

    fn frame<'d>(
        &self,
        element: &'d ParsedElement,
        group_position: usize,
        group_len: usize,
        depth: usize,
        cx: &mut TraversalContext,
    ) -> AncestorFrame<'d> {
        let step_name = element.name.step_name(&self.config.namespace_prefix);
        let predicate = self.predicates.predicate_for(element);
        let signature = signature(&step_name, predicate.as_str());
        let index = cx.signatures.assign_index(&signature);
        AncestorFrame {
            element,
            step_name,
            predicate,
            signature,
            index,
            group_position,
            group_len,
            depth,
        }
    }

    fn visit_leaf(&self, chain: &[AncestorFrame<'_>], cx: &mut TraversalContext) {
        cx.stats.total_leaves += 1;

        let selected = path::select(chain, self.config);
        if selected.is_empty() {
            return;
        }
        cx.stats.included_leaves += 1;

        let Some(leaf) = chain.last() else {
            return;
        };
        let text = leaf.element.trimmed_text();
        if text.is_empty() {
            return;
        }

        let xpath = match self.config.addressing {
            Addressing::Plain => path::assemble(chain, &selected, self.config),
            Addressing::Composite => {
                composite::assemble(chain, &selected, self.config, &mut cx.composites)
            }
        };
        let Some(xpath) = xpath else {
            return;
        };

        trace!(
            leaf = %leaf.element.name,
            depth = leaf.depth,
            group_position = leaf.group_position,
            group_len = leaf.group_len,
            %xpath,
            "addressed leaf"
        );
        cx.stats.emitted += 1;
        cx.lines.push(OutputLine {
            text: text.to_string(),
            xpath,
        });
    }
}
