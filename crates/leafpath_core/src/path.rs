//! Ancestor filtering and plain path assembly.

use crate::config::Config;
use crate::step::step;
use crate::walker::AncestorFrame;

/// Positions in `chain` of the frames whose bare tag is included.
pub fn select(chain: &[AncestorFrame<'_>], config: &Config) -> Vec<usize> {
    chain
        .iter()
        .enumerate()
        .filter(|(_, frame)| config.includes(frame.bare()))
        .map(|(pos, _)| pos)
        .collect()
}

/// `/` between parent and child, `//` when included ancestors were skipped.
pub fn separator(previous: usize, next: usize) -> &'static str {
    if next == previous + 1 {
        "/"
    } else {
        "//"
    }
}

pub(crate) fn indexed_step(frame: &AncestorFrame<'_>, config: &Config) -> String {
    step(
        &frame.step_name,
        frame.predicate.as_str(),
        frame.index,
        config.always_show_index,
    )
}

/// Append selected frames after `previous`, joining each by adjacency.
pub(crate) fn push_selected(
    out: &mut String,
    chain: &[AncestorFrame<'_>],
    positions: &[usize],
    mut previous: usize,
    config: &Config,
) -> usize {
    for &pos in positions {
        out.push_str(separator(previous, pos));
        out.push_str(&indexed_step(&chain[pos], config));
        previous = pos;
    }
    previous
}

/// Append the leaf as a descendant step when it was not itself selected.
///
/// The leaf never carries a numeric index, even among same-named siblings.
pub(crate) fn push_leaf(out: &mut String, chain: &[AncestorFrame<'_>], last_selected: usize) {
    let Some(leaf) = chain.last() else {
        return;
    };
    if leaf.bare() == chain[last_selected].bare() {
        return;
    }
    out.push_str("//");
    out.push_str(&leaf.step_name);
    out.push_str(leaf.predicate.as_str());
}

/// Plain filtered path: `//A/B//C//leaf`.
///
/// Returns `None` when no frame of the chain is selected.
pub fn assemble(chain: &[AncestorFrame<'_>], selected: &[usize], config: &Config) -> Option<String> {
    let (&first, rest) = selected.split_first()?;
    let mut out = String::from("//");
    out.push_str(&indexed_step(&chain[first], config));
    let last = push_selected(&mut out, chain, rest, first, config);
    push_leaf(&mut out, chain, last);
    Some(out)
}
