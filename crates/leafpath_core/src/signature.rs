use std::collections::HashMap;

/// Structural identity of a step: the emitted tag plus its predicate.
///
/// Built before any index is known, so the index never feeds back into it.
pub fn signature(step_name: &str, predicate: &str) -> String {
    format!("{step_name}{predicate}")
}

/// Running, document-order count of every signature seen during one run.
#[derive(Debug, Default)]
pub struct SignatureCounter {
    counts: HashMap<String, usize>,
}

impl SignatureCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one more instance of `signature` and return its 1-based index.
    pub fn assign_index(&mut self, signature: &str) -> usize {
        if let Some(count) = self.counts.get_mut(signature) {
            *count += 1;
            return *count;
        }
        self.counts.insert(signature.to_string(), 1);
        1
    }
}
