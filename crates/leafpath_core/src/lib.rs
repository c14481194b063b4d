//! leafpath core
//!
//! Turns an XML document (typically a real-estate valuation feed) into a
//! flat list of `text : xpath` lines, one for every leaf element that has
//! text and sits below at least one configured element type.
//!
//! Paths are stable and short: each step carries at most one predicate, and
//! a numeric index only when the same step has been seen before in document
//! order. Repeating container pairs can optionally be addressed as a unit
//! with `(//outer/inner)[n]`.
//!
//! # Example
//!
//! ```rust
//! use leafpath_core::{generate, Config};
//!
//! let xml = r#"<d:VALUATION xmlns:d="urn:example">
//!   <d:PROPERTY>
//!     <d:IMAGE><d:Category>Front</d:Category></d:IMAGE>
//!   </d:PROPERTY>
//! </d:VALUATION>"#;
//!
//! let config = Config::default().with_predicate_attribute(None).with_filter_pair(None, None);
//! let report = generate(xml, &config).unwrap();
//! assert_eq!(report.render(), "Front : //d:PROPERTY/d:IMAGE//d:Category");
//! ```

use std::path::Path;

use tracing::{debug, warn};

pub mod composite;
pub mod config;
pub mod document;
pub mod error;
pub mod literal;
pub mod output;
pub mod path;
pub mod predicate;
pub mod signature;
pub mod step;
pub mod tag;
pub mod walker;

pub use config::{Addressing, Config};
pub use document::ParsedElement;
pub use error::{Error, Result};
pub use literal::literal;
pub use output::{OutputLine, Report};
pub use walker::{AncestorFrame, LeafStats, Walker};

/// Address every leaf of `source`.
///
/// Each call starts from fresh counters; nothing carries over between
/// documents.
pub fn generate(source: &str, config: &Config) -> Result<Report> {
    debug!(?config, "effective configuration");
    let root = ParsedElement::parse(source)?;
    let report = Walker::new(config).walk(&root);

    let stats = report.stats;
    debug!(
        total_leaves = stats.total_leaves,
        included_leaves = stats.included_leaves,
        emitted = stats.emitted,
        "leaf summary"
    );
    if stats.emitted == 0 {
        warn!(
            total_leaves = stats.total_leaves,
            included_leaves = stats.included_leaves,
            "no lines emitted; check includeElements"
        );
    }
    Ok(report)
}

/// Read `path` and address every leaf in it.
pub fn generate_file(path: &Path, config: &Config) -> Result<Report> {
    let source = std::fs::read_to_string(path).map_err(|source| Error::InputRead {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = source.len(), "read input");
    generate(&source, config)
}
