use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::walker::LeafStats;

/// One leaf value and the expression that locates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub text: String,
    pub xpath: String,
}

impl fmt::Display for OutputLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.text, self.xpath)
    }
}

/// Result of one run over one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// Lines in traversal order, duplicates kept.
    pub lines: Vec<OutputLine>,
    pub stats: LeafStats,
}

impl Report {
    /// Lines joined by `\n`, without header or trailing newline.
    pub fn render(&self) -> String {
        render_lines(&self.lines)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.render()).map_err(|source| Error::OutputWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}

pub fn render_lines(lines: &[OutputLine]) -> String {
    lines
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
