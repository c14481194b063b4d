//! Companions to the leafpath engine.
//!
//! - [`reformat`] turns `KEY : VALUE` lines (the engine's output) into a
//!   mapping XML document.
//! - [`sync`] copies one classification field between two documents,
//!   matching elements by a shared discriminator.

pub mod error;
pub mod reformat;
pub mod sync;

pub use error::{MappingError, Result};
pub use reformat::{parse_mapping_lines, reformat_file, write_mapping, MappingEntry};
pub use sync::{apply_classifications, collect_classifications, sync_files, SyncOptions, SyncReport};
