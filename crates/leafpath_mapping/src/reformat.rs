//! `KEY : VALUE` lines to a `<MAPPINGS>` document.

use std::fs;
use std::io::Write;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::{debug, warn};

use crate::error::{MappingError, Result};

/// Separator between a leaf value and its expression.
pub const SEPARATOR: &str = " : ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub key: String,
    pub value: String,
}

/// Split every non-blank line on its first separator.
///
/// Lines without a separator are skipped.
pub fn parse_mapping_lines(text: &str) -> Vec<MappingEntry> {
    let mut entries = Vec::new();
    for (number, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match line.split_once(SEPARATOR) {
            Some((key, value)) => entries.push(MappingEntry {
                key: key.trim().to_string(),
                value: value.trim().to_string(),
            }),
            None => warn!(line = number + 1, "no `{SEPARATOR}` separator, skipping"),
        }
    }
    entries
}

/// Write `entries` as an indented mapping document and hand back the sink.
pub fn write_mapping<W: Write>(entries: &[MappingEntry], out: W) -> Result<W> {
    let mut writer = Writer::new_with_indent(out, b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(MappingError::Xml)?;
    writer
        .write_event(Event::Start(BytesStart::new("MAPPINGS")))
        .map_err(MappingError::Xml)?;
    for entry in entries {
        writer
            .write_event(Event::Start(BytesStart::new("MAPPING")))
            .map_err(MappingError::Xml)?;
        write_text_element(&mut writer, "KEY", &entry.key)?;
        write_text_element(&mut writer, "VALUE", &entry.value)?;
        writer
            .write_event(Event::End(BytesEnd::new("MAPPING")))
            .map_err(MappingError::Xml)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("MAPPINGS")))
        .map_err(MappingError::Xml)?;

    let mut out = writer.into_inner();
    out.write_all(b"\n").map_err(MappingError::Xml)?;
    Ok(out)
}

fn write_text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(MappingError::Xml)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(MappingError::Xml)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(MappingError::Xml)?;
    Ok(())
}

/// Reformat the line file at `input` into a mapping document at `output`.
///
/// Returns the number of entries written.
pub fn reformat_file(input: &Path, output: &Path) -> Result<usize> {
    let text = fs::read_to_string(input).map_err(|source| MappingError::Read {
        path: input.to_path_buf(),
        source,
    })?;
    let entries = parse_mapping_lines(&text);
    let bytes = write_mapping(&entries, Vec::new())?;
    fs::write(output, bytes).map_err(|source| MappingError::Write {
        path: output.to_path_buf(),
        source,
    })?;
    debug!(
        input = %input.display(),
        output = %output.display(),
        entries = entries.len(),
        "wrote mapping"
    );
    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, value: &str) -> MappingEntry {
        MappingEntry {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn splits_on_first_separator_only() {
        let entries = parse_mapping_lines("a : b : c\n");
        assert_eq!(entries, vec![entry("a", "b : c")]);
    }

    #[test]
    fn skips_blank_and_malformed_lines() {
        let text = "\nFront : //d:IMAGE//d:Category\n   \nno separator here\nRear : //d:IMAGE[2]//d:Category";
        let entries = parse_mapping_lines(text);
        assert_eq!(
            entries,
            vec![
                entry("Front", "//d:IMAGE//d:Category"),
                entry("Rear", "//d:IMAGE[2]//d:Category"),
            ]
        );
    }

    #[test]
    fn writes_indented_mapping_document() {
        let bytes = write_mapping(&[entry("Front", "//d:PROPERTY/d:IMAGE//d:Category")], Vec::new()).unwrap();
        let xml = String::from_utf8(bytes).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("\n  <MAPPING>\n"));
        assert!(xml.contains("\n    <KEY>Front</KEY>\n"));
        assert!(xml.contains("<VALUE>//d:PROPERTY/d:IMAGE//d:Category</VALUE>"));
        assert!(xml.ends_with("</MAPPINGS>\n"));
    }

    #[test]
    fn escaped_text_parses_back() {
        let entries = [
            entry("Owner's <main> & \"only\"", "//d:IMAGE[@ImageCategoryType='Front']//d:Caption"),
            entry("second", "//d:Other"),
        ];
        let bytes = write_mapping(&entries, Vec::new()).unwrap();
        let xml = String::from_utf8(bytes).unwrap();
        let doc = roxmltree::Document::parse(&xml).unwrap();

        let parsed: Vec<(String, String)> = doc
            .root_element()
            .children()
            .filter(|n| n.has_tag_name("MAPPING"))
            .map(|m| {
                let text = |tag: &str| {
                    m.children()
                        .find(|c| c.has_tag_name(tag))
                        .and_then(|c| c.text())
                        .unwrap_or_default()
                        .to_string()
                };
                (text("KEY"), text("VALUE"))
            })
            .collect();
        let expected: Vec<(String, String)> = entries
            .iter()
            .map(|e| (e.key.clone(), e.value.clone()))
            .collect();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn empty_input_yields_empty_root() {
        let bytes = write_mapping(&[], Vec::new()).unwrap();
        let xml = String::from_utf8(bytes).unwrap();
        let doc = roxmltree::Document::parse(&xml).unwrap();
        assert!(doc.root_element().has_tag_name("MAPPINGS"));
        assert_eq!(doc.root_element().children().filter(|n| n.is_element()).count(), 0);
    }

    #[derive(Debug)]
    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "sink closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writer_failure_keeps_the_io_error() {
        let err = write_mapping(&[entry("Front", "//d:IMAGE")], FailingSink).unwrap_err();
        match err {
            MappingError::Xml(source) => assert_eq!(source.kind(), std::io::ErrorKind::BrokenPipe),
            other => panic!("expected an XML output error, got {other:?}"),
        }
    }

    #[test]
    fn missing_input_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = reformat_file(&dir.path().join("none.txt"), &dir.path().join("out.xml")).unwrap_err();
        assert!(matches!(err, MappingError::Read { .. }));
    }
}
