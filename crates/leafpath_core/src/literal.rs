/// Format `value` as an XPath 1.0 string literal.
///
/// XPath literals have no escape syntax, so a value holding both quote
/// characters is assembled with `concat()` from single-quoted runs and a
/// double-quoted `"'"` for every apostrophe.
pub fn literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    if !value.contains('"') {
        return format!("\"{value}\"");
    }

    let mut parts = Vec::new();
    let mut segments = value.split('\'').peekable();
    while let Some(segment) = segments.next() {
        if !segment.is_empty() {
            parts.push(format!("'{segment}'"));
        }
        if segments.peek().is_some() {
            parts.push("\"'\"".to_string());
        }
    }
    format!("concat({})", parts.join(", "))
}
