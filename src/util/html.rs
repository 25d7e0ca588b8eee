use scraper::{Html, Node};
use serde_json::Value;

/// Elements whose text is never rendered.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "template"];

/// Flatten rich-text HTML into plain text.
///
/// Visible text nodes are trimmed, empty ones dropped, and the rest joined with a single
/// space in document order. A single pair of wrapping double quotes is then
/// removed. Parsing is tolerant: any string input produces some text.
pub fn normalize(raw: Option<&str>) -> String {
    let raw = match raw {
        Some(r) if !r.is_empty() => r,
        _ => return String::new(),
    };

    let fragment = Html::parse_fragment(raw);
    let text = fragment
        .root_element()
        .descendants()
        .filter(|node| {
            !node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|e| HIDDEN_ELEMENTS.contains(&e.name()))
            })
        })
        .filter_map(|node| match node.value() {
            Node::Text(text) => Some(text.trim()),
            _ => None,
        })
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    strip_wrapping_quotes(&text).to_string()
}

/// Normalize a raw backend field value. Null and missing become empty text.
pub fn normalize_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => normalize(Some(s)),
        Some(other) => normalize(Some(&other.to_string())),
    }
}

fn strip_wrapping_quotes(text: &str) -> &str {
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        &text[1..text.len() - 1]
    } else {
        text
    }
}
