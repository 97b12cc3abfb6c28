//! Render an actual tree back into template text

use super::node::{normalize_whitespace, SnapshotNode};

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Tag every element with `[ref=eN]` in document order
    pub refs: bool,
}

/// Render `node` as a one-root template
///
/// Parsing the output and comparing it against `node` always matches.
pub fn render(node: &SnapshotNode, options: RenderOptions) -> String {
    let mut out = String::new();
    let mut next_ref = 1;
    render_node(node, 0, options, &mut next_ref, &mut out);
    out
}

fn render_node(
    node: &SnapshotNode,
    depth: usize,
    options: RenderOptions,
    next_ref: &mut usize,
    out: &mut String,
) {
    let indent = "  ".repeat(depth);

    if node.is_text() {
        let text = node.name.as_deref().unwrap_or("");
        out.push_str(&format!("{}- text: {}\n", indent, text_value(text)));
        return;
    }

    let mut header = node.role.clone();
    if let Some(name) = &node.name {
        header.push_str(&format!(" \"{}\"", escape_name(name)));
    }
    for (key, value) in node.attributes.iter().filter(|(k, _)| !k.starts_with('/')) {
        header.push_str(&format!(" [{}={}]", key, attribute_value(value)));
    }
    if options.refs {
        header.push_str(&format!(" [ref=e{}]", next_ref));
        *next_ref += 1;
    }
    let header = yaml_key(&header);

    let properties: Vec<_> = node
        .attributes
        .iter()
        .filter(|(k, _)| k.starts_with('/'))
        .collect();

    match node.children.as_slice() {
        [] if properties.is_empty() => {
            out.push_str(&format!("{}- {}\n", indent, header));
        }
        [only] if properties.is_empty() && only.is_text() => {
            let text = only.name.as_deref().unwrap_or("");
            out.push_str(&format!("{}- {}: {}\n", indent, header, text_value(text)));
        }
        children => {
            out.push_str(&format!("{}- {}:\n", indent, header));
            for (key, value) in properties {
                out.push_str(&format!("{}  - {}: {}\n", indent, key, quoted(value)));
            }
            for child in children {
                render_node(child, depth + 1, options, next_ref, out);
            }
        }
    }
}

fn escape_name(name: &str) -> String {
    name.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
}

/// Double-quoted YAML scalar; JSON string syntax is valid YAML
fn quoted(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", escape_name(value)))
}

/// Attribute values are written bare unless trimming or `]` would change them
fn attribute_value(value: &str) -> String {
    let needs_quotes = value != value.trim()
        || value.starts_with('"')
        || value.contains(|c: char| c == ']' || c == '\n' || c == '\t');
    if needs_quotes {
        format!("\"{}\"", escape_name(value))
    } else {
        value.to_string()
    }
}

/// Inline text, anchored as a pattern when it would otherwise read as one
///
/// The pattern is built from the whitespace-normalized text since that is
/// what inline text is compared against.
fn text_value(text: &str) -> String {
    if text.len() >= 2 && text.starts_with('/') && text.ends_with('/') {
        let pattern = regex::escape(&normalize_whitespace(text)).replace('/', "\\/");
        quoted(&format!("/^{}$/", pattern))
    } else {
        quoted(text)
    }
}

/// Single-quote a header when YAML would not read it back as a plain string
fn yaml_key(header: &str) -> String {
    let needs_quotes = header.contains(": ")
        || header.contains(" #")
        || header.ends_with(':')
        || header.starts_with(|c: char| "-?:,[]{}#&*!|>'\"%@`".contains(c));
    if needs_quotes {
        format!("'{}'", header.replace('\'', "''"))
    } else {
        header.to_string()
    }
}
