//! Pretty-printing of XML attachments for the rendered view.
//!
//! Elements are re-indented four spaces per level. Elements holding only
//! text either wrap it onto its own indented lines or, with
//! `keep_text_on_same_line`, keep it between the tags. CDATA sections are
//! reproduced as written. The declaration, the doctype and comments around
//! the root element are kept.

use log::debug;
use roxmltree::{Document, Node, NodeType, ParsingOptions};
use thiserror::Error;

const INDENT: &str = "    ";

/// Errors that can occur while formatting XML.
#[derive(Debug, Error)]
pub enum XmlFormatError {
    #[error("Failed to parse XML: {0}")]
    Parse(#[from] roxmltree::Error),

    #[error("Content is not valid {encoding}")]
    Decode { encoding: String },
}

/// The `<?xml ...?>` declaration at the very start of `xml`, or `""`.
pub fn xml_declaration(xml: &str) -> &str {
    if !xml.starts_with("<?xml") {
        return "";
    }
    xml.find("?>").map(|end| &xml[..end + 2]).unwrap_or("")
}

/// The encoding named by a declaration, `ASCII` if it names none.
pub fn encoding_from_declaration(declaration: &str) -> &str {
    const SEARCH: &str = "encoding=";

    let Some(index) = declaration.find(SEARCH) else {
        return "ASCII";
    };
    let value = &declaration[index + SEARCH.len()..];
    let Some(quote) = value.chars().next() else {
        return "ASCII";
    };
    value[1..].split(quote).next().unwrap_or("ASCII")
}

/// Decode raw attachment bytes. UTF-16 is recognized by its byte order mark
/// or by the first `<`; everything else must be UTF-8 (ASCII included).
pub fn decode_xml(bytes: &[u8]) -> Result<String, XmlFormatError> {
    match bytes {
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
        [b'<', 0, ..] => decode_utf16(bytes, u16::from_le_bytes),
        [0, b'<', ..] => decode_utf16(bytes, u16::from_be_bytes),
        _ => {
            let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
            String::from_utf8(bytes.to_vec()).map_err(|_| {
                let head = String::from_utf8_lossy(&bytes[..bytes.len().min(100)]);
                XmlFormatError::Decode {
                    encoding: encoding_from_declaration(xml_declaration(&head)).to_string(),
                }
            })
        }
    }
}

fn decode_utf16(bytes: &[u8], read: fn([u8; 2]) -> u16) -> Result<String, XmlFormatError> {
    let invalid = || XmlFormatError::Decode {
        encoding: "UTF-16".to_string(),
    };
    if bytes.len() % 2 != 0 {
        return Err(invalid());
    }

    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| read([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).map_err(|_| invalid())
}

/// Re-indent `xml` consistently.
///
/// # Example
/// ```ignore
/// let pretty = prettify_xml("<root><child>text</child></root>", true)?;
/// assert_eq!(pretty, "<root>\n    <child>text</child>\n</root>\n");
/// ```
pub fn prettify_xml(xml: &str, keep_text_on_same_line: bool) -> Result<String, XmlFormatError> {
    if xml.is_empty() {
        return Ok(String::new());
    }

    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let document = Document::parse_with_options(xml, options)?;
    let formatter = XmlFormatter {
        source: xml,
        keep_text_on_same_line,
    };

    let mut out = String::new();
    let declaration = xml_declaration(xml);
    if !declaration.is_empty() {
        out.push_str(declaration);
        out.push('\n');
    }

    let root_start = document.root_element().range().start;
    if let Some(doctype) = find_doctype(&xml[..root_start]) {
        format_doctype(doctype, &mut out);
    }

    for node in document.root().children() {
        formatter.format_node(node, 0, &mut out);
    }

    debug!(
        "Formatted {} bytes of XML into {} bytes",
        xml.len(),
        out.len()
    );
    Ok(out)
}

/// Prettify `xml` and wrap each non-blank line in `<pre>` for display.
pub fn render_xml_lines(
    xml: &str,
    keep_text_on_same_line: bool,
) -> Result<Vec<String>, XmlFormatError> {
    Ok(prettify_xml(xml, keep_text_on_same_line)?
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| format!("<pre>{}</pre>", escape_markup(line)))
        .collect())
}

/// Escape text for inclusion in HTML or XML content.
pub(crate) fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn escape_attribute(value: &str) -> String {
    escape_markup(value).replace('"', "&quot;")
}

struct XmlFormatter<'a> {
    source: &'a str,
    keep_text_on_same_line: bool,
}

impl<'a> XmlFormatter<'a> {
    fn format_node(&self, node: Node, level: usize, out: &mut String) {
        let indent = INDENT.repeat(level);
        match node.node_type() {
            NodeType::Element => self.format_element(node, level, out),
            NodeType::Comment => {
                out.push_str(&format!("{}<!--{}-->\n", indent, node.text().unwrap_or("")));
            }
            NodeType::PI => {
                if let Some(pi) = node.pi() {
                    match pi.value {
                        Some(value) => {
                            out.push_str(&format!("{}<?{} {}?>\n", indent, pi.target, value))
                        }
                        None => out.push_str(&format!("{}<?{}?>\n", indent, pi.target)),
                    }
                }
            }
            NodeType::Root | NodeType::Text => {}
        }
    }

    fn format_element(&self, node: Node, level: usize, out: &mut String) {
        let indent = INDENT.repeat(level);
        let name = element_name(node);
        let open = open_tag(node, &name);

        let children: Vec<Node> = node.children().filter(|c| !c.is_text()).collect();
        if !children.is_empty() {
            out.push_str(&format!("{}{}>\n", indent, open));
            for child in children {
                self.format_node(child, level + 1, out);
            }
            out.push_str(&format!("{}</{}>\n", indent, name));
            return;
        }

        let text = self.element_text(node);
        if text.is_empty() {
            out.push_str(&format!("{}{} />\n", indent, open));
        } else if self.keep_text_on_same_line {
            out.push_str(&format!("{}{}>{}</{}>\n", indent, open, text, name));
        } else {
            out.push_str(&format!(
                "{}{}>\n{}\n{}</{}>\n",
                indent,
                open,
                indent_text(&text, level + 1),
                indent,
                name
            ));
        }
    }

    /// Trimmed text of a text-only element. Content containing CDATA is
    /// taken verbatim from the source so the section survives.
    fn element_text(&self, node: Node) -> String {
        let inner = self.inner_source(node);
        if inner.contains("<![CDATA[") {
            return inner.trim().to_string();
        }
        node.text()
            .map(|text| escape_markup(text.trim()))
            .unwrap_or_default()
    }

    fn inner_source(&self, node: Node) -> &'a str {
        let element = &self.source[node.range()];
        let Some(start) = start_tag_end(element) else {
            return "";
        };
        let end = element.rfind("</").unwrap_or(element.len());
        if start >= end {
            ""
        } else {
            &element[start..end]
        }
    }
}

fn indent_text(text: &str, level: usize) -> String {
    let indent = INDENT.repeat(level);
    text.split('\n')
        .map(|line| format!("{}{}", indent, line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn qualified_name(node: Node, namespace: Option<&str>, local: &str) -> String {
    match namespace.and_then(|uri| node.lookup_prefix(uri)) {
        Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, local),
        _ => local.to_string(),
    }
}

fn element_name(node: Node) -> String {
    let tag = node.tag_name();
    qualified_name(node, tag.namespace(), tag.name())
}

/// `<name` followed by the namespace declarations made on this element and
/// its attributes, in document order.
fn open_tag(node: Node, name: &str) -> String {
    let inherited: Vec<(Option<&str>, &str)> = node
        .parent_element()
        .map(|parent| parent.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();

    let mut tag = format!("<{}", name);
    for ns in node.namespaces() {
        if ns.name() == Some("xml") || inherited.contains(&(ns.name(), ns.uri())) {
            continue;
        }
        match ns.name() {
            Some(prefix) => tag.push_str(&format!(" xmlns:{}=\"{}\"", prefix, escape_attribute(ns.uri()))),
            None => tag.push_str(&format!(" xmlns=\"{}\"", escape_attribute(ns.uri()))),
        }
    }
    for attribute in node.attributes() {
        tag.push_str(&format!(
            " {}=\"{}\"",
            qualified_name(node, attribute.namespace(), attribute.name()),
            escape_attribute(attribute.value())
        ));
    }
    tag
}

/// Byte offset just past the `>` closing the markup at the start of `text`,
/// skipping quoted values.
fn start_tag_end(text: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in text.char_indices() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (None, '>') => return Some(i + 1),
            _ => {}
        }
    }
    None
}

fn find_doctype(prolog: &str) -> Option<&str> {
    let start = prolog.find("<!DOCTYPE")?;
    let rest = &prolog[start..];
    let close = rest.find('>')?;

    let end = match rest.find('[') {
        Some(open) if open < close => {
            let bracket = open + rest[open..].find(']')?;
            bracket + rest[bracket..].find('>')? + 1
        }
        _ => close + 1,
    };
    Some(&rest[..end])
}

fn format_doctype(doctype: &str, out: &mut String) {
    let (Some(open), Some(close)) = (doctype.find('['), doctype.rfind(']')) else {
        out.push_str(doctype);
        out.push('\n');
        return;
    };

    out.push_str(doctype[..open].trim_end());
    out.push_str(" [\n");
    for declaration in split_declarations(&doctype[open + 1..close]) {
        out.push_str(INDENT);
        out.push_str(declaration);
        out.push('\n');
    }
    out.push_str("]>\n");
}

/// Markup declarations of an internal DTD subset.
fn split_declarations(subset: &str) -> Vec<&str> {
    let mut declarations = Vec::new();
    let mut rest = subset;

    while let Some(start) = rest.find('<') {
        rest = &rest[start..];
        let end = if rest.starts_with("<!--") {
            rest.find("-->").map(|i| i + 3)
        } else {
            start_tag_end(rest)
        };
        let Some(end) = end else {
            declarations.push(rest.trim());
            break;
        };
        declarations.push(&rest[..end]);
        rest = &rest[end..];
    }

    declarations
}
