//! Structural XML parser.
//!
//! Turns the text of one package part into a [`RawNode`] tree. The parser knows
//! nothing about presentation semantics; it keeps attributes, non-blank text and
//! the document order of every element.

use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Malformed XML, with the byte offset where parsing stopped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("at byte {position}: {message}")]
pub struct ParseError {
    pub position: usize,
    pub message: String,
}

impl ParseError {
    fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }

    /// Attach the part path, producing the workspace error.
    pub fn in_part(self, part: &str) -> slideview_core::Error {
        slideview_core::Error::ParseError {
            part: part.to_string(),
            position: self.position,
            message: self.message,
        }
    }
}

/// One element of a parsed part.
///
/// `children` are kept in document order. `order` is a single counter shared by
/// the whole document: the root is 1 and every element opened later gets the
/// next value, so comparing `order` compares document position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawNode {
    /// Qualified tag name, e.g. `p:sp`.
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub children: Vec<RawNode>,
    /// Non-blank character data directly inside this element.
    pub text: Option<String>,
    pub order: u32,
}

impl RawNode {
    /// Tag name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        match self.tag.split_once(':') {
            Some((_, local)) => local,
            None => &self.tag,
        }
    }

    /// Whether the local tag name equals `name`.
    pub fn is(&self, name: &str) -> bool {
        self.local_name() == name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Parse an attribute as an integer; malformed values count as absent.
    pub fn attr_i64(&self, name: &str) -> Option<i64> {
        self.attr(name).and_then(|v| v.trim().parse().ok())
    }

    /// `"1"` or `"true"`.
    pub fn attr_flag(&self, name: &str) -> bool {
        matches!(self.attr(name), Some("1") | Some("true"))
    }

    /// First child with the given local name.
    pub fn child(&self, name: &str) -> Option<&RawNode> {
        self.children.iter().find(|c| c.is(name))
    }

    /// All children with the given local name, in document order.
    ///
    /// Always a list, even for a single occurrence.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a RawNode> + 'a {
        self.children.iter().filter(move |c| c.is(name))
    }

    /// Follow a chain of local names from this node.
    ///
    /// Reserved for free-form data such as chart caches; properties with a
    /// fixed shape are decoded into typed structs instead.
    pub fn path(&self, names: &[&str]) -> Option<&RawNode> {
        names.iter().try_fold(self, |node, name| node.child(name))
    }

    /// Children grouped by qualified tag, groups ordered by first appearance.
    pub fn grouped(&self) -> Vec<(&str, Vec<&RawNode>)> {
        let mut groups: Vec<(&str, Vec<&RawNode>)> = Vec::new();
        for child in &self.children {
            match groups.iter_mut().find(|(tag, _)| *tag == child.tag) {
                Some((_, members)) => members.push(child),
                None => groups.push((child.tag.as_str(), vec![child])),
            }
        }
        groups
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

/// Parse one XML document.
///
/// Comments, processing instructions, the XML declaration and doctype are
/// skipped. Whitespace-only text is dropped; other text (including CDATA) is
/// stored on the enclosing element.
pub fn parse(text: &str) -> Result<RawNode, ParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = Reader::from_str(text);

    let mut stack: Vec<RawNode> = Vec::new();
    let mut root: Option<RawNode> = None;
    let mut counter: u32 = 0;

    loop {
        let position = reader.buffer_position();
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                if root.is_some() {
                    return Err(ParseError::new(position, "content after the root element"));
                }
                counter += 1;
                stack.push(open_element(e, counter, position)?);
            }
            Ok(Event::Empty(ref e)) => {
                if root.is_some() {
                    return Err(ParseError::new(position, "content after the root element"));
                }
                counter += 1;
                let node = open_element(e, counter, position)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => root = Some(node),
                }
            }
            Ok(Event::End(_)) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| ParseError::new(position, "closing tag without an open element"))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => root = Some(node),
                }
            }
            Ok(Event::Text(ref e)) => {
                let value = e
                    .unescape()
                    .map_err(|err| ParseError::new(position, err.to_string()))?;
                push_text(&mut stack, &value);
            }
            Ok(Event::CData(ref e)) => {
                let value = String::from_utf8_lossy(e);
                push_text(&mut stack, &value);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ParseError::new(reader.buffer_position(), e.to_string()));
            }
            // Comments, declarations, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::new(
            reader.buffer_position(),
            format!("unexpected end of input inside <{}>", open.tag),
        ));
    }

    root.ok_or_else(|| ParseError::new(reader.buffer_position(), "document has no root element"))
}

fn open_element(e: &BytesStart<'_>, order: u32, position: usize) -> Result<RawNode, ParseError> {
    let mut attrs = BTreeMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ParseError::new(position, err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| ParseError::new(position, err.to_string()))?
            .into_owned();
        attrs.insert(key, value);
    }

    Ok(RawNode {
        tag: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
        attrs,
        children: Vec::new(),
        text: None,
        order,
    })
}

fn push_text(stack: &mut [RawNode], value: &str) {
    if value.trim().is_empty() {
        return;
    }
    if let Some(node) = stack.last_mut() {
        node.text.get_or_insert_with(String::new).push_str(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sibling_order_is_document_position() {
        let xml = r#"<root><item/><item/><other/><item>x</item><item/></root>"#;
        let root = parse(xml).unwrap();

        assert_eq!(root.order, 1);
        let items: Vec<_> = root.children_named("item").collect();
        assert_eq!(items.len(), 4);
        let orders: Vec<u32> = items.iter().map(|n| n.order).collect();
        assert_eq!(orders, vec![2, 3, 5, 6]);
        assert_eq!(root.child("other").map(|n| n.order), Some(4));
    }

    #[test]
    fn test_counter_is_global_not_per_group() {
        let xml = r#"<a><b><c/><c/></b><b><c/></b></a>"#;
        let root = parse(xml).unwrap();
        let nested: Vec<u32> = root
            .children
            .iter()
            .flat_map(|b| std::iter::once(b.order).chain(b.children.iter().map(|c| c.order)))
            .collect();
        assert_eq!(nested, vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_attributes_and_quotes() {
        let xml = r#"<a:off x="10" y='20' name="a &amp; b"/>"#;
        let node = parse(xml).unwrap();
        assert_eq!(node.tag, "a:off");
        assert_eq!(node.local_name(), "off");
        assert_eq!(node.attr_i64("x"), Some(10));
        assert_eq!(node.attr_i64("y"), Some(20));
        assert_eq!(node.attr("name"), Some("a & b"));
        assert_eq!(node.attr_i64("missing"), None);
    }

    #[test]
    fn test_skips_prolog_comments_and_blank_text() {
        let xml = "\u{feff}<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
                   <!DOCTYPE root>\n\
                   <root>\n  <!-- note -->\n  <t>Hello &lt;world&gt;</t>\n  <t>   </t>\n</root>";
        let root = parse(xml).unwrap();
        assert_eq!(root.text(), None);
        let texts: Vec<_> = root.children_named("t").map(|t| t.text()).collect();
        assert_eq!(texts, vec![Some("Hello <world>"), None]);
    }

    #[test]
    fn test_cdata_is_text() {
        let root = parse("<v><![CDATA[1 < 2]]></v>").unwrap();
        assert_eq!(root.text(), Some("1 < 2"));
    }

    #[test]
    fn test_grouped_view_keeps_first_appearance_order() {
        let root = parse("<r><b/><a/><b/></r>").unwrap();
        let groups = root.grouped();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "b");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "a");
    }

    #[test]
    fn test_path_helper() {
        let root = parse("<c:chartSpace><c:chart><c:plotArea/></c:chart></c:chartSpace>").unwrap();
        assert!(root.path(&["chart", "plotArea"]).is_some());
        assert!(root.path(&["chart", "legend"]).is_none());
    }

    #[test]
    fn test_malformed_input_reports_position() {
        let err = parse("<root><open></root>").unwrap_err();
        assert!(err.position > 0);

        let err = parse("<root><child>").unwrap_err();
        assert!(err.message.contains("unexpected end"));

        assert!(parse("").is_err());
        assert!(parse("<a/><b/>").is_err());
    }
}
