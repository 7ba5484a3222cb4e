use std::collections::BTreeMap;

use evs_core::{EventScriptError, SourceLocation, SourceSpan};
use roxmltree::{Document, Node, NodeType};

#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub root: XmlElement,
}

/// Owned element tree. Event-sheet documents never interleave text
/// and child elements, so inline text is accumulated per element
/// instead of being kept as separate child nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub text: String,
    pub children: Vec<XmlElement>,
    pub location: SourceSpan,
}

impl XmlElement {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// First child element with the given tag name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |child| child.name == name)
    }
}

pub fn parse_xml_document(source: &str) -> Result<XmlDocument, EventScriptError> {
    let document = Document::parse(source)
        .map_err(|error| EventScriptError::new("XML_PARSE_ERROR", error.to_string()))?;

    let Some(root) = document.root().children().find(|node| node.is_element()) else {
        return Err(EventScriptError::new(
            "XML_PARSE_ERROR",
            "XML document must contain a root element.",
        ));
    };

    Ok(XmlDocument {
        root: parse_element(&document, root),
    })
}

fn parse_element(document: &Document<'_>, node: Node<'_, '_>) -> XmlElement {
    let mut attributes = BTreeMap::new();
    for attribute in node.attributes() {
        attributes.insert(attribute.name().to_string(), attribute.value().to_string());
    }

    let mut text = String::new();
    let mut children = Vec::new();
    for child in node.children() {
        match child.node_type() {
            NodeType::Element => children.push(parse_element(document, child)),
            NodeType::Text => text.push_str(child.text().unwrap_or_default()),
            _ => {}
        }
    }

    XmlElement {
        name: node.tag_name().name().to_string(),
        attributes,
        text,
        children,
        location: node_span(document, node.range().start, node.range().end),
    }
}

fn node_span(document: &Document<'_>, start: usize, end: usize) -> SourceSpan {
    let start_pos = document.text_pos_at(start);
    let end_pos = document.text_pos_at(end);
    SourceSpan {
        start: SourceLocation {
            line: start_pos.row as usize,
            column: start_pos.col as usize,
        },
        end: SourceLocation {
            line: end_pos.row as usize,
            column: end_pos.col as usize,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_xml_document_builds_tree_with_attributes_and_text() {
        let source = r#"<Events><Event kind="Comment"><Comment>note</Comment></Event></Events>"#;
        let document = parse_xml_document(source).expect("xml should parse");
        assert_eq!(document.root.name, "Events");
        assert_eq!(document.root.children.len(), 1);

        let event = &document.root.children[0];
        assert_eq!(event.attribute("kind"), Some("Comment"));
        let comment = event.child("Comment").expect("comment child should exist");
        assert_eq!(comment.text, "note");
        assert!(comment.location.start.line >= 1);
    }

    #[test]
    fn parse_xml_document_accumulates_text_around_comments() {
        let source = "<Events><Comment>a<!--ignored-->b</Comment></Events>";
        let document = parse_xml_document(source).expect("xml should parse");
        let comment = document.root.child("Comment").expect("comment child");
        assert_eq!(comment.text, "ab");
    }

    #[test]
    fn children_named_filters_by_tag() {
        let source = "<Events><Event/><Other/><Event/></Events>";
        let document = parse_xml_document(source).expect("xml should parse");
        assert_eq!(document.root.children_named("Event").count(), 2);
    }

    #[test]
    fn parse_xml_document_returns_parse_error_for_invalid_xml() {
        let error = parse_xml_document("<Events>").expect_err("invalid xml should fail");
        assert_eq!(error.code, "XML_PARSE_ERROR");
    }

    #[test]
    fn parse_xml_document_returns_parse_error_when_root_element_is_missing() {
        let error = parse_xml_document("<?xml version=\"1.0\"?><!---->")
            .expect_err("missing root element should fail");
        assert_eq!(error.code, "XML_PARSE_ERROR");
    }
}
