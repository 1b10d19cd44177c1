//! HTML parsing support.
//!
//! This module provides functionality to parse HTML strings and convert them
//! to the Node structure used by the converter.

use scraper::{ElementRef, Html, Node as ScraperNode};

use crate::node::Node;

/// Parse an HTML fragment into a document fragment Node.
///
/// The fragment is parsed with html5ever's fragment algorithm, so stray end
/// tags and unclosed elements are repaired the way a browser would repair a
/// clipboard payload.
///
/// # Example
///
/// ```rust
/// use govspeak_paste::{parse_html, PasteService};
///
/// let node = parse_html("<h3>Eligibility</h3>");
///
/// let service = PasteService::new();
/// assert_eq!(service.convert_node(&node), "### Eligibility");
/// ```
pub fn parse_html(html: &str) -> Node {
    let document = Html::parse_fragment(html);

    // html5ever wraps the fragment in a synthetic <html> element
    let mut fragment = Node::document_fragment();
    fragment.children = convert_children(document.root_element());
    fragment
}

fn convert_children(element: ElementRef) -> Vec<Node> {
    element
        .children()
        .filter_map(|child| match child.value() {
            ScraperNode::Text(text) => Some(Node::text(&text.text)),
            ScraperNode::Comment(comment) => Some(Node::comment(&comment.comment)),
            ScraperNode::Element(_) => ElementRef::wrap(child).map(scraper_to_node),
            _ => None,
        })
        .collect()
}

/// Convert a scraper ElementRef to our Node structure
fn scraper_to_node(element: ElementRef) -> Node {
    let tag = element.value().name();
    let attrs: Vec<(&str, &str)> = element.value().attrs().collect();

    let mut node = Node::element_with_attrs(tag, attrs);
    node.children = convert_children(element);
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeType;

    #[test]
    fn test_parse_returns_fragment() {
        let node = parse_html("<p>Hello World</p>");
        assert_eq!(node.node_type, NodeType::DocumentFragment);
        assert_eq!(node.children.len(), 1);
        assert_eq!(node.children[0].tag_name(), "p");
        assert_eq!(node.text_content(), "Hello World");
    }

    #[test]
    fn test_parse_keeps_attributes() {
        let node = parse_html(r#"<abbr title="Her Majesty's Government">HMG</abbr>"#);
        let abbr = &node.children[0];
        assert_eq!(abbr.attr("title"), Some("Her Majesty's Government"));
    }

    #[test]
    fn test_parse_lowercases_tags() {
        let node = parse_html("<P><B>Loud</B></P>");
        assert_eq!(node.children[0].tag_name(), "p");
        assert_eq!(node.children[0].children[0].tag_name(), "b");
    }

    #[test]
    fn test_parse_keeps_comments_for_normalization() {
        let node = parse_html("<p>a<!-- note -->b</p>");
        let p = &node.children[0];
        assert_eq!(p.children.len(), 3);
        assert_eq!(p.text_content(), "ab");
    }
}
