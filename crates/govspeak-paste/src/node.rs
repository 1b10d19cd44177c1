//! DOM node structure for HTML to Govspeak conversion.
//!
//! Any parser can build this tree; [`parse_html`](crate::parse_html) does it
//! with html5ever. Rules never see a [`Node`] directly but a [`NodeRef`],
//! which also knows the node's parent and position so that contextual rules
//! (list numbering, sibling repairs) can look around.

use indexmap::IndexMap;

use crate::utilities::{is_block, is_meaningful_when_blank, is_void};

/// Node types matching DOM nodeType values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// Element node (nodeType = 1)
    Element = 1,
    /// Text node (nodeType = 3)
    Text = 3,
    /// Comment node (nodeType = 8)
    Comment = 8,
    /// Document fragment node (nodeType = 11)
    DocumentFragment = 11,
}

/// An owned node of the parsed input tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Node type
    pub node_type: NodeType,

    /// Lowercase tag name for elements, `#text`, `#comment` or
    /// `#document-fragment` otherwise
    pub tag: String,

    /// Character data for text and comment nodes
    pub value: Option<String>,

    /// Attributes keyed by lowercase name, in source order
    pub attributes: IndexMap<String, String>,

    /// Child nodes
    pub children: Vec<Node>,
}

impl Node {
    fn with_type(node_type: NodeType, tag: &str, value: Option<&str>) -> Self {
        Self {
            node_type,
            tag: tag.to_string(),
            value: value.map(str::to_string),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Create a new element node
    pub fn element(tag_name: &str) -> Self {
        Self::with_type(NodeType::Element, &tag_name.to_lowercase(), None)
    }

    /// Create a new element node with attributes
    pub fn element_with_attrs(tag_name: &str, attrs: Vec<(&str, &str)>) -> Self {
        let mut node = Self::element(tag_name);
        for (name, value) in attrs {
            node.set_attr(name, value);
        }
        node
    }

    /// Create a new text node
    pub fn text(content: &str) -> Self {
        Self::with_type(NodeType::Text, "#text", Some(content))
    }

    /// Create a new comment node
    pub fn comment(content: &str) -> Self {
        Self::with_type(NodeType::Comment, "#comment", Some(content))
    }

    /// Create a document fragment node
    pub fn document_fragment() -> Self {
        Self::with_type(NodeType::DocumentFragment, "#document-fragment", None)
    }

    /// Check if this is an element node
    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }

    /// Check if this is a text node
    pub fn is_text(&self) -> bool {
        self.node_type == NodeType::Text
    }

    /// Get the tag name (lowercase)
    pub fn tag_name(&self) -> &str {
        &self.tag
    }

    /// Get an attribute value by name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name.to_lowercase().as_str())
            .map(String::as_str)
    }

    /// Check if an attribute exists
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Get all child nodes
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.children.iter()
    }

    /// Get only element children
    pub fn element_children(&self) -> impl Iterator<Item = &Node> {
        self.children().filter(|n| n.is_element())
    }

    /// Add a child node
    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Set an attribute, replacing any existing value
    pub fn set_attr(&mut self, name: &str, value: &str) {
        self.attributes
            .insert(name.to_lowercase(), value.to_string());
    }

    /// Get all text content from this node and descendants
    pub fn text_content(&self) -> String {
        match self.node_type {
            NodeType::Text => self.value.clone().unwrap_or_default(),
            NodeType::Comment => String::new(),
            _ => self.children().map(Node::text_content).collect(),
        }
    }

    /// Check if this is a block-level element
    pub fn is_block(&self) -> bool {
        self.is_element() && is_block(&self.tag)
    }

    /// Check if this is a void element
    pub fn is_void(&self) -> bool {
        self.is_element() && is_void(&self.tag)
    }

    /// An element with nothing worth converting: whitespace-only text and no
    /// void or meaningful-when-blank element anywhere inside it.
    pub fn is_blank(&self) -> bool {
        self.is_element()
            && !self.is_void()
            && !is_meaningful_when_blank(&self.tag)
            && self.text_content().trim().is_empty()
            && !self.has_descendant(&|n: &Node| n.is_void() || is_meaningful_when_blank(&n.tag))
    }

    fn has_descendant(&self, predicate: &dyn Fn(&Node) -> bool) -> bool {
        self.element_children()
            .any(|child| predicate(child) || child.has_descendant(predicate))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Whitespace facts about the text content of a subtree.
///
/// Built bottom-up in one pass so that blank checks and flanking whitespace
/// do not rebuild `text_content()` at every level of nesting. `children`
/// lines up with the node's own children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TextSummary {
    /// Leading whitespace; the whole text when it is whitespace-only
    leading: String,
    /// Trailing whitespace; empty when the text is whitespace-only
    trailing: String,
    whitespace_only: bool,
    /// This node or a descendant is void or meaningful when blank
    keeps_content: bool,
    children: Vec<TextSummary>,
}

impl TextSummary {
    pub(crate) fn of(node: &Node) -> Self {
        match node.node_type {
            NodeType::Text => {
                let text = node.value.as_deref().unwrap_or_default();
                let (leading, trailing) = whitespace_edges(text);
                Self {
                    leading: leading.to_string(),
                    trailing: trailing.to_string(),
                    whitespace_only: leading.len() == text.len(),
                    ..Default::default()
                }
            }
            NodeType::Comment => Self {
                whitespace_only: true,
                ..Default::default()
            },
            _ => {
                let children: Vec<TextSummary> = node.children.iter().map(Self::of).collect();
                let whitespace_only = children.iter().all(|c| c.whitespace_only);

                let mut leading = String::new();
                for child in &children {
                    leading.push_str(&child.leading);
                    if !child.whitespace_only {
                        break;
                    }
                }

                let mut trailing = String::new();
                if !whitespace_only {
                    let mut parts = Vec::new();
                    for child in children.iter().rev() {
                        if child.whitespace_only {
                            parts.push(child.leading.as_str());
                        } else {
                            parts.push(child.trailing.as_str());
                            break;
                        }
                    }
                    trailing = parts.into_iter().rev().collect();
                }

                let keeps_content = (node.is_element()
                    && (node.is_void() || is_meaningful_when_blank(&node.tag)))
                    || children.iter().any(|c| c.keeps_content);

                Self {
                    leading,
                    trailing,
                    whitespace_only,
                    keeps_content,
                    children,
                }
            }
        }
    }

    fn starts_with_space(&self) -> bool {
        self.leading.starts_with(' ')
    }

    fn ends_with_space(&self) -> bool {
        if self.whitespace_only {
            self.leading.ends_with(' ')
        } else {
            self.trailing.ends_with(' ')
        }
    }
}

/// `(leading, trailing)` whitespace of `text`; all-whitespace text counts as
/// leading only.
fn whitespace_edges(text: &str) -> (&str, &str) {
    let body = text.trim_start();
    let leading = &text[..text.len() - body.len()];
    let trailing = &body[body.trim_end().len()..];
    (leading, trailing)
}

/// A reference to a node with parent context.
/// This allows sibling and parent lookups without storing parent pointers.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    /// The node itself
    pub node: &'a Node,
    parent: Option<&'a Node>,
    index: usize,
    /// Summary of the parent's subtree, when the caller built one
    summary: Option<&'a TextSummary>,
}

impl<'a> NodeRef<'a> {
    /// Create a new NodeRef without parent context
    pub fn new(node: &'a Node) -> Self {
        Self {
            node,
            parent: None,
            index: 0,
            summary: None,
        }
    }

    /// Create a NodeRef for the child at `index` of `parent`
    pub fn with_parent(node: &'a Node, parent: &'a Node, index: usize) -> Self {
        Self {
            node,
            parent: Some(parent),
            index,
            summary: None,
        }
    }

    /// Answer whitespace queries from `parent_summary`, the summary of the
    /// parent this reference was built with.
    pub(crate) fn with_summary(mut self, parent_summary: &'a TextSummary) -> Self {
        self.summary = Some(parent_summary);
        self
    }

    fn summary_at(&self, index: usize) -> Option<&'a TextSummary> {
        self.summary?.children.get(index)
    }

    pub(crate) fn own_summary(&self) -> Option<&'a TextSummary> {
        self.summary_at(self.index)
    }

    /// Get the parent node if known
    pub fn parent(&self) -> Option<&'a Node> {
        self.parent
    }

    /// Get the parent tag name if known
    pub fn parent_tag(&self) -> Option<&'a str> {
        self.parent.map(Node::tag_name)
    }

    fn preceding(&self) -> &'a [Node] {
        self.parent
            .and_then(|p| p.children.get(..self.index))
            .unwrap_or(&[])
    }

    /// The node immediately before this one, of any type
    pub fn previous_sibling(&self) -> Option<&'a Node> {
        self.preceding().last()
    }

    /// The node immediately after this one, of any type
    pub fn next_sibling(&self) -> Option<&'a Node> {
        self.parent?.children.get(self.index + 1)
    }

    /// The closest preceding sibling that is an element
    pub fn previous_element_sibling(&self) -> Option<&'a Node> {
        self.preceding().iter().rev().find(|n| n.is_element())
    }

    /// Zero-based position among the parent's `tag` children, ignoring
    /// every other node.
    pub fn position_among(&self, tag: &str) -> usize {
        self.preceding()
            .iter()
            .filter(|n| n.is_element() && n.tag == tag)
            .count()
    }

    /// Zero-based position among the parent's element children
    pub fn element_index(&self) -> usize {
        self.preceding().iter().filter(|n| n.is_element()).count()
    }

    /// Whether this node is the last element child of its parent
    pub fn is_last_element_child(&self) -> bool {
        self.parent
            .and_then(|p| p.element_children().last())
            .is_some_and(|last| std::ptr::eq(last, self.node))
    }

    /// Whitespace to keep outside the rule output, as `(leading, trailing)`.
    ///
    /// Block nodes have none. For inline nodes it is the whitespace at the
    /// edges of the text content, minus the ASCII part of an edge when the
    /// adjacent sibling already supplies a space on that side.
    pub fn flanking_whitespace(&self) -> (String, String) {
        if self.node.is_block() {
            return (String::new(), String::new());
        }

        let text;
        let (leading, trailing) = match self.own_summary() {
            Some(summary) => (summary.leading.as_str(), summary.trailing.as_str()),
            None => {
                text = self.node.text_content();
                whitespace_edges(&text)
            }
        };
        let edges = EdgeWhitespace::from_edges(leading, trailing);

        let leading = if edges.leading_ascii && self.is_flanked_by_whitespace(Side::Left) {
            edges.leading_non_ascii
        } else {
            edges.leading
        };
        let trailing = if edges.trailing_ascii && self.is_flanked_by_whitespace(Side::Right) {
            edges.trailing_non_ascii
        } else {
            edges.trailing
        };

        (leading.to_string(), trailing.to_string())
    }

    fn is_flanked_by_whitespace(&self, side: Side) -> bool {
        let index = match side {
            Side::Left => match self.index.checked_sub(1) {
                Some(index) => index,
                None => return false,
            },
            Side::Right => self.index + 1,
        };
        let Some(sibling) = self.parent.and_then(|p| p.children.get(index)) else {
            return false;
        };

        match sibling.node_type {
            NodeType::Text => {
                let text = sibling.value.as_deref().unwrap_or_default();
                match side {
                    Side::Left => text.ends_with(' '),
                    Side::Right => text.starts_with(' '),
                }
            }
            NodeType::Element if !sibling.is_block() => match self.summary_at(index) {
                Some(summary) => match side {
                    Side::Left => summary.ends_with_space(),
                    Side::Right => summary.starts_with_space(),
                },
                None => {
                    let text = sibling.text_content();
                    match side {
                        Side::Left => text.ends_with(' '),
                        Side::Right => text.starts_with(' '),
                    }
                }
            },
            _ => false,
        }
    }

    /// Delegate to Node methods
    pub fn is_element(&self) -> bool {
        self.node.is_element()
    }

    pub fn is_text(&self) -> bool {
        self.node.is_text()
    }

    pub fn is_block(&self) -> bool {
        self.node.is_block()
    }

    pub fn is_blank(&self) -> bool {
        match self.own_summary() {
            Some(summary) => {
                self.node.is_element() && summary.whitespace_only && !summary.keeps_content
            }
            None => self.node.is_blank(),
        }
    }

    pub fn tag_name(&self) -> &'a str {
        self.node.tag_name()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.node.attr(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.node.has_attr(name)
    }

    pub fn children(&self) -> impl Iterator<Item = &'a Node> {
        self.node.children()
    }

    pub fn element_children(&self) -> impl Iterator<Item = &'a Node> {
        self.node.element_children()
    }

    pub fn text_content(&self) -> String {
        self.node.text_content()
    }
}

/// Leading and trailing whitespace of a string, split into the ASCII run
/// on the outside and any other whitespace (such as `&nbsp;`) inside it.
struct EdgeWhitespace<'t> {
    leading: &'t str,
    leading_non_ascii: &'t str,
    leading_ascii: bool,
    trailing: &'t str,
    trailing_non_ascii: &'t str,
    trailing_ascii: bool,
}

impl<'t> EdgeWhitespace<'t> {
    fn from_edges(leading: &'t str, trailing: &'t str) -> Self {
        let is_ascii_ws = |c: char| matches!(c, ' ' | '\t' | '\r' | '\n');

        let leading_non_ascii = leading.trim_start_matches(is_ascii_ws);
        let leading_ascii = leading_non_ascii.len() < leading.len();

        let trailing_non_ascii = trailing.trim_end_matches(is_ascii_ws);
        let trailing_ascii = trailing_non_ascii.len() < trailing.len();

        Self {
            leading,
            leading_non_ascii,
            leading_ascii,
            trailing,
            trailing_non_ascii,
            trailing_ascii,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str) -> Node {
        let mut span = Node::element("span");
        span.add_child(Node::text(text));
        span
    }

    #[test]
    fn test_create_element() {
        let node = Node::element("DIV");
        assert!(node.is_element());
        assert_eq!(node.tag_name(), "div");
        assert!(node.is_block());
    }

    #[test]
    fn test_create_text() {
        let node = Node::text("Hello World");
        assert!(node.is_text());
        assert_eq!(node.text_content(), "Hello World");
    }

    #[test]
    fn test_attributes() {
        let node = Node::element_with_attrs(
            "abbr",
            vec![("TITLE", "United Kingdom"), ("class", "x")],
        );
        assert_eq!(node.attr("title"), Some("United Kingdom"));
        assert_eq!(node.attr("Class"), Some("x"));
        assert_eq!(node.attr("href"), None);
        assert!(node.has_attr("title"));
    }

    #[test]
    fn test_children() {
        let mut parent = Node::element("div");
        parent.add_child(Node::text("Hello"));
        parent.add_child(Node::element("span"));
        parent.add_child(Node::comment("ignored"));
        parent.add_child(Node::text("World"));

        assert_eq!(parent.children().count(), 4);
        assert_eq!(parent.element_children().count(), 1);
        assert_eq!(parent.text_content(), "HelloWorld");
    }

    #[test]
    fn test_is_blank() {
        assert!(span("  ").is_blank());
        assert!(!span("x").is_blank());
        assert!(!Node::element("img").is_blank());
        assert!(!Node::element("a").is_blank());

        let mut p = Node::element("p");
        p.add_child(Node::element("br"));
        assert!(!p.is_blank());
    }

    #[test]
    fn test_siblings() {
        let mut ol = Node::element("ol");
        ol.add_child(Node::element("li"));
        ol.add_child(Node::text(" "));
        ol.add_child(Node::element("script"));
        ol.add_child(Node::element("li"));

        let last = NodeRef::with_parent(&ol.children[3], &ol, 3);
        assert_eq!(last.parent_tag(), Some("ol"));
        assert_eq!(last.position_among("li"), 1);
        assert_eq!(last.element_index(), 2);
        assert_eq!(last.previous_element_sibling().map(Node::tag_name), Some("script"));
        assert!(last.next_sibling().is_none());
        assert!(last.is_last_element_child());

        let first = NodeRef::with_parent(&ol.children[0], &ol, 0);
        assert!(first.previous_sibling().is_none());
        assert!(first.next_sibling().is_some_and(Node::is_text));
        assert!(!first.is_last_element_child());
    }

    #[test]
    fn test_flanking_whitespace_kept_between_words() {
        let mut p = Node::element("p");
        p.add_child(Node::text("Hello"));
        p.add_child(span(" "));
        p.add_child(Node::text("World"));

        let node = NodeRef::with_parent(&p.children[1], &p, 1);
        assert_eq!(node.flanking_whitespace(), (" ".to_string(), String::new()));
    }

    #[test]
    fn test_flanking_whitespace_dropped_next_to_space() {
        let mut p = Node::element("p");
        p.add_child(Node::text("Hello "));
        p.add_child(span(" there "));
        p.add_child(Node::text(" again"));

        let node = NodeRef::with_parent(&p.children[1], &p, 1);
        assert_eq!(node.flanking_whitespace(), (String::new(), String::new()));
    }

    #[test]
    fn test_flanking_whitespace_keeps_nbsp() {
        let mut p = Node::element("p");
        p.add_child(Node::text("a "));
        p.add_child(span(" \u{a0}b"));

        let node = NodeRef::with_parent(&p.children[1], &p, 1);
        assert_eq!(node.flanking_whitespace(), ("\u{a0}".to_string(), String::new()));
    }

    #[test]
    fn test_text_summary_matches_text_content() {
        let mut inner = span(" \u{a0}mid ");
        inner.add_child(Node::comment("x"));
        let mut p = Node::element("p");
        p.add_child(span("  "));
        p.add_child(Node::text(" lead"));
        p.add_child(inner);
        p.add_child(Node::text("  "));

        let summary = TextSummary::of(&p);
        let text = p.text_content();
        let (leading, trailing) = whitespace_edges(&text);
        assert_eq!(summary.leading, leading);
        assert_eq!(summary.trailing, trailing);
        assert!(!summary.whitespace_only);
        assert_eq!(summary.children.len(), p.children.len());
    }

    #[test]
    fn test_summary_answers_match_direct_queries() {
        let mut link = Node::element_with_attrs("a", vec![("href", "/x")]);
        link.add_child(Node::text(" "));
        let mut p = Node::element("p");
        p.add_child(Node::text("Hello"));
        p.add_child(span(" there "));
        p.add_child(span("  "));
        p.add_child(link);
        p.add_child(span("again "));
        p.add_child(Node::text("end"));

        let summary = TextSummary::of(&p);
        for index in 0..p.children.len() {
            let direct = NodeRef::with_parent(&p.children[index], &p, index);
            let summarized = direct.with_summary(&summary);
            assert_eq!(direct.flanking_whitespace(), summarized.flanking_whitespace(), "{index}");
            assert_eq!(direct.is_blank(), summarized.is_blank(), "{index}");
        }
    }

    #[test]
    fn test_summary_keeps_void_descendants() {
        let mut p = Node::element("p");
        let mut wrapper = span(" ");
        wrapper.add_child(Node::element("img"));
        p.add_child(wrapper);

        let summary = TextSummary::of(&p);
        let node = NodeRef::with_parent(&p.children[0], &p, 0).with_summary(&summary);
        assert!(summary.whitespace_only);
        assert!(!node.is_blank());
    }

    #[test]
    fn test_block_has_no_flanking_whitespace() {
        let mut p = Node::element("p");
        p.add_child(Node::text(" padded "));
        let node = NodeRef::new(&p);
        assert_eq!(node.flanking_whitespace(), (String::new(), String::new()));
    }
}
