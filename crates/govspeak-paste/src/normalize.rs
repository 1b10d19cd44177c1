//! Tree normalization run before any rule sees the input.
//!
//! Non-content elements are removed with their subtrees, then whitespace is
//! collapsed the way a browser would lay it out, so rules only ever see text
//! whose spaces are significant.

use crate::node::{Node, NodeType};
use crate::options::Options;
use crate::utilities::collapse_whitespace;

/// Normalize `root` in place.
pub(crate) fn normalize(root: &mut Node, options: &Options) {
    let removed = strip_removed(root, options);
    if removed > 0 {
        tracing::debug!(removed, "Stripped non-content nodes");
    }
    collapse_tree_whitespace(root);
    drop_empty_text(root);
}

/// Remove comments and elements listed in `options.remove`.
fn strip_removed(node: &mut Node, options: &Options) -> usize {
    let before = node.children.len();
    node.children.retain(|child| match child.node_type {
        NodeType::Comment => false,
        NodeType::Element => !options.is_removed(&child.tag),
        _ => true,
    });

    let mut removed = before - node.children.len();
    for child in &mut node.children {
        removed += strip_removed(child, options);
    }
    removed
}

/// What an element means for the whitespace around it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    /// Block elements and `br` end a line: trailing space before them is
    /// dropped and leading space after them too.
    Block,
    /// Void elements break the text run but keep the following space.
    Void,
    Inline,
}

enum Token<'a> {
    Text(&'a mut String),
    Boundary(Boundary),
}

fn boundary_for(node: &Node) -> Boundary {
    if node.is_block() || node.tag == "br" {
        Boundary::Block
    } else if node.is_void() {
        Boundary::Void
    } else {
        Boundary::Inline
    }
}

/// Flatten the tree into document order, visiting elements on entry and exit.
/// `pre` content is left out so it keeps its whitespace.
fn tokenize<'a>(node: &'a mut Node, out: &mut Vec<Token<'a>>) {
    for child in node.children.iter_mut() {
        match child.node_type {
            NodeType::Text => {
                if let Some(value) = child.value.as_mut() {
                    out.push(Token::Text(value));
                }
            }
            NodeType::Element => {
                let boundary = boundary_for(child);
                let is_pre = child.tag == "pre";
                out.push(Token::Boundary(boundary));
                if boundary != Boundary::Void {
                    if !is_pre {
                        tokenize(child, out);
                    }
                    out.push(Token::Boundary(boundary));
                }
            }
            _ => {}
        }
    }
}

fn collapse_tree_whitespace(root: &mut Node) {
    let mut tokens = Vec::new();
    tokenize(root, &mut tokens);

    let mut prev_text: Option<&mut String> = None;
    let mut keep_leading_ws = false;

    for token in tokens {
        match token {
            Token::Text(text) => {
                let mut collapsed = collapse_whitespace(text);
                let after_space = prev_text.as_ref().map_or(true, |p| p.ends_with(' '));
                if after_space && !keep_leading_ws && collapsed.starts_with(' ') {
                    collapsed.remove(0);
                }
                *text = collapsed;
                if !text.is_empty() {
                    prev_text = Some(text);
                }
            }
            Token::Boundary(Boundary::Block) => {
                if let Some(prev) = prev_text.take() {
                    trim_trailing_space(prev);
                }
                keep_leading_ws = false;
            }
            Token::Boundary(Boundary::Void) => {
                prev_text = None;
                keep_leading_ws = true;
            }
            Token::Boundary(Boundary::Inline) => {
                if prev_text.is_some() {
                    keep_leading_ws = false;
                }
            }
        }
    }

    if let Some(prev) = prev_text {
        trim_trailing_space(prev);
    }
}

fn trim_trailing_space(text: &mut String) {
    if text.ends_with(' ') {
        text.pop();
    }
}

fn drop_empty_text(node: &mut Node) {
    node.children
        .retain(|child| !(child.is_text() && child.value.as_deref().map_or(true, str::is_empty)));
    for child in &mut node.children {
        drop_empty_text(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(children: Vec<Node>) -> Node {
        let mut p = Node::element("p");
        for child in children {
            p.add_child(child);
        }
        p
    }

    fn fragment(children: Vec<Node>) -> Node {
        let mut root = Node::document_fragment();
        for child in children {
            root.add_child(child);
        }
        root
    }

    #[test]
    fn test_strips_removed_elements_and_comments() {
        let mut script = Node::element("script");
        script.add_child(Node::text("alert(1)"));
        let mut root = fragment(vec![
            p(vec![Node::text("kept"), script]),
            Node::comment("gone"),
            Node::element("iframe"),
        ]);

        normalize(&mut root, &Options::default());

        assert_eq!(root.children.len(), 1);
        assert_eq!(root.text_content(), "kept");
    }

    #[test]
    fn test_collapses_runs_and_trims_block_edges() {
        let mut root = fragment(vec![
            Node::text("\n  "),
            p(vec![Node::text("  Hello \n\t world  ")]),
            Node::text("\n"),
        ]);

        normalize(&mut root, &Options::default());

        assert_eq!(root.children.len(), 1);
        assert_eq!(root.text_content(), "Hello world");
    }

    #[test]
    fn test_keeps_single_space_between_inline_runs() {
        let mut span = Node::element("span");
        span.add_child(Node::text(" "));
        let mut root = fragment(vec![p(vec![
            Node::text("Hello"),
            span,
            Node::text("World"),
        ])]);

        normalize(&mut root, &Options::default());

        assert_eq!(root.text_content(), "Hello World");
    }

    #[test]
    fn test_drops_space_after_space() {
        let mut span = Node::element("span");
        span.add_child(Node::text(" "));
        let mut root = fragment(vec![p(vec![
            Node::text("Hello "),
            span,
            Node::text(" World"),
        ])]);

        normalize(&mut root, &Options::default());

        assert_eq!(root.text_content(), "Hello World");
        // the span lost its only text node
        assert!(root.children[0].children[1].children.is_empty());
    }

    #[test]
    fn test_leaves_pre_untouched() {
        let mut pre = Node::element("pre");
        pre.add_child(Node::text("  indented\n    code"));
        let mut root = fragment(vec![pre]);

        normalize(&mut root, &Options::default());

        assert_eq!(root.text_content(), "  indented\n    code");
    }

    #[test]
    fn test_space_after_void_element_kept() {
        let mut root = fragment(vec![p(vec![
            Node::text("a"),
            Node::element("img"),
            Node::text(" b"),
        ])]);

        normalize(&mut root, &Options::default());

        assert_eq!(root.text_content(), "a b");
    }
}
