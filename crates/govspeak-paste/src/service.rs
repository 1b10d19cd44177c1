//! PasteService - the main entry point for HTML to Govspeak conversion.

#[cfg(feature = "html")]
use crate::html::parse_html;
use crate::node::{Node, NodeRef, NodeType, TextSummary};
use crate::normalize::normalize;
use crate::options::Options;
use crate::post_process::PostProcessor;
use crate::rules::{Accumulator, Rule, Rules};
use crate::utilities::join;
use crate::Result;

/// State owned by a single conversion: one accumulator per rule slot.
///
/// Created fresh for every call and dropped when it returns, so nothing a
/// rule records can reach another conversion.
struct ConversionContext {
    accumulators: Vec<Accumulator>,
}

impl ConversionContext {
    fn new(slots: usize) -> Self {
        Self {
            accumulators: vec![Accumulator::new(); slots],
        }
    }

    fn accumulator(&mut self, slot: usize) -> &mut Accumulator {
        &mut self.accumulators[slot]
    }
}

/// The main service for converting pasted HTML to Govspeak.
///
/// A service is immutable once built and can be shared between threads;
/// each conversion keeps its own state.
pub struct PasteService {
    options: Options,
    rules: Rules,
    post_processor: PostProcessor,
}

impl PasteService {
    /// Create a PasteService with the default options and Govspeak rules
    pub fn new() -> Self {
        Self {
            options: Options::default(),
            rules: Rules::govspeak(),
            post_processor: PostProcessor::default(),
        }
    }

    /// Create a PasteService with custom options
    pub fn with_options(options: Options) -> Result<Self> {
        Self::with_rules(options, Rules::govspeak())
    }

    /// Create a PasteService with custom options and rule table
    pub fn with_rules(options: Options, rules: Rules) -> Result<Self> {
        options.validate()?;
        let post_processor = PostProcessor::new(&options)?;
        Ok(Self {
            options,
            rules,
            post_processor,
        })
    }

    /// Add a custom rule, checked before the existing ones
    pub fn add_rule(&mut self, key: &str, rule: Rule) -> &mut Self {
        self.rules.add(key, rule);
        self
    }

    /// Strip elements with this tag, and their content, before conversion
    pub fn remove(&mut self, tag: &str) -> &mut Self {
        if !self.options.is_removed(tag) {
            self.options.remove.push(tag.to_lowercase());
        }
        self
    }

    /// Get the current options
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Get the rule table
    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Convert an HTML fragment to Govspeak
    #[cfg(feature = "html")]
    pub fn convert_html(&self, html: &str) -> String {
        self.convert_node(&parse_html(html))
    }

    /// Convert a node tree to Govspeak.
    ///
    /// A document fragment converts its children; any other node converts
    /// itself.
    pub fn convert_node(&self, node: &Node) -> String {
        let _span = tracing::debug_span!("convert").entered();

        let mut root = match node.node_type {
            NodeType::DocumentFragment => node.clone(),
            _ => {
                let mut fragment = Node::document_fragment();
                fragment.add_child(node.clone());
                fragment
            }
        };
        normalize(&mut root, &self.options);

        let summary = TextSummary::of(&root);
        let mut ctx = ConversionContext::new(self.rules.len());
        let output = self.process(&root, &summary, &mut ctx);
        let output = self.append_collected(output, &mut ctx);

        let govspeak = self.post_processor.run(trim_document(&output));
        tracing::debug!(
            input_nodes = count_nodes(&root),
            output_bytes = govspeak.len(),
            "Converted to govspeak"
        );
        govspeak
    }

    /// Convert the children of `parent`, in document order
    fn process(&self, parent: &Node, summary: &TextSummary, ctx: &mut ConversionContext) -> String {
        let mut output = String::new();

        for (index, child) in parent.children.iter().enumerate() {
            let replacement = match child.node_type {
                NodeType::Text => child.value.clone().unwrap_or_default(),
                NodeType::Element => {
                    let node = NodeRef::with_parent(child, parent, index).with_summary(summary);
                    self.replacement_for_node(&node, ctx)
                }
                _ => String::new(),
            };
            output = join(&output, &replacement);
        }

        output
    }

    fn replacement_for_node(&self, node: &NodeRef, ctx: &mut ConversionContext) -> String {
        let content = match node.own_summary() {
            Some(summary) => self.process(node.node, summary, ctx),
            None => self.process(node.node, &TextSummary::of(node.node), ctx),
        };

        let (leading, trailing) = node.flanking_whitespace();
        let content = if leading.is_empty() && trailing.is_empty() {
            content
        } else {
            content.trim().to_string()
        };

        let replacement = if node.is_blank() {
            blank_replacement(node)
        } else {
            match self.rules.for_node(node, &self.options) {
                Some((slot, rule)) => {
                    rule.replace(node, &content, &self.options, ctx.accumulator(slot))
                }
                None => default_replacement(node, &content),
            }
        };

        format!("{leading}{replacement}{trailing}")
    }

    /// Let every rule with a finalizer add what it collected
    fn append_collected(&self, mut output: String, ctx: &mut ConversionContext) -> String {
        for (slot, rule) in self.rules.iter().enumerate() {
            if let Some(appended) = rule.finalize(ctx.accumulator(slot), &self.options) {
                output = join(&output, &appended);
            }
        }
        output
    }
}

impl Default for PasteService {
    fn default() -> Self {
        Self::new()
    }
}

/// Nothing to convert: keep block spacing, drop inline wrappers
fn blank_replacement(node: &NodeRef) -> String {
    if node.is_block() {
        "\n\n".to_string()
    } else {
        String::new()
    }
}

/// No rule matched: block wrappers keep their spacing, inline ones vanish
fn default_replacement(node: &NodeRef, content: &str) -> String {
    if node.is_block() {
        format!("\n\n{}\n\n", content)
    } else {
        content.to_string()
    }
}

/// Leading newlines and trailing whitespace of the whole document
fn trim_document(output: &str) -> &str {
    output
        .trim_start_matches(['\t', '\r', '\n'])
        .trim_end()
}

fn count_nodes(node: &Node) -> usize {
    1 + node.children.iter().map(count_nodes).sum::<usize>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Filter;

    fn text_element(tag: &str, text: &str) -> Node {
        let mut node = Node::element(tag);
        node.add_child(Node::text(text));
        node
    }

    #[test]
    fn test_simple_paragraph() {
        let service = PasteService::new();
        let result = service.convert_node(&text_element("p", "Hello World"));
        assert_eq!(result, "Hello World");
    }

    #[test]
    fn test_heading_levels() {
        let service = PasteService::new();
        for (tag, expected) in [
            ("h1", "## Title"),
            ("h2", "## Title"),
            ("h3", "### Title"),
            ("h4", "### Title"),
            ("h5", "### Title"),
            ("h6", "Title"),
        ] {
            assert_eq!(service.convert_node(&text_element(tag, "Title")), expected, "{tag}");
        }
    }

    #[test]
    fn test_emphasis_is_dropped() {
        let service = PasteService::new();
        let mut p = Node::element("p");
        p.add_child(text_element("b", "Bold"));
        p.add_child(Node::text(" and "));
        p.add_child(text_element("i", "Italic"));
        assert_eq!(service.convert_node(&p), "Bold and Italic");
    }

    #[test]
    fn test_inline_link() {
        let service = PasteService::new();
        let mut a = Node::element_with_attrs(
            "a",
            vec![("href", "https://www.gov.uk"), ("title", "GOV.UK")],
        );
        a.add_child(Node::text("Link"));
        assert_eq!(service.convert_node(&a), "[Link](https://www.gov.uk)");
    }

    #[test]
    fn test_empty_link_is_dropped() {
        let service = PasteService::new();
        let mut a = Node::element_with_attrs("a", vec![("href", "https://www.gov.uk")]);
        a.add_child(Node::element_with_attrs("img", vec![("src", "logo.png")]));
        assert_eq!(service.convert_node(&a), "");
    }

    #[test]
    fn test_unknown_inline_element_keeps_text() {
        let service = PasteService::new();
        let mut p = Node::element("p");
        p.add_child(text_element("span", "kept"));
        p.add_child(text_element("mark", " too"));
        assert_eq!(service.convert_node(&p), "kept too");
    }

    #[test]
    fn test_unknown_block_element_is_separated() {
        let service = PasteService::new();
        let mut root = Node::document_fragment();
        root.add_child(text_element("div", "One"));
        root.add_child(text_element("div", "Two"));
        assert_eq!(service.convert_node(&root), "One\n\nTwo");
    }

    #[test]
    fn test_whitespace_span_keeps_words_apart() {
        let service = PasteService::new();
        let mut p = Node::element("p");
        p.add_child(Node::text("Hello"));
        p.add_child(text_element("span", " "));
        p.add_child(Node::text("World"));
        assert_eq!(service.convert_node(&p), "Hello World");
    }

    #[test]
    fn test_flanking_whitespace_moves_outside_link() {
        let service = PasteService::new();
        let mut p = Node::element("p");
        p.add_child(Node::text("Read"));
        let mut a = Node::element_with_attrs("a", vec![("href", "/guidance")]);
        a.add_child(Node::text(" the guidance "));
        p.add_child(a);
        p.add_child(Node::text("now"));
        assert_eq!(service.convert_node(&p), "Read [the guidance](/guidance) now");
    }

    #[test]
    fn test_abbreviations_do_not_leak_between_calls() {
        let service = PasteService::new();
        let mut abbr = Node::element_with_attrs("abbr", vec![("title", "United Kingdom")]);
        abbr.add_child(Node::text("UK"));

        assert_eq!(service.convert_node(&abbr), "UK\n\n*[UK]: United Kingdom");
        assert_eq!(service.convert_node(&text_element("p", "Plain")), "Plain");
    }

    #[test]
    fn test_remove_strips_content() {
        let mut service = PasteService::new();
        service.remove("aside");
        let mut root = Node::document_fragment();
        root.add_child(text_element("aside", "Advert"));
        root.add_child(text_element("p", "Body"));
        assert_eq!(service.convert_node(&root), "Body");
    }

    #[test]
    fn test_custom_rule_takes_priority() {
        let mut service = PasteService::new();
        service.add_rule(
            "callout",
            Rule::new(
                Filter::predicate(|tag, node, _| {
                    tag == "div" && node.attr("class") == Some("call-to-action")
                }),
                |_, content, _| format!("\n\n$CTA\n{}\n$CTA\n\n", content.trim()),
            ),
        );
        let mut div = Node::element_with_attrs("div", vec![("class", "call-to-action")]);
        div.add_child(text_element("p", "Apply now"));
        assert_eq!(service.convert_node(&div), "$CTA\nApply now\n$CTA");
    }

    #[test]
    fn test_with_options_validates() {
        let options = Options {
            bullet_list_marker: '#',
            ..Default::default()
        };
        assert!(PasteService::with_options(options).is_err());
    }

    #[test]
    fn test_custom_bullet_and_indent() {
        let options = Options {
            bullet_list_marker: '*',
            list_indent: "  ".to_string(),
            ..Default::default()
        };
        let service = PasteService::with_options(options).unwrap();

        let mut nested = Node::element("ul");
        nested.add_child(text_element("li", "Inner"));
        let mut outer_item = text_element("li", "Outer");
        outer_item.add_child(nested);
        let mut ul = Node::element("ul");
        ul.add_child(outer_item);

        assert_eq!(service.convert_node(&ul), "* Outer\n  * Inner");
    }

    #[test]
    fn test_default_rules_without_govspeak() {
        let service = PasteService::with_rules(Options::default(), Rules::new()).unwrap();
        let mut p = Node::element("p");
        p.add_child(text_element("strong", "bold"));
        p.add_child(Node::text(" and "));
        p.add_child(text_element("em", "soft"));
        assert_eq!(service.convert_node(&p), "**bold** and _soft_");
        assert_eq!(service.convert_node(&text_element("h2", "Title")), "## Title");
        assert_eq!(service.convert_node(&text_element("h4", "Deep")), "#### Deep");
    }

    #[test]
    fn test_emphasis_delimiters_only_reach_default_rules() {
        let options = Options {
            strong_delimiter: "__".to_string(),
            em_delimiter: '*',
            ..Default::default()
        };
        let mut p = Node::element("p");
        p.add_child(text_element("strong", "bold"));
        p.add_child(Node::text(" "));
        p.add_child(text_element("em", "soft"));
        p.add_child(Node::element("hr"));

        let plain = PasteService::with_rules(options.clone(), Rules::new()).unwrap();
        assert_eq!(plain.convert_node(&p), "__bold__ *soft*

* * *");

        let govspeak = PasteService::with_options(options).unwrap();
        assert_eq!(govspeak.convert_node(&p), "bold soft

* * *");
    }

    #[test]
    fn test_deeply_nested_inline_elements() {
        let mut node = text_element("span", " deep ");
        for depth in 0..500 {
            let mut wrapper = Node::element(if depth % 2 == 0 { "b" } else { "span" });
            wrapper.add_child(node);
            node = wrapper;
        }
        let mut p = Node::element("p");
        p.add_child(Node::text("Go"));
        p.add_child(node);
        p.add_child(Node::text("now"));

        let service = PasteService::new();
        assert_eq!(service.convert_node(&p), "Go deep now");
    }

    #[test]
    fn test_service_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PasteService>();
    }
}
