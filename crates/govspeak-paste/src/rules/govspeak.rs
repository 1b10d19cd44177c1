//! Govspeak overrides of the default rules.
//!
//! Rules are returned in the order they must be checked: filters that look
//! at a tag plus its context come before the plain filter for the same tag.

use super::{Accumulator, Filter, Rule};
use crate::node::NodeRef;
use crate::options::Options;
use crate::utilities::indent_continuation;

/// Create the Govspeak rules, keyed by name, in priority order
pub fn govspeak_rules() -> Vec<(&'static str, Rule)> {
    vec![
        ("nested_links", nested_links_rule()),
        ("link", link_rule()),
        ("abbr", abbr_rule()),
        ("heading", heading_rule()),
        ("img", image_rule()),
        ("bold", bold_rule()),
        ("italic", italic_rule()),
        ("remove_empty_paragraphs", remove_empty_paragraphs_rule()),
        ("paragraphs_in_list_items", paragraphs_in_list_items_rule()),
        ("invalid_nested_lists", invalid_nested_lists_rule()),
        ("list_items", list_items_rule()),
    ]
}

/// Some editors nest a link inside the Markdown of another one, leaving
/// `[text](` as the previous sibling. Only the address belongs there.
fn nested_links_rule() -> Rule {
    Rule::new(
        Filter::predicate(|tag, node, _| {
            tag == "a"
                && node
                    .previous_sibling()
                    .is_some_and(|sibling| sibling.text_content().ends_with("]("))
        }),
        |node, _, _| node.attr("href").unwrap_or_default().to_string(),
    )
}

/// Govspeak has no link titles
fn link_rule() -> Rule {
    Rule::new(
        Filter::predicate(|tag, node, _| {
            tag == "a" && node.attr("href").is_some_and(|href| !href.is_empty())
        }),
        |node, content, _| {
            if content.trim().is_empty() {
                return String::new();
            }
            format!("[{}]({})", content, node.attr("href").unwrap_or_default())
        },
    )
}

fn abbr_rule() -> Rule {
    Rule::accumulating(
        Filter::predicate(|tag, node, _| {
            tag == "abbr" && node.attr("title").is_some_and(|title| !title.is_empty())
        }),
        record_abbreviation,
        append_abbreviations,
    )
}

fn record_abbreviation(node: &NodeRef, content: &str, _: &Options, acc: &mut Accumulator) -> String {
    if let Some(title) = node.attr("title") {
        tracing::debug!(abbr = content, title, "Recorded abbreviation");
        acc.record(content, title);
    }
    content.to_string()
}

/// `*[ABBR]: definition` lines after a blank line, one per abbreviation
fn append_abbreviations(acc: &mut Accumulator, _: &Options) -> String {
    if acc.is_empty() {
        return String::new();
    }

    let mut references = String::from("\n\n");
    for (abbr, title) in acc.drain() {
        references.push_str(&format!("*[{}]: {}\n", abbr, title));
    }
    references
}

/// Only two heading levels: h1 and h2 become `##`, h3 to h5 become `###`
/// and h6 loses its marker.
fn heading_rule() -> Rule {
    Rule::for_tags(&["h1", "h2", "h3", "h4", "h5", "h6"], |node, content, _| {
        let prefix = match node.tag_name() {
            "h1" | "h2" => "## ",
            "h3" | "h4" | "h5" => "### ",
            _ => "",
        };
        format!("\n\n{}{}\n\n", prefix, content)
    })
}

fn image_rule() -> Rule {
    Rule::for_tag("img", |_, _, _| String::new())
}

fn bold_rule() -> Rule {
    Rule::for_tags(&["b", "strong"], |_, content, _| content.to_string())
}

fn italic_rule() -> Rule {
    Rule::for_tags(&["i", "em"], |_, content, _| content.to_string())
}

fn remove_empty_paragraphs_rule() -> Rule {
    Rule::new(
        Filter::predicate(|tag, node, _| tag == "p" && node.text_content().trim().is_empty()),
        |_, _, _| String::new(),
    )
}

fn paragraphs_in_list_items_rule() -> Rule {
    Rule::new(
        Filter::predicate(|tag, node, _| tag == "p" && node.parent_tag() == Some("li")),
        |_, content, _| content.to_string(),
    )
}

/// A list placed next to an item instead of inside it, as some word
/// processors export nested lists. Indented under the item it follows.
fn invalid_nested_lists_rule() -> Rule {
    Rule::new(
        Filter::predicate(|tag, node, _| {
            matches!(tag, "ul" | "ol")
                && node
                    .previous_element_sibling()
                    .is_some_and(|sibling| sibling.tag_name() == "li")
        }),
        |_, content, options| {
            let content = content.trim_matches('\n');
            format!(
                "{}{}\n",
                options.list_indent,
                indent_continuation(content, &options.list_indent)
            )
        },
    )
}

fn list_items_rule() -> Rule {
    Rule::for_tag("li", |node, content, options| {
        let content = indent_continuation(content.trim_matches('\n'), &options.list_indent);

        let prefix = if node.parent_tag() == Some("ol") {
            format!("{}. ", node.position_among("li") + 1)
        } else {
            format!("{} ", options.bullet_list_marker)
        };

        let separator = if node.next_sibling().is_some() && !content.ends_with('\n') {
            "\n"
        } else {
            ""
        };
        format!("{}{}{}", prefix, content, separator)
    })
}
