//! Default rules for standard block and inline elements.
//!
//! These produce plain Markdown. The Govspeak rules registered on top of them
//! replace the ones whose output Govspeak does not accept.

use super::{Filter, Rule};
use crate::utilities::{clean_attribute, indent_continuation};

/// Create all default rules
pub fn default_rules() -> Vec<Rule> {
    vec![
        paragraph_rule(),
        line_break_rule(),
        heading_rule(),
        blockquote_rule(),
        list_rule(),
        list_item_rule(),
        indented_code_block_rule(),
        horizontal_rule(),
        inline_link_rule(),
        emphasis_rule(),
        strong_rule(),
        code_rule(),
        image_rule(),
    ]
}

fn paragraph_rule() -> Rule {
    Rule::for_tag("p", |_, content, _| format!("\n\n{}\n\n", content.trim()))
}

fn line_break_rule() -> Rule {
    Rule::for_tag("br", |_, _, options| format!("{}\n", options.br))
}

fn heading_rule() -> Rule {
    Rule::for_tags(&["h1", "h2", "h3", "h4", "h5", "h6"], |node, content, _| {
        let level: usize = node.tag_name()[1..].parse().unwrap_or(1);

        let content = content.trim();
        if content.is_empty() {
            return String::new();
        }

        format!("\n\n{} {}\n\n", "#".repeat(level), content)
    })
}

fn blockquote_rule() -> Rule {
    Rule::for_tag("blockquote", |_, content, _| {
        let content = content.trim();
        if content.is_empty() {
            return String::new();
        }
        let quoted: Vec<String> = content.lines().map(|line| format!("> {}", line)).collect();
        format!("\n\n{}\n\n", quoted.join("\n"))
    })
}

fn list_rule() -> Rule {
    Rule::for_tags(&["ul", "ol"], |node, content, _| {
        // A list closing its parent item continues that item
        if node.parent_tag() == Some("li") && node.is_last_element_child() {
            format!("\n{}", content)
        } else {
            format!("\n\n{}\n\n", content)
        }
    })
}

fn list_item_rule() -> Rule {
    Rule::for_tag("li", |node, content, options| {
        let mut content = content.trim_start_matches('\n').to_string();
        if content.ends_with('\n') {
            content = format!("{}\n", content.trim_end_matches('\n'));
        }
        let content = indent_continuation(&content, "    ");

        let prefix = if node.parent_tag() == Some("ol") {
            let start = node
                .parent()
                .and_then(|ol| ol.attr("start"))
                .and_then(|s| s.trim().parse::<usize>().ok())
                .unwrap_or(1);
            format!("{}.  ", start + node.element_index())
        } else {
            format!("{}   ", options.bullet_list_marker)
        };

        let separator = if node.next_sibling().is_some() && !content.ends_with('\n') {
            "\n"
        } else {
            ""
        };
        format!("{}{}{}", prefix, content, separator)
    })
}

fn indented_code_block_rule() -> Rule {
    Rule::new(
        Filter::predicate(|tag, node, _| {
            tag == "pre"
                && node
                    .children()
                    .next()
                    .is_some_and(|first| first.tag_name() == "code")
        }),
        |node, _, _| {
            let code: String = node
                .element_children()
                .find(|c| c.tag_name() == "code")
                .map(|c| c.text_content())
                .unwrap_or_default();

            let indented: Vec<String> = code.lines().map(|line| format!("    {}", line)).collect();
            format!("\n\n{}\n\n", indented.join("\n"))
        },
    )
}

fn horizontal_rule() -> Rule {
    Rule::for_tag("hr", |_, _, options| format!("\n\n{}\n\n", options.hr))
}

fn inline_link_rule() -> Rule {
    Rule::new(
        Filter::predicate(|tag, node, _| {
            tag == "a" && node.attr("href").is_some_and(|href| !href.is_empty())
        }),
        |node, content, _| {
            let href = clean_attribute(node.attr("href"));
            let title = node
                .attr("title")
                .map(|t| format!(" \"{}\"", t.replace('"', "\\\"")))
                .unwrap_or_default();

            format!("[{}]({}{})", content, href, title)
        },
    )
}

fn emphasis_rule() -> Rule {
    Rule::for_tags(&["em", "i"], |_, content, options| {
        if content.trim().is_empty() {
            return String::new();
        }
        let delimiter = options.em_delimiter;
        format!("{}{}{}", delimiter, content, delimiter)
    })
}

fn strong_rule() -> Rule {
    Rule::for_tags(&["strong", "b"], |_, content, options| {
        if content.trim().is_empty() {
            return String::new();
        }
        let delimiter = &options.strong_delimiter;
        format!("{}{}{}", delimiter, content, delimiter)
    })
}

fn code_rule() -> Rule {
    Rule::new(
        Filter::predicate(|tag, node, _| tag == "code" && node.parent_tag() != Some("pre")),
        |node, _, _| {
            let content = node.text_content().replace("\r\n", " ").replace(['\r', '\n'], " ");
            if content.is_empty() {
                return String::new();
            }

            // The delimiter must be longer than any backtick run inside
            let longest_run = content
                .split(|c: char| c != '`')
                .map(str::len)
                .max()
                .unwrap_or(0);
            let delimiter = "`".repeat(longest_run + 1);

            let padded = content.starts_with('`')
                || content.ends_with('`')
                || (content.starts_with(' ') && content.ends_with(' ') && !content.trim().is_empty());
            let space = if padded { " " } else { "" };

            format!("{delimiter}{space}{content}{space}{delimiter}")
        },
    )
}

fn image_rule() -> Rule {
    Rule::for_tag("img", |node, _, _| {
        let alt = clean_attribute(node.attr("alt"));
        let src = clean_attribute(node.attr("src"));

        if src.is_empty() {
            return String::new();
        }

        let title = node
            .attr("title")
            .map(|t| format!(" \"{}\"", t))
            .unwrap_or_default();

        format!("![{}]({}{})", alt, src, title)
    })
}
