//! Whole-document repairs run after the tree has been converted.
//!
//! These fix artifacts that span several independently converted nodes, so no
//! single rule can see them.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::options::Options;
use crate::Result;

/// An ordered-list number in front of a `##` or `###` heading
static HEADING_IN_LIST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d\.\s(#{2,3})").expect("hardcoded heading-in-list regex"));

/// Orphaned breaks for the default two-space marker
static DEFAULT_BREAKS_RE: Lazy<Regex> = Lazy::new(|| {
    orphaned_breaks_pattern(&Options::default().br).expect("hardcoded orphaned-break regex")
});

fn orphaned_breaks_pattern(br: &str) -> std::result::Result<Regex, regex::Error> {
    Regex::new(&format!(r"\n\n(?:{}\n)+\n?", regex::escape(br)))
}

/// The compiled repairs for one set of options
#[derive(Debug, Clone)]
pub struct PostProcessor {
    orphaned_breaks: Regex,
}

impl PostProcessor {
    pub fn new(options: &Options) -> Result<Self> {
        let orphaned_breaks = if options.br == Options::default().br {
            DEFAULT_BREAKS_RE.clone()
        } else {
            orphaned_breaks_pattern(&options.br)?
        };
        Ok(Self { orphaned_breaks })
    }

    /// Run every repair, in order, then trim the document.
    pub fn run(&self, govspeak: &str) -> String {
        let breaks_collapsed = self.collapse_orphaned_breaks(govspeak);
        let headings_extracted = extract_headings_from_lists(&breaks_collapsed);
        headings_extracted.trim().to_string()
    }

    /// Collapse line breaks standing on their own after a blank line.
    ///
    /// Word processors that wrap whole paragraphs in bold leave a `<br>`
    /// between them, which converts to a break marker on a line of its own:
    /// `"Text\n\n  \n\nMore text"` becomes `"Text\n\nMore text"`. Breaks
    /// inside a paragraph have no blank line before them and are kept.
    pub fn collapse_orphaned_breaks(&self, govspeak: &str) -> String {
        let count = self.orphaned_breaks.find_iter(govspeak).count();
        if count == 0 {
            return govspeak.to_string();
        }
        tracing::debug!(repair = "orphaned_breaks", changes = count, "Repair applied");
        self.orphaned_breaks.replace_all(govspeak, "\n\n").into_owned()
    }
}

impl Default for PostProcessor {
    fn default() -> Self {
        Self {
            orphaned_breaks: DEFAULT_BREAKS_RE.clone(),
        }
    }
}

/// Drop the list number in front of headings that ended up inside an
/// ordered list: `"1. ## Heading"` becomes `"## Heading"`.
pub fn extract_headings_from_lists(govspeak: &str) -> String {
    let count = HEADING_IN_LIST_RE.find_iter(govspeak).count();
    if count == 0 {
        return govspeak.to_string();
    }
    tracing::debug!(repair = "headings_in_lists", changes = count, "Repair applied");
    HEADING_IN_LIST_RE.replace_all(govspeak, "$1").into_owned()
}
