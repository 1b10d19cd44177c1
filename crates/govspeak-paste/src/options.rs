//! Formatting options read by the rules during conversion.

use crate::{PasteError, Result};

/// Tags removed from the tree, with their content, before conversion.
pub const DEFAULT_REMOVED_TAGS: &[&str] = &[
    "title", "script", "noscript", "style", "video", "audio", "object", "iframe",
];

/// Options for a [`PasteService`](crate::PasteService).
///
/// Fixed once the service is built; every conversion reads the same values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Bullet list marker
    pub bullet_list_marker: char,

    /// Indentation unit for list continuation lines and nested lists
    pub list_indent: String,

    /// Marker emitted before the newline of a `<br>`
    pub br: String,

    /// Horizontal rule string, read by the default `hr` rule
    pub hr: String,

    /// Emphasis delimiter. Only [`Rules::new`](crate::Rules::new) reads it;
    /// the Govspeak rules drop emphasis.
    pub em_delimiter: char,

    /// Strong delimiter. Only [`Rules::new`](crate::Rules::new) reads it;
    /// the Govspeak rules drop bold.
    pub strong_delimiter: String,

    /// Tags stripped from the tree before traversal (lowercase)
    pub remove: Vec<String>,
}

impl Options {
    /// Check the options can produce well-formed Govspeak.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.bullet_list_marker, '-' | '*' | '+') {
            return Err(PasteError::InvalidBulletMarker(self.bullet_list_marker));
        }
        if self.list_indent.is_empty() || !self.list_indent.chars().all(|c| c == ' ' || c == '\t') {
            return Err(PasteError::InvalidListIndent(self.list_indent.clone()));
        }
        if self.br.is_empty() {
            return Err(PasteError::EmptyLineBreakMarker);
        }
        Ok(())
    }

    /// Whether elements with this tag are stripped before traversal
    pub fn is_removed(&self, tag: &str) -> bool {
        self.remove.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            bullet_list_marker: '-',
            list_indent: "   ".to_string(),
            br: "  ".to_string(),
            hr: "* * *".to_string(),
            em_delimiter: '_',
            strong_delimiter: "**".to_string(),
            remove: DEFAULT_REMOVED_TAGS.iter().map(|t| t.to_string()).collect(),
        }
    }
}
