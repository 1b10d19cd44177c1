//! # govspeak-paste
//!
//! Convert HTML pasted from word processors and web pages into Govspeak, the
//! constrained Markdown dialect used for publishing on GOV.UK.
//!
//! The conversion is built on a turndown-style rule engine: the HTML is parsed
//! into a [`Node`] tree, each node is converted bottom-up by the first matching
//! [`Rule`], and a handful of whole-document repairs tidy up what per-node rules
//! cannot see.
//!
//! Govspeak deliberately drops presentational markup. Bold, italic and images
//! disappear, link titles are discarded, and headings are squeezed into two
//! levels. Abbreviations are kept as footnote-style references.
//!
//! ## Example (HTML string)
//!
//! ```rust
//! use govspeak_paste::html_to_govspeak;
//!
//! let govspeak = html_to_govspeak("<h1>Apply</h1><p>Read the <b>guidance</b></p>");
//! assert_eq!(govspeak, "## Apply\n\nRead the guidance");
//! ```
//!
//! ## Example (Node-based)
//!
//! ```rust
//! use govspeak_paste::{Node, PasteService};
//!
//! let service = PasteService::new();
//!
//! let mut abbr = Node::element_with_attrs("abbr", vec![("title", "United Kingdom")]);
//! abbr.add_child(Node::text("UK"));
//! let mut p = Node::element("p");
//! p.add_child(abbr);
//!
//! let govspeak = service.convert_node(&p);
//! assert_eq!(govspeak, "UK\n\n*[UK]: United Kingdom");
//! ```

#[cfg(feature = "html")]
pub mod html;
pub mod node;
mod normalize;
mod options;
pub mod post_process;
mod rules;
mod service;
mod utilities;

#[cfg(feature = "html")]
pub use html::parse_html;
pub use node::{Node, NodeRef, NodeType};
pub use options::Options;
pub use rules::{Accumulator, AppendFn, Filter, ReplacementFn, Rule, Rules};
pub use service::PasteService;
pub use utilities::{is_block, is_meaningful_when_blank, is_void, join};

#[cfg(feature = "html")]
use once_cell::sync::Lazy;

#[cfg(feature = "html")]
static DEFAULT_SERVICE: Lazy<PasteService> = Lazy::new(PasteService::new);

/// Convert an HTML fragment to Govspeak using the default options.
///
/// This never fails: markup it does not recognise degrades to its text.
#[cfg(feature = "html")]
pub fn html_to_govspeak(html: &str) -> String {
    DEFAULT_SERVICE.convert_html(html)
}

/// Error type for configuring a [`PasteService`]
#[derive(Debug, thiserror::Error)]
pub enum PasteError {
    #[error("Invalid bullet list marker: {0:?} (expected '-', '*' or '+')")]
    InvalidBulletMarker(char),

    #[error("Invalid list indent: {0:?} (expected one or more spaces or tabs)")]
    InvalidListIndent(String),

    #[error("Line break marker must not be empty")]
    EmptyLineBreakMarker,

    #[error("Invalid repair pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, PasteError>;
