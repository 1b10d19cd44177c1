//! Rule and Filter types for HTML conversion.

use indexmap::IndexMap;

use crate::node::NodeRef;
use crate::options::Options;

/// Type alias for replacement functions
pub type ReplacementFn =
    Box<dyn Fn(&NodeRef, &str, &Options, &mut Accumulator) -> String + Send + Sync>;

/// Type alias for finalizers run once after the whole tree is converted
pub type AppendFn = Box<dyn Fn(&mut Accumulator, &Options) -> String + Send + Sync>;

fn boxed<F>(f: F) -> ReplacementFn
where
    F: Fn(&NodeRef, &str, &Options, &mut Accumulator) -> String + Send + Sync + 'static,
{
    Box::new(f)
}

/// A filter determines which elements a rule applies to
pub enum Filter {
    /// Match a single tag name
    TagName(String),
    /// Match any of multiple tag names
    TagNames(Vec<String>),
    /// Match using a predicate function
    Predicate(Box<dyn Fn(&str, &NodeRef, &Options) -> bool + Send + Sync>),
}

impl Filter {
    /// Create a filter for a single tag
    pub fn tag(name: &str) -> Self {
        Filter::TagName(name.to_lowercase())
    }

    /// Create a filter for multiple tags
    pub fn tags(names: &[&str]) -> Self {
        Filter::TagNames(names.iter().map(|s| s.to_lowercase()).collect())
    }

    /// Create a filter with a predicate
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str, &NodeRef, &Options) -> bool + Send + Sync + 'static,
    {
        Filter::Predicate(Box::new(f))
    }

    /// Check if this filter matches a node
    pub fn matches(&self, tag: &str, node: &NodeRef, options: &Options) -> bool {
        let tag_lower = tag.to_lowercase();
        match self {
            Filter::TagName(t) => tag_lower == *t,
            Filter::TagNames(tags) => tags.contains(&tag_lower),
            Filter::Predicate(f) => f(&tag_lower, node, options),
        }
    }
}

/// State a rule collects during one conversion and flushes in its finalizer.
///
/// Keys keep the order they were first recorded in; recording a key again
/// replaces its value without moving it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Accumulator {
    entries: IndexMap<String, String>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` under `key`
    pub fn record(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Take every entry out, in first-recorded order, leaving it empty
    pub fn drain(&mut self) -> impl Iterator<Item = (String, String)> + '_ {
        self.entries.drain(..)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// A rule defines how to convert a matched HTML element to Govspeak
pub struct Rule {
    /// Filter to determine which elements this rule applies to
    pub filter: Filter,
    /// Replacement function that generates Govspeak
    pub replacement: ReplacementFn,
    /// Optional finalizer appending collected state to the document
    pub append: Option<AppendFn>,
}

impl Rule {
    /// Create a new rule
    pub fn new<F>(filter: Filter, replacement: F) -> Self
    where
        F: Fn(&NodeRef, &str, &Options) -> String + Send + Sync + 'static,
    {
        Self {
            filter,
            replacement: boxed(move |node, content, options, _| {
                replacement(node, content, options)
            }),
            append: None,
        }
    }

    /// Create a rule that matches a single tag
    pub fn for_tag<F>(tag: &str, replacement: F) -> Self
    where
        F: Fn(&NodeRef, &str, &Options) -> String + Send + Sync + 'static,
    {
        Self::new(Filter::tag(tag), replacement)
    }

    /// Create a rule that matches multiple tags
    pub fn for_tags<F>(tags: &[&str], replacement: F) -> Self
    where
        F: Fn(&NodeRef, &str, &Options) -> String + Send + Sync + 'static,
    {
        Self::new(Filter::tags(tags), replacement)
    }

    /// Create a rule that records state while converting and appends it to
    /// the end of the document once the traversal is done.
    pub fn accumulating<F, A>(filter: Filter, replacement: F, append: A) -> Self
    where
        F: Fn(&NodeRef, &str, &Options, &mut Accumulator) -> String + Send + Sync + 'static,
        A: Fn(&mut Accumulator, &Options) -> String + Send + Sync + 'static,
    {
        Self {
            filter,
            replacement: Box::new(replacement),
            append: Some(Box::new(append)),
        }
    }

    /// Apply this rule's replacement
    pub fn replace(
        &self,
        node: &NodeRef,
        content: &str,
        options: &Options,
        state: &mut Accumulator,
    ) -> String {
        (self.replacement)(node, content, options, state)
    }

    /// Run the finalizer, if any
    pub fn finalize(&self, state: &mut Accumulator, options: &Options) -> Option<String> {
        self.append.as_ref().map(|append| append(state, options))
    }
}
