//! Rule system for HTML to Govspeak conversion.

mod defaults;
mod govspeak;
mod rule;

pub use defaults::default_rules;
pub use govspeak::govspeak_rules;
pub use rule::{Accumulator, AppendFn, Filter, ReplacementFn, Rule};

use indexmap::IndexMap;

use crate::node::NodeRef;
use crate::options::Options;

/// Collection of rules for conversion
///
/// Every rule has a fixed slot: custom rules first, in registration order,
/// then the default rules. Slots index the per-conversion accumulators.
pub struct Rules {
    /// Custom rules added by the user (checked first)
    custom_rules: IndexMap<String, Rule>,
    /// Built-in rules for standard elements
    default_rules: Vec<Rule>,
}

impl Rules {
    /// Create a new Rules instance with only the default rules
    pub fn new() -> Self {
        Self {
            custom_rules: IndexMap::new(),
            default_rules: default_rules(),
        }
    }

    /// The default rules overridden by the Govspeak rules
    pub fn govspeak() -> Self {
        let mut rules = Self::new();
        for (key, rule) in govspeak_rules() {
            rules.add(key, rule);
        }
        rules
    }

    /// Add a custom rule.
    ///
    /// Custom rules are checked before the defaults, in the order they were
    /// first added. Adding a rule under an existing key replaces that rule
    /// in place.
    pub fn add(&mut self, key: &str, rule: Rule) {
        self.custom_rules.insert(key.to_string(), rule);
    }

    /// Find the rule for a node, together with its slot
    pub fn for_node<'a>(&'a self, node: &NodeRef, options: &Options) -> Option<(usize, &'a Rule)> {
        let tag = node.tag_name();
        self.iter()
            .enumerate()
            .find(|(_, rule)| rule.filter.matches(tag, node, options))
    }

    /// All rules in slot order
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.custom_rules.values().chain(self.default_rules.iter())
    }

    /// Keys of the custom rules, in the order they are checked
    pub fn custom_keys(&self) -> impl Iterator<Item = &str> {
        self.custom_rules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.custom_rules.len() + self.default_rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::new()
    }
}
