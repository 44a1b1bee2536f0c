//! Deduplicating registry of span styles.
//!
//! Identical style signatures share one generated class name. The cache is
//! owned by a single conversion and may be written from several slide workers.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Prefix of every generated class name.
pub const CLASS_PREFIX: &str = "_css_";

/// A generated class and its declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleRule {
    pub class_name: String,
    pub declarations: String,
}

#[derive(Debug, Default)]
struct Inner {
    by_signature: HashMap<String, usize>,
    rules: Vec<StyleRule>,
}

/// Maps style signatures to stable class names (`_css_1`, `_css_2`, ...).
#[derive(Debug, Default)]
pub struct StyleCache {
    inner: Mutex<Inner>,
}

impl StyleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the class name for `signature`, registering it on first sight.
    pub fn register(&self, signature: &str) -> String {
        let mut inner = self.inner.lock();
        if let Some(&pos) = inner.by_signature.get(signature) {
            return inner.rules[pos].class_name.clone();
        }

        let class_name = format!("{}{}", CLASS_PREFIX, inner.rules.len() + 1);
        let pos = inner.rules.len();
        inner.rules.push(StyleRule {
            class_name: class_name.clone(),
            declarations: signature.to_string(),
        });
        inner.by_signature.insert(signature.to_string(), pos);
        class_name
    }

    pub fn len(&self) -> usize {
        self.inner.lock().rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all rules in registration order.
    pub fn rules(&self) -> Vec<StyleRule> {
        self.inner.lock().rules.clone()
    }

    /// Render the rules as a stylesheet, each selector prefixed by `scope`.
    pub fn to_css(&self, scope: &str) -> String {
        render_css(&self.inner.lock().rules, scope)
    }
}

/// One line per rule: `<scope> .<class>{<declarations>}`.
pub fn render_css(rules: &[StyleRule], scope: &str) -> String {
    let mut css = String::new();
    for rule in rules {
        if scope.is_empty() {
            css.push_str(&format!(".{}{{{}}}\n", rule.class_name, rule.declarations));
        } else {
            css.push_str(&format!(
                "{} .{}{{{}}}\n",
                scope, rule.class_name, rule.declarations
            ));
        }
    }
    css
}
