//! Denylist filter for dangerous LaTeX constructs.
//!
//! This is a coarse second layer: the engine itself runs with shell-escape
//! disabled (see `engine.rs`), which is the primary control. A denylist is
//! inherently incomplete and is not a guaranteed sandbox.

use regex::Regex;
use tracing::warn;

use crate::compile::MAX_SOURCE_BYTES;
use crate::errors::AppError;

/// One rejection rule: a compiled pattern and the reason reported on match.
pub struct DenyRule {
    pattern: Regex,
    reason: &'static str,
}

impl DenyRule {
    fn new(pattern: &str, reason: &'static str) -> Self {
        Self {
            // Patterns are fixed at compile time; a failure here is a bug.
            pattern: Regex::new(pattern).expect("denylist pattern must compile"),
            reason,
        }
    }
}

/// Ordered denylist checked against every submitted document.
/// Built once at startup and carried in `AppState`; first matching rule wins.
pub struct DenyList {
    rules: Vec<DenyRule>,
    max_source_bytes: usize,
}

impl Default for DenyList {
    fn default() -> Self {
        Self::new(MAX_SOURCE_BYTES)
    }
}

impl DenyList {
    pub fn new(max_source_bytes: usize) -> Self {
        let rules = vec![
            DenyRule::new(r"(?i)\\write18", "shell escape via \\write18"),
            DenyRule::new(
                r"\\(?:input|include)\s*\{\s*/etc/",
                "file inclusion from system configuration paths",
            ),
            DenyRule::new(r"(?i)\\openin", "low-level file read via \\openin"),
            DenyRule::new(r"(?i)\\openout", "low-level file write via \\openout"),
            DenyRule::new(r"\\immediate\s*\\write", "immediate write to file streams"),
            DenyRule::new(r"\\def\s*\\input", "redefinition of the \\input primitive"),
        ];
        Self {
            rules,
            max_source_bytes,
        }
    }

    /// Checks the source against the size cap and every rule, in order.
    /// Returns the input unchanged on success: this is a filter, not a
    /// sanitizer, and never rewrites the document.
    pub fn check<'a>(&self, source: &'a str) -> Result<&'a str, AppError> {
        if source.len() > self.max_source_bytes {
            return Err(AppError::Validation(format!(
                "LaTeX source exceeds the {} byte limit",
                self.max_source_bytes
            )));
        }

        for rule in &self.rules {
            if rule.pattern.is_match(source) {
                warn!(reason = rule.reason, "rejected LaTeX source");
                return Err(AppError::Validation(format!(
                    "Potentially dangerous LaTeX code detected: {}",
                    rule.reason
                )));
            }
        }

        Ok(source)
    }
}
