//! Host matching rules.
//!
//! A rule is a lower-cased domain plus a flag choosing between exact
//! hostname equality and proper-subdomain matching. There is no wildcard
//! or regex syntax.

use std::fmt;

use serde::Serialize;

/// A trusted domain suffix or exact hostname.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Rule {
    suffix: String,
    exact: bool,
}

impl Rule {
    /// Create a rule. The domain is lower-cased and stripped of surrounding
    /// whitespace and leading/trailing dots.
    pub fn new(suffix: &str, exact: bool) -> Self {
        let suffix = suffix.trim().trim_matches('.').to_lowercase();
        Self { suffix, exact }
    }

    /// Rule matching `domain` and any of its subdomains.
    pub fn suffix(domain: &str) -> Self {
        Self::new(domain, false)
    }

    /// Rule matching only the hostname `host`.
    pub fn exact(host: &str) -> Self {
        Self::new(host, true)
    }

    /// Check if a host matches this rule (case-insensitive).
    pub fn matches(&self, host: &str) -> bool {
        if self.suffix.is_empty() {
            return false;
        }
        if host.eq_ignore_ascii_case(&self.suffix) {
            return true;
        }
        if self.exact || host.len() <= self.suffix.len() + 1 {
            return false;
        }

        // Require a label boundary: "evilkusto.windows.net" must not match
        // "kusto.windows.net".
        let boundary = host.len() - self.suffix.len() - 1;
        host.as_bytes().get(boundary) == Some(&b'.')
            && host
                .get(boundary + 1..)
                .is_some_and(|tail| tail.eq_ignore_ascii_case(&self.suffix))
    }

    /// The normalized domain.
    pub fn domain(&self) -> &str {
        &self.suffix
    }

    /// Whether only the exact hostname is trusted.
    pub fn is_exact(&self) -> bool {
        self.exact
    }
}

/// Exact rules print as the host; suffix rules print as the domain followed
/// by `(+subdomains)`, since the domain itself is trusted too.
impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exact {
            write!(f, "{}", self.suffix)
        } else {
            write!(f, "{} (+subdomains)", self.suffix)
        }
    }
}

/// The rules trusted for one login authority.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// A set with no rules (matches nothing).
    pub const fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Find the first rule matching `host`.
    pub fn find(&self, host: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.matches(host))
    }

    pub fn matches(&self, host: &str) -> bool {
        self.find(host).is_some()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}
