//! Login authority to rule set mapping.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use crate::endpoints::clouds::{CLOUD_DOMAINS, Cloud, CloudDomain, generate_rules};
use crate::endpoints::rule::RuleSet;

static BUILTIN: LazyLock<Arc<CloudRegistry>> =
    LazyLock::new(|| Arc::new(CloudRegistry::from_table(CLOUD_DOMAINS)));

static EMPTY: RuleSet = RuleSet::empty();

/// Immutable mapping from login authority to the rules trusted for
/// clusters that authenticate through it.
#[derive(Debug, Clone, Default)]
pub struct CloudRegistry {
    /// Keyed by normalized authority.
    by_authority: HashMap<String, RuleSet>,
    /// Canonical authorities, in table order.
    authorities: Vec<&'static str>,
}

impl CloudRegistry {
    /// The registry built from the built-in cloud table. Built on first use
    /// and shared for the rest of the process.
    pub fn builtin() -> Arc<CloudRegistry> {
        Arc::clone(&BUILTIN)
    }

    /// Build a registry from a cloud table.
    pub fn from_table(table: &[CloudDomain]) -> Self {
        let mut by_authority = HashMap::new();
        let mut authorities = Vec::new();

        for cloud in Cloud::ALL {
            let rules = generate_rules(table, cloud);
            if rules.is_empty() {
                continue;
            }
            let authority = cloud.login_authority();
            by_authority.insert(normalize_authority(authority), rules);
            authorities.push(authority);
        }

        Self {
            by_authority,
            authorities,
        }
    }

    /// Rule set for an authority, or `None` if the authority is unknown.
    pub fn lookup(&self, authority: &str) -> Option<&RuleSet> {
        self.by_authority.get(&normalize_authority(authority))
    }

    /// Rule set for an authority; unknown authorities get an empty set.
    pub fn rules_for(&self, authority: &str) -> &RuleSet {
        self.lookup(authority).unwrap_or(&EMPTY)
    }

    /// Known login authorities.
    pub fn authorities(&self) -> &[&'static str] {
        &self.authorities
    }
}

/// Case-insensitive comparison key for a login authority URL. A single
/// trailing `/` is ignored.
pub fn normalize_authority(authority: &str) -> String {
    let authority = authority.trim();
    authority
        .strip_suffix('/')
        .unwrap_or(authority)
        .to_ascii_lowercase()
}
