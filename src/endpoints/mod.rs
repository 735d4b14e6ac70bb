//! Trusted-endpoint validation.
//!
//! Decides, before a bearer token is attached to a request, whether the
//! destination host may receive it.
//!
//! ```text
//! address ──► classify ──► override set? ──yes──► override decides
//!                               │
//!                               no
//!                               ▼
//!                          IP literal? ──yes──► loopback only
//!                               │
//!                               no
//!                               ▼
//!                          extension rules ──match──► allow
//!                               │
//!                               ▼
//!                     rules for login authority ──match──► allow
//!                               │
//!                               ▼
//!                             deny
//! ```
//!
//! Tests and embedders build their own [`TrustedEndpoints`]; applications
//! that want one registry for the whole process use
//! [`TrustedEndpoints::global`] or the free functions in this module.

pub mod clouds;
pub mod host;
pub mod policy;
pub mod registry;
pub mod rule;

use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use crate::error::{EndpointError, Result};

pub use clouds::{CLOUD_DOMAINS, Cloud, CloudDomain, DomainKind};
pub use host::{Host, HostKind, classify};
pub use policy::{AllowAllHosts, DenyAllHosts, OverridePolicy};
pub use registry::CloudRegistry;
pub use rule::{Rule, RuleSet};

static GLOBAL: LazyLock<TrustedEndpoints> = LazyLock::new(TrustedEndpoints::new);

/// Registry of trusted endpoints.
///
/// Cloud rule sets are fixed at construction. Extension rules and the
/// override policy can change at any time; each change is a single swap
/// under a write lock, so concurrent validations see either the old or
/// the new value, never a partial one.
pub struct TrustedEndpoints {
    clouds: Arc<CloudRegistry>,
    extensions: RwLock<Vec<Rule>>,
    override_policy: RwLock<Option<Arc<dyn OverridePolicy>>>,
}

impl Default for TrustedEndpoints {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TrustedEndpoints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustedEndpoints")
            .field("authorities", &self.clouds.authorities())
            .field("extensions", &self.extension_rules())
            .field("has_override_policy", &self.has_override_policy())
            .finish()
    }
}

impl TrustedEndpoints {
    /// Create a registry using the built-in cloud table.
    pub fn new() -> Self {
        Self::with_cloud_registry(CloudRegistry::builtin())
    }

    /// Create a registry over a specific cloud registry.
    pub fn with_cloud_registry(clouds: Arc<CloudRegistry>) -> Self {
        Self {
            clouds,
            extensions: RwLock::new(Vec::new()),
            override_policy: RwLock::new(None),
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static TrustedEndpoints {
        &GLOBAL
    }

    pub fn cloud_registry(&self) -> &CloudRegistry {
        &self.clouds
    }

    /// Validate that `address` may receive a credential obtained from
    /// `login_authority`.
    ///
    /// `address` is an http(s) URL or a bare host name. A malformed address
    /// is denied.
    pub fn validate_trusted_endpoint(&self, address: &str, login_authority: &str) -> Result<()> {
        let host = match classify(address) {
            Ok(host) => host,
            Err(e) => {
                tracing::warn!(
                    authority = login_authority,
                    "Denying credential for unparseable address: {}",
                    e
                );
                return Err(EndpointError::untrusted(
                    address.trim(),
                    login_authority,
                    format!("could not determine host: {e}"),
                ));
            }
        };

        if let Some(policy) = self.override_policy() {
            if policy.is_trusted(&host) {
                tracing::debug!(host = %host, "Endpoint trusted by override policy");
                return Ok(());
            }
            return Err(self.deny(&host, login_authority, "rejected by override policy"));
        }

        if host.is_ip() {
            if host.is_loopback_ip() {
                tracing::debug!(host = %host, "Loopback endpoint trusted");
                return Ok(());
            }
            return Err(self.deny(
                &host,
                login_authority,
                "IP address is outside the loopback range",
            ));
        }

        if let Some(rule) = self.matching_extension(host.name()) {
            tracing::debug!(host = %host, rule = %rule, "Endpoint trusted by extension rule");
            return Ok(());
        }

        let Some(rules) = self.clouds.lookup(login_authority) else {
            return Err(self.deny(&host, login_authority, "unrecognized login authority"));
        };

        match rules.find(host.name()) {
            Some(rule) => {
                tracing::debug!(
                    host = %host,
                    authority = login_authority,
                    rule = %rule,
                    "Endpoint trusted"
                );
                Ok(())
            }
            None => Err(self.deny(
                &host,
                login_authority,
                "not a recognized endpoint for this login authority",
            )),
        }
    }

    /// Convenience wrapper returning only the decision.
    pub fn is_trusted(&self, address: &str, login_authority: &str) -> bool {
        self.validate_trusted_endpoint(address, login_authority)
            .is_ok()
    }

    /// Add extension rules, trusted for every login authority.
    ///
    /// With `replace` the current list is swapped for `rules` (an empty
    /// list clears all extensions); otherwise `rules` are appended. No
    /// de-duplication is performed.
    pub fn add_trusted_hosts(&self, rules: Vec<Rule>, replace: bool) {
        let count = rules.len();
        let mut extensions = self
            .extensions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if replace {
            *extensions = rules;
        } else {
            extensions.extend(rules);
        }
        tracing::info!(
            added = count,
            replace,
            total = extensions.len(),
            "Updated trusted host extensions"
        );
    }

    /// Install (`Some`) or clear (`None`) the override policy.
    pub fn set_override_policy(&self, policy: Option<Arc<dyn OverridePolicy>>) {
        let installed = policy.is_some();
        *self
            .override_policy
            .write()
            .unwrap_or_else(PoisonError::into_inner) = policy;
        if installed {
            tracing::info!("Trusted endpoint override policy installed");
        } else {
            tracing::info!("Trusted endpoint override policy cleared");
        }
    }

    pub fn clear_override_policy(&self) {
        self.set_override_policy(None);
    }

    pub fn has_override_policy(&self) -> bool {
        self.override_policy().is_some()
    }

    /// Snapshot of the current extension rules.
    pub fn extension_rules(&self) -> Vec<Rule> {
        self.extensions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn override_policy(&self) -> Option<Arc<dyn OverridePolicy>> {
        // Clone out of the lock so the policy never runs while it is held.
        self.override_policy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn matching_extension(&self, host: &str) -> Option<Rule> {
        self.extensions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|rule| rule.matches(host))
            .cloned()
    }

    fn deny(&self, host: &Host, login_authority: &str, reason: &str) -> EndpointError {
        tracing::warn!(
            host = %host,
            authority = login_authority,
            "Denying credential for untrusted endpoint: {}",
            reason
        );
        EndpointError::untrusted(host.name(), login_authority, reason)
    }
}

/// Validate against the process-wide registry.
pub fn validate_trusted_endpoint(address: &str, login_authority: &str) -> Result<()> {
    TrustedEndpoints::global().validate_trusted_endpoint(address, login_authority)
}

/// Add extension rules to the process-wide registry.
pub fn add_trusted_hosts(rules: Vec<Rule>, replace: bool) {
    TrustedEndpoints::global().add_trusted_hosts(rules, replace);
}

/// Install or clear the override policy of the process-wide registry.
pub fn set_override_policy(policy: Option<Arc<dyn OverridePolicy>>) {
    TrustedEndpoints::global().set_override_policy(policy);
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const PUBLIC: &str = "https://login.microsoftonline.com";
    const CHINA: &str = "https://login.chinacloudapi.cn";

    #[test]
    fn test_public_cluster_allowed() {
        let endpoints = TrustedEndpoints::new();
        assert!(
            endpoints
                .validate_trusted_endpoint("https://mycluster.kusto.windows.net", PUBLIC)
                .is_ok()
        );
        assert!(endpoints.is_trusted("mycluster.kusto.windows.net/?next=https://x", PUBLIC));
    }

    #[test]
    fn test_wrong_cloud_denied() {
        let endpoints = TrustedEndpoints::new();
        let err = endpoints
            .validate_trusted_endpoint("https://mycluster.kusto.chinacloudapi.cn", PUBLIC)
            .unwrap_err();
        assert_eq!(
            err,
            EndpointError::Untrusted {
                host: "mycluster.kusto.chinacloudapi.cn".to_string(),
                authority: Some(PUBLIC.to_string()),
                reason: "not a recognized endpoint for this login authority".to_string(),
            }
        );
        assert!(endpoints.is_trusted("https://mycluster.kusto.chinacloudapi.cn", CHINA));
    }

    #[test]
    fn test_error_message_names_host() {
        let endpoints = TrustedEndpoints::new();
        let err = endpoints
            .validate_trusted_endpoint("https://evil.example.com/", PUBLIC)
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("evil.example.com"), "{message}");
        assert!(message.contains("not a trusted"), "{message}");
        assert_eq!(err.host(), "evil.example.com");
    }

    #[test]
    fn test_empty_authority_denied() {
        let endpoints = TrustedEndpoints::new();
        let err = endpoints
            .validate_trusted_endpoint("https://mycluster.kusto.windows.net", "")
            .unwrap_err();
        assert!(matches!(
            err,
            EndpointError::Untrusted { authority: None, ref reason, .. }
                if reason == "unrecognized login authority"
        ));
    }

    #[test]
    fn test_malformed_address_denied() {
        let endpoints = TrustedEndpoints::new();
        for address in ["", "https://", "ftp://mycluster.kusto.windows.net", "http://[::1"] {
            assert!(
                !endpoints.is_trusted(address, PUBLIC),
                "{address:?} should be denied"
            );
        }
    }

    #[test]
    fn test_malformed_address_denied_even_with_override() {
        let endpoints = TrustedEndpoints::new();
        endpoints.set_override_policy(Some(Arc::new(AllowAllHosts)));
        assert!(!endpoints.is_trusted("https://", PUBLIC));
    }

    #[test]
    fn test_loopback_ip_any_known_authority() {
        let endpoints = TrustedEndpoints::new();
        assert!(endpoints.is_trusted("http://127.0.0.1:8080", PUBLIC));
        assert!(endpoints.is_trusted("127.0.0.1", CHINA));
        assert!(!endpoints.is_trusted("127.0.0.1.a", PUBLIC));
        assert!(!endpoints.is_trusted("http://10.0.0.1", PUBLIC));
        assert!(!endpoints.is_trusted("http://[::1]", PUBLIC));
    }

    #[test]
    fn test_extensions_do_not_apply_to_ip_literals() {
        let endpoints = TrustedEndpoints::new();
        endpoints.add_trusted_hosts(vec![Rule::exact("10.0.0.1")], true);
        assert!(!endpoints.is_trusted("http://10.0.0.1", PUBLIC));
    }

    #[test]
    fn test_extension_replace_and_clear() {
        let endpoints = TrustedEndpoints::new();
        assert!(!endpoints.is_trusted("https://a.x.example", PUBLIC));

        endpoints.add_trusted_hosts(vec![Rule::suffix("x.example")], true);
        assert!(endpoints.is_trusted("https://a.x.example", PUBLIC));
        assert!(endpoints.is_trusted("https://a.x.example", ""));
        assert!(endpoints.is_trusted("https://a.x.example", "https://login.unknown"));

        endpoints.add_trusted_hosts(Vec::new(), true);
        assert!(!endpoints.is_trusted("https://a.x.example", PUBLIC));
        assert!(endpoints.extension_rules().is_empty());
    }

    #[test]
    fn test_extension_append_preserves_earlier_rules() {
        let endpoints = TrustedEndpoints::new();
        endpoints.add_trusted_hosts(vec![Rule::suffix("one.example")], false);
        endpoints.add_trusted_hosts(vec![Rule::exact("two.example")], false);
        endpoints.add_trusted_hosts(vec![Rule::exact("two.example")], false);

        assert_eq!(
            endpoints.extension_rules(),
            vec![
                Rule::suffix("one.example"),
                Rule::exact("two.example"),
                Rule::exact("two.example"),
            ]
        );
        assert!(endpoints.is_trusted("a.one.example", PUBLIC));
        assert!(endpoints.is_trusted("two.example", PUBLIC));
        assert!(!endpoints.is_trusted("a.two.example", PUBLIC));
    }

    #[test]
    fn test_override_replaces_rules() {
        let endpoints = TrustedEndpoints::new();
        endpoints.set_override_policy(Some(Arc::new(|host: &Host| {
            host.name() == "only.example"
        })));
        assert!(endpoints.has_override_policy());

        assert!(endpoints.is_trusted("https://only.example", ""));
        assert!(!endpoints.is_trusted("https://mycluster.kusto.windows.net", PUBLIC));
        assert!(!endpoints.is_trusted("http://127.0.0.1", PUBLIC));

        endpoints.clear_override_policy();
        assert!(!endpoints.has_override_policy());
        assert!(!endpoints.is_trusted("https://only.example", ""));
        assert!(endpoints.is_trusted("https://mycluster.kusto.windows.net", PUBLIC));
    }

    #[test]
    fn test_override_bypasses_extensions() {
        let endpoints = TrustedEndpoints::new();
        endpoints.add_trusted_hosts(vec![Rule::suffix("x.example")], true);
        endpoints.set_override_policy(Some(Arc::new(DenyAllHosts)));
        let err = endpoints
            .validate_trusted_endpoint("https://a.x.example", PUBLIC)
            .unwrap_err();
        assert!(err.to_string().contains("override"));
    }

    #[test]
    fn test_custom_cloud_registry() {
        let table = [CloudDomain {
            cloud: Cloud::Germany,
            domain: "kusto.cloudapi.de",
            kind: DomainKind::Expandable,
        }];
        let endpoints =
            TrustedEndpoints::with_cloud_registry(Arc::new(CloudRegistry::from_table(&table)));
        let germany = Cloud::Germany.login_authority();
        assert!(endpoints.is_trusted("a.kustodev.cloudapi.de", germany));
        assert!(!endpoints.is_trusted("a.kusto.windows.net", PUBLIC));
    }
}
