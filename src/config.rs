//! Environment configuration for extension rules.
//!
//! | Variable                      | Meaning                                              |
//! |-------------------------------|------------------------------------------------------|
//! | `KUSTO_TRUSTED_HOSTS`         | Comma-separated domains; `=host` marks an exact rule |
//! | `KUSTO_TRUSTED_HOSTS_REPLACE` | `true` (default) replaces extensions, `false` appends |
//! | `KUSTO_LOGIN_AUTHORITY`       | Default login authority for the CLI                  |

use std::collections::HashMap;

use crate::endpoints::{Rule, TrustedEndpoints};
use crate::error::ConfigError;

pub const TRUSTED_HOSTS_VAR: &str = "KUSTO_TRUSTED_HOSTS";
pub const TRUSTED_HOSTS_REPLACE_VAR: &str = "KUSTO_TRUSTED_HOSTS_REPLACE";
pub const LOGIN_AUTHORITY_VAR: &str = "KUSTO_LOGIN_AUTHORITY";

/// Extension-rule configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustConfig {
    /// Extension rules; `None` leaves the registry untouched.
    pub trusted_hosts: Option<Vec<Rule>>,
    /// Whether `trusted_hosts` replaces existing extensions.
    pub replace: bool,
    pub login_authority: Option<String>,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            trusted_hosts: None,
            replace: true,
            login_authority: None,
        }
    }
}

impl TrustConfig {
    /// Load from the process environment, after reading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_vars(std::env::vars())
    }

    /// Load from explicit key/value pairs.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let optional_var = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let trusted_hosts = optional_var(TRUSTED_HOSTS_VAR)
            .map(|v| parse_rules(&v))
            .transpose()
            .map_err(|message| ConfigError::InvalidValue {
                key: TRUSTED_HOSTS_VAR.to_string(),
                message,
            })?;

        let replace = optional_var(TRUSTED_HOSTS_REPLACE_VAR)
            .map(|s| s.parse())
            .transpose()
            .map_err(|e| ConfigError::InvalidValue {
                key: TRUSTED_HOSTS_REPLACE_VAR.to_string(),
                message: format!("must be 'true' or 'false': {e}"),
            })?
            .unwrap_or(true);

        Ok(Self {
            trusted_hosts,
            replace,
            login_authority: optional_var(LOGIN_AUTHORITY_VAR),
        })
    }

    /// Install the configured extension rules.
    pub fn apply(&self, endpoints: &TrustedEndpoints) {
        if let Some(rules) = &self.trusted_hosts {
            endpoints.add_trusted_hosts(rules.clone(), self.replace);
        }
    }
}

/// Parse `a.example,=exact.example` into rules.
pub fn parse_rules(value: &str) -> Result<Vec<Rule>, String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.strip_prefix('=') {
            Some(domain) => parse_rule(domain, true),
            None => parse_rule(entry, false),
        })
        .collect()
}

/// Build a rule from a bare domain, rejecting anything that could never
/// match a host (URLs, ports, wildcards, empty names).
pub fn parse_rule(domain: &str, exact: bool) -> Result<Rule, String> {
    let rule = Rule::new(domain, exact);
    if rule.domain().is_empty() {
        return Err(format!("'{domain}' does not name a domain"));
    }
    if rule.domain().contains(['/', ':', '@', '*', ' ']) {
        return Err(format!(
            "'{domain}' must be a bare domain (no scheme, port, path or wildcard)"
        ));
    }
    Ok(rule)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_rules() {
        let rules = parse_rules(" contoso.net, =Proxy.Contoso.com ,,").unwrap();
        assert_eq!(
            rules,
            vec![Rule::suffix("contoso.net"), Rule::exact("proxy.contoso.com")]
        );
    }

    #[test]
    fn test_parse_rules_rejects_non_domains() {
        assert!(parse_rules("https://contoso.net").is_err());
        assert!(parse_rules("*.contoso.net").is_err());
        assert!(parse_rules("contoso.net:443").is_err());
        assert!(parse_rules("=").is_err());
    }

    #[test]
    fn test_parse_rule() {
        assert_eq!(parse_rule("Contoso.NET.", false), Ok(Rule::suffix("contoso.net")));
        assert_eq!(parse_rule("proxy.contoso.com", true), Ok(Rule::exact("proxy.contoso.com")));
        assert!(parse_rule("user@contoso.net", false).is_err());
        assert!(parse_rule(" . ", true).is_err());
    }

    #[test]
    fn test_from_vars_defaults() {
        let config = TrustConfig::from_vars(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config, TrustConfig::default());
    }

    #[test]
    fn test_from_vars() {
        let config = TrustConfig::from_vars([
            (TRUSTED_HOSTS_VAR, "contoso.net"),
            (TRUSTED_HOSTS_REPLACE_VAR, "false"),
            (LOGIN_AUTHORITY_VAR, "https://login.microsoftonline.us"),
        ])
        .unwrap();
        assert_eq!(config.trusted_hosts, Some(vec![Rule::suffix("contoso.net")]));
        assert!(!config.replace);
        assert_eq!(
            config.login_authority.as_deref(),
            Some("https://login.microsoftonline.us")
        );
    }

    #[test]
    fn test_from_vars_invalid_replace() {
        let err = TrustConfig::from_vars([(TRUSTED_HOSTS_REPLACE_VAR, "yes")]).unwrap_err();
        assert!(err.to_string().contains(TRUSTED_HOSTS_REPLACE_VAR));
    }

    #[test]
    fn test_apply() {
        let endpoints = TrustedEndpoints::new();
        endpoints.add_trusted_hosts(vec![Rule::suffix("old.example")], true);

        let append = TrustConfig {
            trusted_hosts: Some(vec![Rule::suffix("new.example")]),
            replace: false,
            login_authority: None,
        };
        append.apply(&endpoints);
        assert_eq!(endpoints.extension_rules().len(), 2);

        TrustConfig {
            replace: true,
            ..append
        }
        .apply(&endpoints);
        assert_eq!(endpoints.extension_rules(), vec![Rule::suffix("new.example")]);

        TrustConfig::default().apply(&endpoints);
        assert_eq!(endpoints.extension_rules().len(), 1);
    }
}
