//! Known clouds and the domains trusted for each.
//!
//! Onboarding a cloud or a proxy endpoint is a change to [`CLOUD_DOMAINS`];
//! the generator below turns the table into rules.
//!
//! ```text
//! kusto.windows.net  (Expandable) ──► *.kusto.windows.net
//!                                     *.kustomfa.windows.net
//!                                     *.kustodev.windows.net
//! ade.loganalytics.io (ExactHost) ──►  ade.loganalytics.io
//! ```

use crate::endpoints::rule::{Rule, RuleSet};

/// Leading label of a cluster domain on the primary sign-in path.
pub const PRIMARY_TOKEN: &str = "kusto";

/// Labels substituted for [`PRIMARY_TOKEN`]: multi-factor and development paths.
pub const VARIANT_TOKENS: [&str; 2] = ["kustomfa", "kustodev"];

/// A cloud with its own identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cloud {
    Public,
    UsGovernment,
    China,
    Germany,
    EagleX,
    SCloud,
}

impl Cloud {
    pub const ALL: [Cloud; 6] = [
        Cloud::Public,
        Cloud::UsGovernment,
        Cloud::China,
        Cloud::Germany,
        Cloud::EagleX,
        Cloud::SCloud,
    ];

    /// Canonical login authority URL for this cloud.
    pub fn login_authority(self) -> &'static str {
        match self {
            Cloud::Public => "https://login.microsoftonline.com",
            Cloud::UsGovernment => "https://login.microsoftonline.us",
            Cloud::China => "https://login.chinacloudapi.cn",
            Cloud::Germany => "https://login.microsoftonline.de",
            Cloud::EagleX => "https://login.microsoftonline.eaglex.ic.gov",
            Cloud::SCloud => "https://login.microsoftonline.microsoft.scloud",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Cloud::Public => "public",
            Cloud::UsGovernment => "usgov",
            Cloud::China => "china",
            Cloud::Germany => "germany",
            Cloud::EagleX => "eaglex",
            Cloud::SCloud => "scloud",
        }
    }
}

/// How a table domain turns into rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainKind {
    /// General cluster domain: the domain plus its sign-in path variants,
    /// each trusting all subdomains.
    Expandable,
    /// Reverse-proxy endpoint: only this exact hostname.
    ExactHost,
}

/// One row of the cloud table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloudDomain {
    pub cloud: Cloud,
    pub domain: &'static str,
    pub kind: DomainKind,
}

const fn expandable(cloud: Cloud, domain: &'static str) -> CloudDomain {
    CloudDomain {
        cloud,
        domain,
        kind: DomainKind::Expandable,
    }
}

const fn exact_host(cloud: Cloud, domain: &'static str) -> CloudDomain {
    CloudDomain {
        cloud,
        domain,
        kind: DomainKind::ExactHost,
    }
}

/// Every trusted domain, tagged with the cloud whose authority may use it.
///
/// A domain shared by two clouds must appear once per cloud.
pub static CLOUD_DOMAINS: &[CloudDomain] = &[
    // Public cloud
    expandable(Cloud::Public, "kusto.windows.net"),
    exact_host(Cloud::Public, "kusto.azuresynapse.net"),
    exact_host(Cloud::Public, "ade.applicationinsights.io"),
    exact_host(Cloud::Public, "ade.loganalytics.io"),
    exact_host(Cloud::Public, "adx.applicationinsights.azure.com"),
    exact_host(Cloud::Public, "adx.loganalytics.azure.com"),
    exact_host(Cloud::Public, "adx.monitor.azure.com"),
    exact_host(Cloud::Public, "kusto.aria.microsoft.com"),
    exact_host(Cloud::Public, "insights.playfabapi.com"),
    // US Government
    expandable(Cloud::UsGovernment, "kusto.usgovcloudapi.net"),
    exact_host(Cloud::UsGovernment, "kusto.azuresynapse.usgovcloudapi.net"),
    exact_host(Cloud::UsGovernment, "adx.applicationinsights.azure.us"),
    exact_host(Cloud::UsGovernment, "adx.loganalytics.azure.us"),
    exact_host(Cloud::UsGovernment, "adx.monitor.azure.us"),
    // China
    expandable(Cloud::China, "kusto.chinacloudapi.cn"),
    exact_host(Cloud::China, "kusto.azuresynapse.azure.cn"),
    exact_host(Cloud::China, "adx.applicationinsights.azure.cn"),
    exact_host(Cloud::China, "adx.loganalytics.azure.cn"),
    exact_host(Cloud::China, "adx.monitor.azure.cn"),
    // Germany
    expandable(Cloud::Germany, "kusto.cloudapi.de"),
    // Air-gapped
    expandable(Cloud::EagleX, "kusto.core.eaglex.ic.gov"),
    expandable(Cloud::SCloud, "kusto.core.microsoft.scloud"),
];

/// Expand one table row into its rules.
pub fn expand_domain(entry: &CloudDomain) -> Vec<Rule> {
    match entry.kind {
        DomainKind::ExactHost => vec![Rule::exact(entry.domain)],
        DomainKind::Expandable => {
            let mut rules = vec![Rule::suffix(entry.domain)];
            match entry
                .domain
                .strip_prefix(PRIMARY_TOKEN)
                .and_then(|rest| rest.strip_prefix('.'))
            {
                Some(rest) => rules.extend(
                    VARIANT_TOKENS
                        .iter()
                        .map(|token| Rule::suffix(&format!("{token}.{rest}"))),
                ),
                None => tracing::warn!(
                    domain = entry.domain,
                    "expandable domain does not start with '{}'; no variants generated",
                    PRIMARY_TOKEN
                ),
            }
            rules
        }
    }
}

/// Build the rule set for `cloud` from the rows that belong to it.
pub fn generate_rules(table: &[CloudDomain], cloud: Cloud) -> RuleSet {
    let mut rules: Vec<Rule> = Vec::new();
    for entry in table.iter().filter(|entry| entry.cloud == cloud) {
        for rule in expand_domain(entry) {
            if !rules.contains(&rule) {
                rules.push(rule);
            }
        }
    }
    RuleSet::new(rules)
}
