//! `trustcheck` command handling.
//!
//! Provides subcommands for:
//! - Checking whether addresses may receive a credential (`check`)
//! - Listing known login authorities (`authorities`)
//! - Listing the rules trusted for an authority (`rules`)

use std::io::Write;

use clap::{ColorChoice, Parser, Subcommand};

use crate::config::{TrustConfig, parse_rule};
use crate::endpoints::{Cloud, Rule, TrustedEndpoints};
use crate::error::ConfigError;

#[derive(Parser, Debug)]
#[command(name = "trustcheck")]
#[command(about = "Check which hosts may receive Kusto credentials")]
#[command(
    long_about = "Validates cluster addresses against the trusted-endpoint rules.\nExamples:\n  trustcheck check https://mycluster.kusto.windows.net\n  trustcheck rules https://login.microsoftonline.us"
)]
#[command(version)]
#[command(color = ColorChoice::Auto)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Validate one or more addresses
    Check {
        /// URLs or host names to validate
        #[arg(required = true)]
        addresses: Vec<String>,

        /// Login authority the credential comes from
        /// [default: KUSTO_LOGIN_AUTHORITY, then the public cloud]
        #[arg(short, long)]
        authority: Option<String>,

        /// Additionally trust this domain and its subdomains
        #[arg(long, value_name = "DOMAIN")]
        trust: Vec<String>,

        /// Additionally trust exactly this host
        #[arg(long, value_name = "HOST")]
        trust_exact: Vec<String>,
    },

    /// List known login authorities
    Authorities,

    /// List the rules trusted for a login authority
    Rules {
        /// Login authority URL
        authority: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Run a command, writing results to `out`. Returns `false` if any checked
/// address was denied.
pub fn run_command<W: Write>(cmd: Command, out: &mut W) -> anyhow::Result<bool> {
    let config = TrustConfig::from_env()?;
    let endpoints = TrustedEndpoints::new();
    config.apply(&endpoints);
    run_command_with(&endpoints, &config, cmd, out)
}

/// Run a command against an existing registry. `config` supplies the
/// default login authority when `--authority` is not given.
pub fn run_command_with<W: Write>(
    endpoints: &TrustedEndpoints,
    config: &TrustConfig,
    cmd: Command,
    out: &mut W,
) -> anyhow::Result<bool> {
    match cmd {
        Command::Check {
            addresses,
            authority,
            trust,
            trust_exact,
        } => {
            let authority = authority
                .or_else(|| config.login_authority.clone())
                .unwrap_or_else(|| Cloud::Public.login_authority().to_string());
            cmd_check(endpoints, &addresses, &authority, &trust, &trust_exact, out)
        }
        Command::Authorities => {
            for authority in endpoints.cloud_registry().authorities() {
                writeln!(out, "{authority}")?;
            }
            Ok(true)
        }
        Command::Rules { authority, json } => cmd_rules(endpoints, &authority, json, out),
    }
}

fn cmd_check<W: Write>(
    endpoints: &TrustedEndpoints,
    addresses: &[String],
    authority: &str,
    trust: &[String],
    trust_exact: &[String],
    out: &mut W,
) -> anyhow::Result<bool> {
    let mut extra: Vec<Rule> = Vec::with_capacity(trust.len() + trust_exact.len());
    let flags = [("--trust", trust, false), ("--trust-exact", trust_exact, true)];
    for (flag, domains, exact) in flags {
        for domain in domains {
            let rule = parse_rule(domain, exact).map_err(|message| ConfigError::InvalidValue {
                key: flag.to_string(),
                message,
            })?;
            extra.push(rule);
        }
    }
    if !extra.is_empty() {
        endpoints.add_trusted_hosts(extra, false);
    }

    let mut all_allowed = true;
    for address in addresses {
        match endpoints.validate_trusted_endpoint(address, authority) {
            Ok(()) => writeln!(out, "{address}: allowed")?,
            Err(e) => {
                all_allowed = false;
                writeln!(out, "{address}: denied: {e}")?;
            }
        }
    }
    Ok(all_allowed)
}

fn cmd_rules<W: Write>(
    endpoints: &TrustedEndpoints,
    authority: &str,
    json: bool,
    out: &mut W,
) -> anyhow::Result<bool> {
    let Some(rules) = endpoints.cloud_registry().lookup(authority) else {
        anyhow::bail!(
            "Unknown login authority '{}'. Run 'trustcheck authorities' for the known list.",
            authority
        );
    };

    if json {
        serde_json::to_writer_pretty(&mut *out, rules.rules())?;
        writeln!(out)?;
    } else {
        for rule in rules.rules() {
            let kind = if rule.is_exact() { "exact" } else { "suffix" };
            writeln!(out, "{:<7} {}", kind, rule.domain())?;
        }
    }
    Ok(true)
}
