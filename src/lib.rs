//! Trusted-endpoint validation for Kusto clients.
//!
//! Before a bearer token is attached to a request, the destination host is
//! checked against the domains trusted for the login authority that issued
//! the token. This keeps tokens away from crafted cluster URLs, hosts in
//! another cloud, and redirect targets on foreign domains.
//!
//! ```rust
//! use kusto_trusted_endpoints::TrustedEndpoints;
//!
//! let endpoints = TrustedEndpoints::new();
//! let authority = "https://login.microsoftonline.com";
//!
//! assert!(endpoints
//!     .validate_trusted_endpoint("https://mycluster.kusto.windows.net", authority)
//!     .is_ok());
//! assert!(endpoints
//!     .validate_trusted_endpoint("https://mycluster.kusto.chinacloudapi.cn", authority)
//!     .is_err());
//! ```

pub mod cli;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod transport;

pub use config::TrustConfig;
pub use endpoints::{
    AllowAllHosts, Cloud, CloudRegistry, DenyAllHosts, Host, HostKind, OverridePolicy, Rule,
    RuleSet, TrustedEndpoints, add_trusted_hosts, set_override_policy, validate_trusted_endpoint,
};
pub use error::{AddressError, ConfigError, EndpointError};
pub use transport::{BearerGuard, GuardError, redirect_policy};
