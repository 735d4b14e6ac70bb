//! Caller-supplied override of the rule-based decision.
//!
//! When an override is installed it is the only thing consulted: hosts it
//! rejects are denied even if a cloud rule would trust them, and hosts it
//! accepts are allowed even if no rule would.

use crate::endpoints::host::Host;

/// Trait for replacing the trusted-endpoint decision.
pub trait OverridePolicy: Send + Sync {
    /// Decide whether `host` may receive a credential.
    fn is_trusted(&self, host: &Host) -> bool;
}

impl<F> OverridePolicy for F
where
    F: Fn(&Host) -> bool + Send + Sync,
{
    fn is_trusted(&self, host: &Host) -> bool {
        self(host)
    }
}

/// An override that trusts every host (local development against
/// non-standard endpoints).
pub struct AllowAllHosts;

impl OverridePolicy for AllowAllHosts {
    fn is_trusted(&self, _host: &Host) -> bool {
        true
    }
}

/// An override that trusts nothing.
pub struct DenyAllHosts;

impl OverridePolicy for DenyAllHosts {
    fn is_trusted(&self, _host: &Host) -> bool {
        false
    }
}
