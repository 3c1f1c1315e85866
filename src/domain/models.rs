use serde::{Deserialize, Serialize};

/// Static guard configuration, built once at startup and shared read-only
/// across every request.
///
/// An empty `allowed_hosts` list means no host restriction is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardConfig {
    pub testing: bool,
    pub allowed_hosts: Vec<String>,
}

/// The testing flag seen as an explicit variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardMode {
    /// Redirect and host checks are skipped, headers are still injected.
    Permissive,
    Enforcing,
}

impl GuardConfig {
    pub fn new(testing: bool, allowed_hosts: Vec<String>) -> Self {
        Self {
            testing,
            allowed_hosts,
        }
    }

    /// Enforcing configuration restricted to the given hosts.
    pub fn enforcing<I, S>(allowed_hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(false, allowed_hosts.into_iter().map(Into::into).collect())
    }

    /// Testing configuration: no redirect, no host check.
    pub fn permissive() -> Self {
        Self::new(true, Vec::new())
    }

    pub fn mode(&self) -> GuardMode {
        if self.testing {
            GuardMode::Permissive
        } else {
            GuardMode::Enforcing
        }
    }

    /// Host suggested to clients whose host was rejected.
    pub fn suggested_host(&self) -> Option<&str> {
        self.allowed_hosts.first().map(String::as_str)
    }

    pub fn is_unrestricted(&self) -> bool {
        self.allowed_hosts.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportDecision {
    Continue,
    Redirect { target: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostDecision {
    Accepted,
    Rejected { attempted: String },
}
