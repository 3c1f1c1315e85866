use crate::domain::models::{GuardConfig, HostDecision, TransportDecision};
use thiserror::Error;

/// The only value of the forwarded-protocol signal treated as secure.
pub const SECURE_SCHEME: &str = "https";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    #[error("Insecure transport, redirecting to {target}")]
    InsecureTransport { target: String },

    #[error("Bad host name {host}")]
    BadHost {
        host: String,
        suggestion: Option<String>,
    },
}

/// Decide whether the request arrived over HTTPS according to the proxy's
/// forwarded-protocol header.
///
/// Anything other than exactly `https` redirects, including an absent header.
/// The redirect always targets the bare host: the original path and query are
/// dropped because some fronting proxies rewrite them.
pub fn check_transport(forwarded_proto: Option<&str>, host: &str) -> TransportDecision {
    match forwarded_proto {
        Some(SECURE_SCHEME) => TransportDecision::Continue,
        _ => TransportDecision::Redirect {
            target: format!("{}://{}", SECURE_SCHEME, host),
        },
    }
}

/// Check the request host against the allow-list, ignoring ASCII case.
pub fn check_host(config: &GuardConfig, host: &str) -> HostDecision {
    if config.is_unrestricted() {
        return HostDecision::Accepted;
    }

    let allowed = config
        .allowed_hosts
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(host));

    if allowed {
        HostDecision::Accepted
    } else {
        HostDecision::Rejected {
            attempted: host.to_string(),
        }
    }
}

/// Run the transport and host checks in order. Permissive configurations
/// skip both.
pub fn evaluate(
    config: &GuardConfig,
    forwarded_proto: Option<&str>,
    host: &str,
) -> Result<(), GuardError> {
    if config.testing {
        return Ok(());
    }

    if let TransportDecision::Redirect { target } = check_transport(forwarded_proto, host) {
        return Err(GuardError::InsecureTransport { target });
    }

    if let HostDecision::Rejected { attempted } = check_host(config, host) {
        return Err(GuardError::BadHost {
            host: attempted,
            suggestion: config.suggested_host().map(str::to_string),
        });
    }

    Ok(())
}

/// Plain-text body sent to clients whose host was rejected.
pub fn bad_host_message(suggestion: Option<&str>) -> String {
    match suggestion {
        Some(good_host) => format!("This is a bad host. Try: {}", good_host),
        None => "This is a bad host.".to_string(),
    }
}
