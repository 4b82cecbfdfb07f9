//! Names and records this process advertises and looks for.

use std::fmt;

/// Namespace prefix shared by every advertised instance name.
pub const INSTANCE_PREFIX: &str = "mydrop-";
pub const SERVICE_TYPE: &str = "_drop._tcp";
pub const DOMAIN: &str = "local.";
/// TXT metadata, advertised as-is and never parsed back.
pub const METADATA: [(&str, &str); 3] = [("txtv", "0"), ("lo", "1"), ("la", "2")];

/// Fully-qualified mDNS service type, e.g. `_drop._tcp.local.`.
pub fn service_type_fqdn() -> String {
    format!("{SERVICE_TYPE}.{DOMAIN}")
}

/// What this process publishes on the local network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalIdentity {
    pub instance_name: String,
    pub port: u16,
}

impl LocalIdentity {
    pub fn new(uid: &str, port: u16) -> Self {
        Self {
            instance_name: format!("{INSTANCE_PREFIX}{uid}"),
            port,
        }
    }

    /// Metadata rendered as ordered `key=value` strings.
    pub fn metadata(&self) -> Vec<String> {
        METADATA.iter().map(|(k, v)| format!("{k}={v}")).collect()
    }
}

/// Advertised instance name of the peer a send is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetName(String);

impl TargetName {
    pub fn new(remote: &str) -> Self {
        Self(format!("{INSTANCE_PREFIX}{remote}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact equality only; prefixes and substrings never match.
    pub fn matches(&self, instance_name: &str) -> bool {
        self.0 == instance_name
    }
}

impl fmt::Display for TargetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_prefixed() {
        let id = LocalIdentity::new("alice", 4000);
        assert_eq!(id.instance_name, "mydrop-alice");
        assert_eq!(id.port, 4000);
        assert_eq!(id.metadata(), vec!["txtv=0", "lo=1", "la=2"]);
    }

    #[test]
    fn service_type_is_valid() {
        let fqdn = service_type_fqdn();
        assert_eq!(fqdn, "_drop._tcp.local.");
        assert!(fqdn.starts_with('_'));
    }

    #[test]
    fn target_matches_exactly() {
        let target = TargetName::new("bob");
        assert!(target.matches("mydrop-bob"));
        assert!(!target.matches("mydrop-bobby"));
        assert!(!target.matches("mydrop-bo"));
        assert!(!target.matches("bob"));
        assert!(!target.matches("MYDROP-bob"));
    }

    #[test]
    fn empty_remote_targets_bare_prefix() {
        let target = TargetName::new("");
        assert_eq!(target.as_str(), "mydrop-");
        assert!(!target.matches("mydrop-instance"));
    }
}
