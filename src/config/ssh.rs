//! SSH tunnel configuration types
//!
//! Describes how to reach and authenticate against the SSH server that
//! carries every forwarded connection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default SSH connect timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10;

/// Default SSH keepalive interval in seconds
pub const DEFAULT_KEEPALIVE_INTERVAL: u64 = 30;

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT
}

fn default_keepalive_interval_secs() -> u64 {
    DEFAULT_KEEPALIVE_INTERVAL
}

/// SSH tunnel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshConfig {
    /// SSH server address (e.g., "bastion.example.com:22")
    pub addr: String,

    /// Username to authenticate as
    pub username: String,

    /// Password offered after every key was rejected (may be empty)
    #[serde(default)]
    pub password: String,

    /// Private key files, offered in order after agent keys
    #[serde(default)]
    pub private_keys: Vec<PathBuf>,

    /// SSH agent socket path
    #[serde(default)]
    pub agent_addr: Option<String>,

    /// How the server's host key is verified
    #[serde(default)]
    pub host_key_policy: HostKeyPolicy,

    /// Timeout for the transport connection in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Seconds between SSH-level keepalive requests on an idle session, 0 to disable
    #[serde(default = "default_keepalive_interval_secs")]
    pub keepalive_interval: u64,

    /// TCP socket options for the transport connection
    #[serde(default)]
    pub tcp: TcpConfig,
}

impl SshConfig {
    /// Create a configuration for `username@addr` with everything else defaulted
    pub fn new(addr: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            username: username.into(),
            password: String::new(),
            private_keys: Vec::new(),
            agent_addr: None,
            host_key_policy: HostKeyPolicy::default(),
            connect_timeout: default_connect_timeout(),
            keepalive_interval: default_keepalive_interval_secs(),
            tcp: TcpConfig::default(),
        }
    }

    /// SSH keepalive interval, `None` when disabled
    pub fn keepalive(&self) -> Option<Duration> {
        (self.keepalive_interval > 0).then(|| Duration::from_secs(self.keepalive_interval))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.addr.trim().is_empty() {
            return Err("SSH server address is required".to_string());
        }
        if crate::transport::split_host_port(&self.addr).is_none() {
            return Err(format!("SSH server address must be host:port, got {}", self.addr));
        }
        if self.username.trim().is_empty() {
            return Err("SSH username is required".to_string());
        }
        if self.connect_timeout == 0 {
            return Err("SSH connect timeout must be positive".to_string());
        }
        self.tcp.validate()
    }
}

/// Host key verification policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HostKeyPolicy {
    /// Accept any host key
    #[default]
    AcceptAny,
    /// Accept only the key with this SHA256 fingerprint
    Fingerprint(String),
    /// Trust on first use, persisting keys to this file
    KnownHosts(PathBuf),
}

impl FromStr for HostKeyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "accept-any" {
            return Ok(HostKeyPolicy::AcceptAny);
        }
        match s.split_once(':') {
            Some(("fingerprint", fp)) if !fp.is_empty() => {
                Ok(HostKeyPolicy::Fingerprint(fp.to_string()))
            }
            Some(("known-hosts", path)) if !path.is_empty() => {
                Ok(HostKeyPolicy::KnownHosts(PathBuf::from(path)))
            }
            _ => Err(format!("Unknown host key policy: {}", s)),
        }
    }
}

impl TryFrom<String> for HostKeyPolicy {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HostKeyPolicy> for String {
    fn from(policy: HostKeyPolicy) -> Self {
        policy.to_string()
    }
}

impl fmt::Display for HostKeyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostKeyPolicy::AcceptAny => write!(f, "accept-any"),
            HostKeyPolicy::Fingerprint(fp) => write!(f, "fingerprint:{}", fp),
            HostKeyPolicy::KnownHosts(path) => write!(f, "known-hosts:{}", path.display()),
        }
    }
}

fn default_nodelay() -> bool {
    true
}

/// Default keepalive seconds
fn default_keepalive_secs() -> u64 {
    20
}

/// Default keepalive interval
fn default_keepalive_interval() -> u64 {
    8
}

/// TCP socket configuration for the SSH transport
///
/// `keepalive_secs = 0` turns TCP keepalive off.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TcpConfig {
    /// Enable TCP_NODELAY
    #[serde(default = "default_nodelay")]
    pub nodelay: bool,

    /// Idle time before TCP keepalive probes start, in seconds
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,

    /// Interval between TCP keepalive probes, in seconds
    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval: u64,
}

impl Default for TcpConfig {
    fn default() -> Self {
        TcpConfig {
            nodelay: default_nodelay(),
            keepalive_secs: default_keepalive_secs(),
            keepalive_interval: default_keepalive_interval(),
        }
    }
}

impl TcpConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.keepalive_secs > 0 && self.keepalive_interval == 0 {
            return Err("TCP keepalive interval must be positive when keepalive is on".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssh_config_new() {
        let config = SshConfig::new("server:22", "alice");
        assert_eq!(config.addr, "server:22");
        assert_eq!(config.username, "alice");
        assert!(config.password.is_empty());
        assert!(config.private_keys.is_empty());
        assert!(config.agent_addr.is_none());
        assert_eq!(config.host_key_policy, HostKeyPolicy::AcceptAny);
        assert_eq!(config.connect_timeout, 10);
        assert_eq!(config.keepalive(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_keepalive_zero_disables() {
        let mut config = SshConfig::new("server:22", "alice");
        config.keepalive_interval = 0;
        assert_eq!(config.keepalive(), None);
        assert!(config.validate().is_ok());

        // TCP keepalive settings do not leak into the SSH keepalive
        let mut config = SshConfig::new("server:22", "alice");
        config.tcp.keepalive_secs = 0;
        assert_eq!(config.keepalive(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_validate() {
        assert!(SshConfig::new("server:22", "alice").validate().is_ok());
        assert!(SshConfig::new("", "alice").validate().is_err());
        assert!(SshConfig::new("server", "alice").validate().is_err());
        assert!(SshConfig::new("server:22", "").validate().is_err());

        let mut config = SshConfig::new("server:22", "alice");
        config.connect_timeout = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_host_key_policy_parse() {
        assert_eq!(
            "accept-any".parse::<HostKeyPolicy>().unwrap(),
            HostKeyPolicy::AcceptAny
        );
        assert_eq!("".parse::<HostKeyPolicy>().unwrap(), HostKeyPolicy::AcceptAny);
        assert_eq!(
            "fingerprint:SHA256:abc".parse::<HostKeyPolicy>().unwrap(),
            HostKeyPolicy::Fingerprint("SHA256:abc".to_string())
        );
        assert_eq!(
            "known-hosts:/tmp/known".parse::<HostKeyPolicy>().unwrap(),
            HostKeyPolicy::KnownHosts(PathBuf::from("/tmp/known"))
        );
        assert!("known-hosts:".parse::<HostKeyPolicy>().is_err());
        assert!("tofu".parse::<HostKeyPolicy>().is_err());
    }

    #[test]
    fn test_host_key_policy_display_round_trip() {
        let policy = HostKeyPolicy::Fingerprint("SHA256:xyz".to_string());
        assert_eq!(policy.to_string().parse::<HostKeyPolicy>().unwrap(), policy);
    }

    #[test]
    fn test_tcp_config_default() {
        let config = TcpConfig::default();
        assert!(config.nodelay);
        assert_eq!(config.keepalive_secs, 20);
        assert_eq!(config.keepalive_interval, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tcp_config_validate() {
        let config = TcpConfig {
            keepalive_secs: 0,
            keepalive_interval: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let config = TcpConfig {
            keepalive_secs: 20,
            keepalive_interval: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
