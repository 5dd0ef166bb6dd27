//! Configuration module for sshsocks
//!
//! Configuration is read either from a TOML file or from command-line flags
//! and `SSHSOCKS_*` environment variables. It is immutable once loaded.

mod args;
mod socks;
mod ssh;

pub use args::ConfigArgs;
pub use socks::{SocksConfig, DEFAULT_LISTEN_ADDR, DEFAULT_REQUEST_TIMEOUT};
pub use ssh::{
    HostKeyPolicy, SshConfig, TcpConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_KEEPALIVE_INTERVAL,
};

use crate::error::Error;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// SSH tunnel configuration
    pub ssh: SshConfig,

    /// Local SOCKS5 server configuration
    #[serde(default)]
    pub socks: SocksConfig,
}

impl Config {
    /// Validate the whole configuration
    pub fn validate(&self) -> Result<(), Error> {
        self.ssh.validate().map_err(Error::Config)?;
        self.socks.validate().map_err(Error::Config)
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let password = if self.ssh.password.is_empty() {
            "<empty>"
        } else {
            "[hidden]"
        };
        let agent = self.ssh.agent_addr.as_deref().unwrap_or("<none>");

        writeln!(f, "  {:<24} {}", "SSH Server Address:", self.ssh.addr)?;
        writeln!(f, "  {:<24} {}", "SSH Username:", self.ssh.username)?;
        writeln!(f, "  {:<24} {}", "SSH Password:", password)?;
        writeln!(f, "  {:<24}", "SSH Private Keys:")?;
        if self.ssh.private_keys.is_empty() {
            writeln!(f, "    <empty>")?;
        }
        for key in &self.ssh.private_keys {
            writeln!(f, "    -  {}", key.display())?;
        }
        writeln!(f, "  {:<24} {}", "SSH Agent Address:", agent)?;
        writeln!(f, "  {:<24} {}", "SSH Host Key Policy:", self.ssh.host_key_policy)?;
        write!(f, "  {:<24} {}", "SOCKS5 Server Address:", self.socks.listen_addr)
    }
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

    parse_config(&content)
}

/// Parse configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse configuration")?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config_str = r#"
[ssh]
addr = "bastion.example.com:22"
username = "alice"
"#;

        let config = parse_config(config_str).unwrap();
        assert_eq!(config.ssh.addr, "bastion.example.com:22");
        assert_eq!(config.ssh.host_key_policy, HostKeyPolicy::AcceptAny);
        assert_eq!(config.socks.listen_addr, DEFAULT_LISTEN_ADDR);
    }

    #[test]
    fn test_parse_full_config() {
        let config_str = r#"
[ssh]
addr = "bastion.example.com:2222"
username = "alice"
password = "secret"
private_keys = ["/home/alice/.ssh/id_ed25519"]
agent_addr = "/run/user/1000/ssh-agent.sock"
host_key_policy = "fingerprint:SHA256:abcdef"
connect_timeout = 5
keepalive_interval = 0

[ssh.tcp]
nodelay = false
keepalive_secs = 30
keepalive_interval = 10

[socks]
listen_addr = "127.0.0.1:1081"
request_timeout = 15
"#;

        let config = parse_config(config_str).unwrap();
        assert_eq!(config.ssh.private_keys.len(), 1);
        assert_eq!(
            config.ssh.host_key_policy,
            HostKeyPolicy::Fingerprint("SHA256:abcdef".to_string())
        );
        assert_eq!(config.ssh.keepalive(), None);
        assert!(!config.ssh.tcp.nodelay);
        assert_eq!(config.socks.request_timeout, 15);
    }

    #[test]
    fn test_parse_config_rejects_bad_policy() {
        let config_str = r#"
[ssh]
addr = "bastion:22"
username = "alice"
host_key_policy = "whatever"
"#;
        assert!(parse_config(config_str).is_err());
    }

    #[test]
    fn test_display_hides_password() {
        let mut config = Config {
            ssh: SshConfig::new("bastion:22", "alice"),
            socks: SocksConfig::default(),
        };
        let summary = config.to_string();
        assert!(summary.contains("<empty>"));

        config.ssh.password = "hunter2".to_string();
        let summary = config.to_string();
        assert!(summary.contains("[hidden]"));
        assert!(!summary.contains("hunter2"));
        assert!(summary.contains("bastion:22"));
    }
}
