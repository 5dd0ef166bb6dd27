//! Settings from command-line flags and `SSHSOCKS_*` variables
//!
//! Every setting has a flag and an environment variable; clap reads both and
//! the flag wins. Used when no TOML file is given.

use super::socks::{SocksConfig, DEFAULT_LISTEN_ADDR, DEFAULT_REQUEST_TIMEOUT};
use super::ssh::{HostKeyPolicy, SshConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_KEEPALIVE_INTERVAL};
use super::Config;
use crate::error::Error;
use clap::Args;
use std::path::PathBuf;

/// Proxy settings, flattened into the binary's arguments
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// SSH server address (host:port)
    #[arg(long, env = "SSHSOCKS_SSH_ADDR")]
    pub ssh_addr: Option<String>,

    /// SSH username
    #[arg(long, env = "SSHSOCKS_SSH_USER")]
    pub ssh_user: Option<String>,

    /// SSH password, tried after every key
    #[arg(long, env = "SSHSOCKS_SSH_PASSWORD", hide_env_values = true)]
    pub ssh_password: Option<String>,

    /// Private key files, comma-separated
    #[arg(long, env = "SSHSOCKS_SSH_KEYS", value_delimiter = ',')]
    pub ssh_keys: Vec<PathBuf>,

    /// SSH agent socket
    #[arg(long, env = "SSHSOCKS_SSH_AGENT")]
    pub ssh_agent: Option<String>,

    /// Agent socket used when --ssh-agent is not set
    #[arg(long, env = "SSH_AUTH_SOCK", hide = true)]
    pub ssh_auth_sock: Option<String>,

    /// Host key policy: accept-any, fingerprint:SHA256:... or known-hosts:<path>
    #[arg(long, env = "SSHSOCKS_SSH_HOST_KEY_POLICY", default_value = "accept-any")]
    pub ssh_host_key_policy: HostKeyPolicy,

    /// SSH connect timeout in seconds
    #[arg(long, env = "SSHSOCKS_SSH_CONNECT_TIMEOUT", default_value_t = DEFAULT_CONNECT_TIMEOUT)]
    pub ssh_connect_timeout: u64,

    /// Seconds between SSH keepalives, 0 to disable
    #[arg(long, env = "SSHSOCKS_SSH_KEEPALIVE", default_value_t = DEFAULT_KEEPALIVE_INTERVAL)]
    pub ssh_keepalive: u64,

    /// Local SOCKS5 listen address
    #[arg(long, env = "SSHSOCKS_SOCKS_ADDR", default_value = DEFAULT_LISTEN_ADDR)]
    pub socks_addr: String,

    /// Time allowed to open one forwarded connection, in seconds
    #[arg(long, env = "SSHSOCKS_SOCKS_TIMEOUT", default_value_t = DEFAULT_REQUEST_TIMEOUT)]
    pub socks_timeout: u64,
}

impl ConfigArgs {
    /// Build and validate the configuration
    ///
    /// Empty values count as unset.
    pub fn into_config(self) -> Result<Config, Error> {
        let mut ssh = SshConfig::new(
            non_empty(self.ssh_addr).unwrap_or_default(),
            non_empty(self.ssh_user).unwrap_or_default(),
        );
        ssh.password = self.ssh_password.unwrap_or_default();
        ssh.private_keys = self
            .ssh_keys
            .into_iter()
            .filter(|path| !path.as_os_str().is_empty())
            .collect();
        ssh.agent_addr = non_empty(self.ssh_agent).or_else(|| non_empty(self.ssh_auth_sock));
        ssh.host_key_policy = self.ssh_host_key_policy;
        ssh.connect_timeout = self.ssh_connect_timeout;
        ssh.keepalive_interval = self.ssh_keepalive;

        let socks = SocksConfig {
            listen_addr: self.socks_addr,
            request_timeout: self.socks_timeout,
        };

        let config = Config { ssh, socks };
        config.validate()?;
        Ok(config)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
