//! Test utilities for sshsocks
//!
//! Provides an in-process SSH server that accepts `direct-tcpip` channels
//! and answers each one with the `host:port` it was asked to reach.

#![allow(dead_code)]

use rand::rngs::OsRng;
use russh::keys::ssh_key::private::Ed25519Keypair;
use russh::keys::ssh_key::LineEnding;
use russh::keys::{HashAlg, PrivateKey, PublicKey};
use russh::server::{Auth, Handler, Msg, Session};
use russh::{Channel, MethodKind, MethodSet};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Bytes a client sends on a forwarded channel before the server answers
pub const PING: &[u8; 4] = b"ping";

/// Generate a fresh Ed25519 key
pub fn generate_ed25519_key() -> PrivateKey {
    PrivateKey::from(Ed25519Keypair::random(&mut OsRng))
}

/// Write a fresh key to `dir/name` in OpenSSH format
pub fn write_private_key(dir: &Path, name: &str) -> (PathBuf, PrivateKey) {
    let key = generate_ed25519_key();
    let path = dir.join(name);
    let openssh = key.to_openssh(LineEnding::LF).unwrap();
    std::fs::write(&path, openssh.as_bytes()).unwrap();
    (path, key)
}

/// Address of a port nothing listens on
pub async fn unused_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);
    addr
}

/// Counters shared between the test and the server
#[derive(Debug, Default)]
pub struct ServerState {
    /// TCP connections accepted
    pub connections: AtomicUsize,
    /// Successful authentications
    pub authenticated: AtomicUsize,
    /// Method of every accepted authentication ("password" or "publickey")
    pub logins: Mutex<Vec<&'static str>>,
    /// `host:port` of every direct-tcpip channel opened
    pub channels: Mutex<Vec<String>>,
}

/// Running test SSH server
pub struct TestSshServer {
    /// Listen address
    pub addr: SocketAddr,
    /// Public half of the host key
    pub host_key: PublicKey,
    /// SHA256 fingerprint of the host key
    pub host_key_fingerprint: String,
    /// Shared counters
    pub state: Arc<ServerState>,
}

impl TestSshServer {
    /// Start a server accepting `password`, and `authorized_key` if given
    pub async fn spawn(password: &str, authorized_key: Option<PublicKey>) -> Self {
        let host_key = generate_ed25519_key();
        let host_public_key = host_key.public_key().clone();
        let host_key_fingerprint = host_public_key.fingerprint(HashAlg::Sha256).to_string();

        let mut methods = MethodSet::empty();
        methods.push(MethodKind::Password);
        methods.push(MethodKind::PublicKey);

        let config = Arc::new(russh::server::Config {
            methods,
            auth_rejection_time: Duration::from_millis(10),
            auth_rejection_time_initial: Some(Duration::from_secs(0)),
            keys: vec![host_key],
            ..Default::default()
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(ServerState::default());

        let accept_state = state.clone();
        let password = password.to_string();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                accept_state.connections.fetch_add(1, Ordering::SeqCst);

                let handler = TestHandler {
                    password: password.clone(),
                    authorized_key: authorized_key.clone(),
                    state: accept_state.clone(),
                };
                let config = config.clone();

                tokio::spawn(async move {
                    if let Ok(session) = russh::server::run_stream(config, socket, handler).await {
                        let _ = session.await;
                    }
                });
            }
        });

        Self {
            addr,
            host_key: host_public_key,
            host_key_fingerprint,
            state,
        }
    }

    /// Number of TCP connections accepted so far
    pub fn connections(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }

    /// Number of successful authentications so far
    pub fn authenticated(&self) -> usize {
        self.state.authenticated.load(Ordering::SeqCst)
    }

    /// Methods accepted so far, in order
    pub fn logins(&self) -> Vec<&'static str> {
        self.state.logins.lock().unwrap().clone()
    }

    /// Targets of every forwarded channel, sorted
    pub fn channels(&self) -> Vec<String> {
        let mut channels = self.state.channels.lock().unwrap().clone();
        channels.sort();
        channels
    }
}

struct TestHandler {
    password: String,
    authorized_key: Option<PublicKey>,
    state: Arc<ServerState>,
}

impl TestHandler {
    fn accept(&self, method: &'static str) -> Auth {
        self.state.authenticated.fetch_add(1, Ordering::SeqCst);
        self.state.logins.lock().unwrap().push(method);
        Auth::Accept
    }
}

impl Handler for TestHandler {
    type Error = russh::Error;

    async fn auth_password(&mut self, _user: &str, password: &str) -> Result<Auth, Self::Error> {
        if !self.password.is_empty() && password == self.password {
            Ok(self.accept("password"))
        } else {
            Ok(Auth::reject())
        }
    }

    async fn auth_publickey(&mut self, _user: &str, key: &PublicKey) -> Result<Auth, Self::Error> {
        match &self.authorized_key {
            Some(authorized) if authorized.key_data() == key.key_data() => Ok(self.accept("publickey")),
            _ => Ok(Auth::reject()),
        }
    }

    async fn channel_open_direct_tcpip(
        &mut self,
        channel: Channel<Msg>,
        host_to_connect: &str,
        port_to_connect: u32,
        _originator_address: &str,
        _originator_port: u32,
        _session: &mut Session,
    ) -> Result<bool, Self::Error> {
        let target = format!("{}:{}", host_to_connect, port_to_connect);
        self.state.channels.lock().unwrap().push(target.clone());

        tokio::spawn(async move {
            let mut stream = channel.into_stream();
            let mut ping = [0u8; 4];
            if stream.read_exact(&mut ping).await.is_ok() && &ping == PING {
                let _ = stream.write_all(target.as_bytes()).await;
                let _ = stream.flush().await;
            }
        });

        Ok(true)
    }
}

/// In-process SSH agent listening on a unix socket
#[cfg(unix)]
pub struct TestAgent {
    socket: PathBuf,
    _dir: tempfile::TempDir,
}

#[cfg(unix)]
#[derive(Clone)]
struct AllowAll;

#[cfg(unix)]
impl russh::keys::agent::server::Agent for AllowAll {}

#[cfg(unix)]
impl TestAgent {
    /// Start an agent holding `keys`
    pub async fn spawn(keys: &[PrivateKey]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("agent.sock");
        let listener = tokio::net::UnixListener::bind(&socket).unwrap();

        tokio::spawn(russh::keys::agent::server::serve(
            tokio_stream::wrappers::UnixListenerStream::new(listener),
            AllowAll,
        ));

        let agent = Self { socket, _dir: dir };
        let mut client = agent.client().await;
        for key in keys {
            client.add_identity(key, &[]).await.unwrap();
        }
        agent
    }

    /// Socket path, as configured in `SshConfig::agent_addr`
    pub fn addr(&self) -> String {
        self.socket.to_string_lossy().to_string()
    }

    /// Fresh client connection to the agent
    pub async fn client(
        &self,
    ) -> russh::keys::agent::client::AgentClient<tokio::net::UnixStream> {
        russh::keys::agent::client::AgentClient::connect_uds(&self.socket)
            .await
            .unwrap()
    }

    /// Drop every identity, so later signing requests fail
    pub async fn forget_all(&self) {
        self.client().await.remove_all_identities().await.unwrap();
    }
}
