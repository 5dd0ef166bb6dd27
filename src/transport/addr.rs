//! Address helpers
//!
//! Splits `host:port` strings without resolving them. Hostnames must reach
//! the remote end of the tunnel untouched, so nothing here performs DNS.

/// Split `host:port` into its parts
///
/// Bracketed IPv6 literals (`[::1]:443`) are unwrapped. Returns `None` when
/// the port is missing or not a valid `u16`, or the host is empty.
pub fn split_host_port(addr: &str) -> Option<(&str, u16)> {
    let (host, port) = addr.rsplit_once(':')?;
    let port = port.parse::<u16>().ok()?;

    let host = match host.strip_prefix('[') {
        Some(rest) => rest.strip_suffix(']')?,
        None if host.contains(':') => return None,
        None => host,
    };

    if host.is_empty() {
        return None;
    }

    Some((host, port))
}

/// Join a host and port, bracketing IPv6 literals
pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}
