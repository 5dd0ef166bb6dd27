//! SOCKS5 front-end
//!
//! Speaks the SOCKS5 protocol to local clients and serves CONNECT requests
//! by dialing through the tunnel. Only the "no authentication" method and
//! the CONNECT command are offered.

mod auth;
mod command;
mod consts;
mod handler;
mod relay;
mod resolver;
mod types;

pub use auth::negotiate_auth;
pub use command::{build_reply, parse_command, send_reply, send_success, RequestError};
pub use consts::*;
pub use handler::handle_socks5_on_stream;
pub use relay::relay_tcp;
pub use resolver::{NameResolver, NoopResolver};
pub use types::{SocksCommand, TargetAddr};
