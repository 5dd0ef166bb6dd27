//! SOCKS5 request parsing and replies

mod parser;
mod reply;

pub use parser::{parse_command, RequestError};
pub use reply::{build_reply, send_reply, send_success};
