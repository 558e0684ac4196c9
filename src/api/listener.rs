//! Port negotiation for the HTTP listener.

use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr};

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::error::DiagramSyncError;
use crate::Result;

/// Port tried first when nothing else is configured.
pub const DEFAULT_PORT: u16 = 6002;

/// How many ports above the preferred one may be tried.
pub const DEFAULT_PORT_RANGE: u16 = 18;

/// Bind `host:preferred`, walking upward on "address in use".
///
/// Ports `preferred..=preferred + range` are tried in order. Any bind error
/// other than [`ErrorKind::AddrInUse`] aborts immediately. Returns the
/// listener together with the port it actually holds.
pub async fn bind_with_retry(
    host: IpAddr,
    preferred: u16,
    range: u16,
) -> Result<(TcpListener, u16)> {
    let ceiling = preferred.saturating_add(range);
    let mut port = preferred;

    loop {
        match TcpListener::bind(SocketAddr::new(host, port)).await {
            Ok(listener) => {
                let bound = listener.local_addr()?.port();
                info!(port = bound, "listener bound");
                return Ok((listener, bound));
            }
            Err(e) if e.kind() == ErrorKind::AddrInUse => {
                if port >= ceiling {
                    return Err(DiagramSyncError::NoAvailablePort {
                        start: preferred,
                        end: ceiling,
                    });
                }
                warn!(port, next = port + 1, "port in use, trying next");
                port += 1;
            }
            Err(source) => return Err(DiagramSyncError::Bind { port, source }),
        }
    }
}
