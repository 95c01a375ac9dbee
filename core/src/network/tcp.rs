use std::time::Duration;

use async_trait::async_trait;
use bmcfleet_common::network::endpoint::Endpoint;
use bmcfleet_common::network::reachability::Reachability;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

/// Reachability by full TCP handshake against the controller port.
///
/// A refused connection counts as unreachable: the host may be up, but nothing
/// manageable listens there.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpReachability;

#[async_trait]
impl Reachability for TcpReachability {
    async fn is_reachable(&self, endpoint: &Endpoint, probe_timeout: Duration) -> bool {
        handshake_probe(endpoint, probe_timeout).await
    }
}

pub async fn handshake_probe(endpoint: &Endpoint, probe_timeout: Duration) -> bool {
    match timeout(probe_timeout, TcpStream::connect(endpoint.socket_addr())).await {
        Ok(Ok(_stream)) => true,
        Ok(Err(err)) => {
            trace!(%endpoint, "connect failed: {err}");
            false
        }
        Err(_elapsed) => false,
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
