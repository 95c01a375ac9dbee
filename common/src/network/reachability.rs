use std::time::Duration;

use async_trait::async_trait;

use crate::network::endpoint::Endpoint;

/// Cheap transport-level check run before any credential is spent on a target.
#[async_trait]
pub trait Reachability: Send + Sync {
    /// Returns `true` if `endpoint` accepted a connection within `timeout`.
    ///
    /// Implementations must return within `timeout`.
    async fn is_reachable(&self, endpoint: &Endpoint, timeout: Duration) -> bool;
}
