use std::io;
use std::net::IpAddr;

use async_trait::async_trait;

/// Name resolution used to observe propagation.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, name: &str) -> io::Result<Vec<IpAddr>>;
}

/// Resolves through the host's configured resolver (A/AAAA only).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, name: &str) -> io::Result<Vec<IpAddr>> {
        let mut addresses: Vec<IpAddr> = tokio::net::lookup_host((name, 0))
            .await?
            .map(|addr| addr.ip())
            .collect();
        addresses.sort();
        addresses.dedup();
        Ok(addresses)
    }
}
