// ABOUTME: Process-wide cache of management clients keyed by credential identity.
// ABOUTME: Thread-safe reads, TTL expiry, and rebuilds when a credential's secret changes.

use super::client::AppServiceClient;
use super::credentials::ServicePrincipal;
use super::error::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Builds a management client for a credential.
pub trait ClientFactory: Send + Sync {
    fn create(&self, credential: &ServicePrincipal) -> Result<Arc<dyn AppServiceClient>>;
}

struct CachedClient {
    credential: ServicePrincipal,
    client: Arc<dyn AppServiceClient>,
    created_at: Instant,
}

/// Lazily populated client cache shared across deployment runs.
///
/// A cached client is handed out only to a caller presenting the same
/// credential id, subscription and secret, and only while younger than the TTL.
pub struct ClientCache {
    factory: Box<dyn ClientFactory>,
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedClient>>,
}

impl std::fmt::Debug for ClientCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish()
    }
}

impl ClientCache {
    pub fn new(factory: impl ClientFactory + 'static, ttl: Duration) -> Self {
        Self {
            factory: Box::new(factory),
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get the client for a credential, building it on first use or after expiry.
    pub fn get_client(&self, credential: &ServicePrincipal) -> Result<Arc<dyn AppServiceClient>> {
        if let Some(client) = self.lookup(credential) {
            return Ok(client);
        }

        let mut entries = self.entries.write();
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.created_at.elapsed() < ttl);

        // Another run may have populated the entry while we waited for the lock.
        if let Some(entry) = entries.get(&credential.id)
            && self.is_usable(entry, credential)
        {
            return Ok(Arc::clone(&entry.client));
        }

        tracing::debug!("Creating management client for credential {}", credential.id);
        let client = self.factory.create(credential)?;
        entries.insert(
            credential.id.clone(),
            CachedClient {
                credential: credential.clone(),
                client: Arc::clone(&client),
                created_at: Instant::now(),
            },
        );
        Ok(client)
    }

    fn lookup(&self, credential: &ServicePrincipal) -> Option<Arc<dyn AppServiceClient>> {
        let entries = self.entries.read();
        entries
            .get(&credential.id)
            .filter(|entry| self.is_usable(entry, credential))
            .map(|entry| Arc::clone(&entry.client))
    }

    fn is_usable(&self, entry: &CachedClient, credential: &ServicePrincipal) -> bool {
        entry.credential.same_identity(credential) && entry.created_at.elapsed() < self.ttl
    }

    /// Drop the client cached for a credential id. Returns whether one was cached.
    pub fn evict(&self, credential_id: &str) -> bool {
        self.entries.write().remove(credential_id).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
