use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::RwLock;

use crate::config::ServerConfig;
use crate::registry::RoomRegistry;
use crate::store::Store;

pub type SharedRegistry = Arc<RwLock<RoomRegistry>>;
pub type SharedStore = Arc<RwLock<Store>>;

#[derive(Clone)]
pub struct AppState {
    pub registry: SharedRegistry,
    pub store: SharedStore,
    pub ws_connection_count: Arc<AtomicUsize>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            registry: Arc::new(RwLock::new(RoomRegistry::new())),
            store: Arc::new(RwLock::new(Store::new())),
            ws_connection_count: Arc::new(AtomicUsize::new(0)),
            config: Arc::new(config),
        }
    }
}

/// RAII counter for live connections; dropping it releases the slot.
pub struct ConnectionGuard {
    count: Arc<AtomicUsize>,
}

impl ConnectionGuard {
    pub fn new(count: Arc<AtomicUsize>) -> Self {
        count.fetch_add(1, Ordering::Relaxed);
        Self { count }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::Relaxed);
    }
}
