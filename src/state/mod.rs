pub mod owned;
pub mod picker;
pub mod preference;
pub mod search;
pub mod session;
mod sse;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig,
    dao::{
        catalog::{CatalogClient, CatalogResult},
        inventory_store::InventoryStore,
    },
    error::ServiceError,
};

pub use self::sse::{HouseholdHubs, SseHub};
use self::{picker::PickerSession, search::SearchSequencer, session::SessionRegistry};

pub type SharedState = Arc<AppState>;

const HOUSEHOLD_SSE_CAPACITY: usize = 32;

/// Central application state storing sessions, per-user picker state and the storage handle.
pub struct AppState {
    config: AppConfig,
    store: RwLock<Option<Arc<dyn InventoryStore>>>,
    degraded: watch::Sender<bool>,
    sessions: SessionRegistry,
    pickers: DashMap<String, PickerSession>,
    searches: SearchSequencer,
    household_sse: HouseholdHubs,
    catalog: CatalogClient,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> CatalogResult<SharedState> {
        let catalog = CatalogClient::new(config.catalog.clone())?;
        let (degraded_tx, _rx) = watch::channel(true);
        Ok(Arc::new(Self {
            config,
            store: RwLock::new(None),
            degraded: degraded_tx,
            sessions: SessionRegistry::new(),
            pickers: DashMap::new(),
            searches: SearchSequencer::new(),
            household_sse: HouseholdHubs::new(HOUSEHOLD_SSE_CAPACITY),
            catalog,
        }))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Install a new inventory store implementation and leave degraded mode.
    pub async fn install_store(&self, store: Arc<dyn InventoryStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Obtain the inventory store, failing while the backend is missing or degraded.
    pub async fn require_store(&self) -> Result<Arc<dyn InventoryStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        let guard = self.store.read().await;
        guard.as_ref().cloned().ok_or(ServiceError::Degraded)
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Spin state keyed by user id.
    pub fn pickers(&self) -> &DashMap<String, PickerSession> {
        &self.pickers
    }

    pub fn searches(&self) -> &SearchSequencer {
        &self.searches
    }

    pub fn household_sse(&self) -> &HouseholdHubs {
        &self.household_sse
    }

    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }
}
