use crate::application::ports::{
    ConnectivityProbe, LocalStore, NetworkStatus, PlatformEvents, RemoteStore, SyncQueueStore,
};
use crate::application::services::{
    spawn_reconnect_watcher, LoadingTracker, OfflineRepository, SyncService,
};
use crate::domain::entities::farm::FarmEntity;
use crate::domain::value_objects::AccountId;
use crate::infrastructure::database::{Database, DbPool};
use crate::infrastructure::network::{NetworkMonitor, RemoteHealthProbe};
use crate::infrastructure::notifications::ChannelNotifier;
use crate::infrastructure::offline::{SqliteLocalStore, SqliteSyncQueue};
use crate::infrastructure::remote::RestRemoteStore;
use crate::shared::config::AppConfig;
use crate::shared::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;

/// Every long-lived service, constructed once and shared by reference.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub local_store: Arc<dyn LocalStore>,
    pub sync_queue: Arc<dyn SyncQueueStore>,
    pub sync_service: Arc<SyncService>,
    pub network: NetworkStatus,
    pub platform_events: PlatformEvents,
    pub loading: LoadingTracker,
    pub notifier: ChannelNotifier,
    background: Arc<Vec<AbortHandle>>,
}

impl AppState {
    /// Opens the configured database and wires the REST remote with an HTTP reachability probe.
    pub async fn new(config: AppConfig) -> Result<Self, AppError> {
        config.validate().map_err(AppError::ConfigurationError)?;
        let pool = Database::initialize(&config.database).await?;
        let remote = Arc::new(RestRemoteStore::new(&config.remote)?);
        let probe = Arc::new(RemoteHealthProbe::new(
            &config.remote,
            Duration::from_secs(config.network.health_check_timeout),
        )?);
        Self::with_parts(config, pool, remote, probe).await
    }

    /// Wiring with caller-supplied remote and connectivity source.
    pub async fn with_parts(
        config: AppConfig,
        pool: DbPool,
        remote: Arc<dyn RemoteStore>,
        probe: Arc<dyn ConnectivityProbe>,
    ) -> Result<Self, AppError> {
        let local_store: Arc<dyn LocalStore> = Arc::new(SqliteLocalStore::new(pool.clone()));
        let sync_queue: Arc<dyn SyncQueueStore> = Arc::new(SqliteSyncQueue::new(pool.clone()));
        let notifier = ChannelNotifier::new();

        let (platform_events, signals) = NetworkMonitor::platform_channel();
        let (network, monitor) = NetworkMonitor::start(
            probe,
            Duration::from_millis(config.network.probe_delay_ms),
            signals,
        )
        .await;

        let sync_service = Arc::new(SyncService::new(
            Arc::clone(&local_store),
            Arc::clone(&sync_queue),
            remote,
            network.clone(),
            Arc::new(notifier.clone()),
            &config.sync,
        ));
        let watcher = spawn_reconnect_watcher(Arc::clone(&sync_service));

        tracing::info!(
            database = %config.database.url,
            online = network.is_online(),
            auto_sync = config.sync.auto_sync,
            "offline store ready"
        );

        Ok(Self {
            config,
            db_pool: pool,
            local_store,
            sync_queue,
            sync_service,
            network,
            platform_events,
            loading: LoadingTracker::new(),
            notifier,
            background: Arc::new(vec![monitor.abort_handle(), watcher.abort_handle()]),
        })
    }

    /// Façade for one table, bound to `account_id` (or to nothing when signed out).
    pub fn repository<T: FarmEntity>(&self, account_id: Option<AccountId>) -> OfflineRepository<T> {
        OfflineRepository::new(
            Arc::clone(&self.local_store),
            Arc::clone(&self.sync_service),
            self.loading.clone(),
            Arc::new(self.notifier.clone()),
            account_id,
        )
    }

    /// Stops the network monitor and the reconnect watcher.
    pub fn shutdown(&self) {
        for handle in self.background.iter() {
            handle.abort();
        }
    }
}
