#![allow(dead_code)]

pub mod fake_remote;

use fake_remote::FakeRemote;
use pondkeeper_lib::application::ports::PlatformSignal;
use pondkeeper_lib::domain::value_objects::AccountId;
use pondkeeper_lib::infrastructure::database::Database;
use pondkeeper_lib::infrastructure::network::ManualConnectivity;
use pondkeeper_lib::{AppConfig, AppState};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub const ACCOUNT_A: &str = "account-a";
pub const ACCOUNT_B: &str = "account-b";

pub struct TestApp {
    pub state: AppState,
    pub remote: Arc<FakeRemote>,
    pub connectivity: Arc<ManualConnectivity>,
}

impl TestApp {
    pub async fn start(online: bool) -> Self {
        Self::with_remote(online, FakeRemote::new()).await
    }

    pub async fn with_remote(online: bool, remote: FakeRemote) -> Self {
        let mut config = AppConfig::default();
        config.sync.backoff_base_ms = 0;
        config.sync.backoff_max_ms = 0;
        config.network.probe_delay_ms = 50;

        let remote = Arc::new(remote);
        let connectivity = Arc::new(ManualConnectivity::new(online));
        let pool = Database::in_memory().await.expect("in-memory sqlite");
        let state = AppState::with_parts(config, pool, remote.clone(), connectivity.clone())
            .await
            .expect("app state");

        Self {
            state,
            remote,
            connectivity,
        }
    }

    pub async fn go_online(&self) {
        self.connectivity.set_online(true);
        assert!(self.state.platform_events.send(PlatformSignal::Online).await);
        let mut rx = self.state.network.subscribe();
        let _ = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| s.is_online)).await;
    }

    pub async fn go_offline(&self) {
        self.connectivity.set_online(false);
        assert!(self.state.platform_events.send(PlatformSignal::Offline).await);
        let mut rx = self.state.network.subscribe();
        let _ = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| !s.is_online)).await;
    }

    pub async fn pending(&self) -> u32 {
        self.state.sync_service.status().await.unwrap().pending_count
    }
}

pub fn account(id: &str) -> AccountId {
    AccountId::new(id.to_string()).unwrap()
}

/// Polls `check` until it holds, failing the test after a few seconds.
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(3), async {
        while !check().await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
