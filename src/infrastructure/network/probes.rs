use crate::application::ports::connectivity::ConnectivityProbe;
use crate::shared::config::RemoteConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Connectivity flag owned by the host, e.g. mirrored from an OS reachability API.
#[derive(Debug)]
pub struct ManualConnectivity {
    online: AtomicBool,
    connection_type: Option<String>,
}

impl ManualConnectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
            connection_type: None,
        }
    }

    pub fn with_connection_type(online: bool, connection_type: impl Into<String>) -> Self {
        Self {
            online: AtomicBool::new(online),
            connection_type: Some(connection_type.into()),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConnectivityProbe for ManualConnectivity {
    async fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn connection_type(&self) -> Option<String> {
        self.connection_type.clone()
    }
}

/// Treats any HTTP answer from the remote as "reachable".
pub struct RemoteHealthProbe {
    client: Client,
    url: Url,
    api_key: Option<String>,
}

impl RemoteHealthProbe {
    pub fn new(remote: &RemoteConfig, timeout: Duration) -> Result<Self, AppError> {
        let base = remote
            .base_url
            .as_deref()
            .ok_or_else(|| AppError::ConfigurationError("remote base_url is not set".into()))?;
        let raw = format!("{}/rest/v1/", base.trim_end_matches('/'));
        let url = Url::parse(&raw)
            .map_err(|e| AppError::ConfigurationError(format!("Invalid remote base_url: {e}")))?;
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url,
            api_key: remote.api_key.clone(),
        })
    }
}

#[async_trait]
impl ConnectivityProbe for RemoteHealthProbe {
    async fn is_online(&self) -> bool {
        let mut request = self.client.head(self.url.clone());
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key);
        }

        match request.send().await {
            Ok(_) => true,
            Err(err) => {
                tracing::debug!(target: "network::probe", error = %err, "remote unreachable");
                false
            }
        }
    }
}
