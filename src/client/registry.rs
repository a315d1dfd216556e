// src/client/registry.rs

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::client::facade::ApiClient;
use crate::config::ClientConfig;
use crate::error::{ClientError, ConfigError};
use crate::mock_server::MockRetailMediaServer;
use crate::model::catalog::DEMO_CATALOG;
use crate::model::status::PerformanceReport;
use crate::transport::TransportSimulator;

/// 客户端注册表
/// 由调用方持有，显式管理客户端生命周期；服务端与传输层在多次初始化之间共享
pub struct ClientRegistry {
    config: ClientConfig,
    backend: Arc<MockRetailMediaServer>,
    transport: Arc<TransportSimulator>,
    current: RwLock<Option<ApiClient>>,
}

impl ClientRegistry {
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let backend = Arc::new(MockRetailMediaServer::new(DEMO_CATALOG.clone(), config.seed));
        let transport = Arc::new(TransportSimulator::new(&config));
        Ok(Self::with_parts(config, backend, transport))
    }

    pub fn with_parts(
        config: ClientConfig,
        backend: Arc<MockRetailMediaServer>,
        transport: Arc<TransportSimulator>,
    ) -> Self {
        Self {
            config,
            backend,
            transport,
            current: RwLock::new(None),
        }
    }

    /// 创建（或替换）客户端；旧实例会先停止其后台任务
    pub async fn initialize(&self, credential: &str) -> Result<ApiClient, ClientError> {
        let mut current = self.current.write().await;
        let client = ApiClient::start(credential, &self.config, self.backend.clone(), self.transport.clone())?;
        if let Some(previous) = current.replace(client.clone()) {
            previous.shutdown().await;
            info!("previous client replaced");
        }
        Ok(client)
    }

    pub async fn client(&self) -> Result<ApiClient, ClientError> {
        self.current.read().await.clone().ok_or(ClientError::NotInitialized)
    }

    pub async fn teardown(&self) {
        let previous = self.current.write().await.take();
        if let Some(client) = previous {
            client.shutdown().await;
        }
    }

    pub async fn set_error_simulation(&self, enabled: bool, rate: f64) -> Result<(), ClientError> {
        self.transport.set_error_simulation(enabled, rate).await
    }

    pub async fn clear_personalization(&self) {
        self.backend.clear_personalization().await;
    }

    pub async fn performance(&self) -> PerformanceReport {
        self.backend.performance().await
    }

    pub fn backend(&self) -> &Arc<MockRetailMediaServer> {
        &self.backend
    }

    pub fn transport(&self) -> &Arc<TransportSimulator> {
        &self.transport
    }
}
