//! 模拟零售媒体广告服务：个性化竞价、事件批量上报与 ROAS 归因

pub mod api;
pub mod bidding;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod mock_server;
pub mod model;
pub mod tracking;
pub mod transport;

pub use client::{ApiClient, ClientRegistry, FlushOutcome};
pub use config::ClientConfig;
pub use error::{ClientError, ConfigError, TransportError};
pub use mock_server::MockRetailMediaServer;
