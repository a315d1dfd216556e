// src/config/config_manager.rs

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// 客户端与模拟传输层的运行参数
/// 所有时间字段以毫秒为单位，便于直接写在 JSON 配置文件中
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    pub flush_interval_ms: u64,   // 事件批量上报间隔
    pub request_timeout_ms: u64,  // 单次调用超时（竞价与上报各自独立计时）
    pub latency_min_ms: u64,      // 模拟网络延迟下限
    pub latency_max_ms: u64,      // 模拟网络延迟上限
    pub error_simulation: bool,   // 是否开启故障注入
    pub error_rate: f64,          // 故障注入概率 [0, 1]
    pub success_rate_weight: f64, // 成功率 EMA 权重
    pub max_error_log: usize,     // 错误日志保留条数
    pub seed: Option<u64>,        // 随机种子，None 表示使用系统熵
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            flush_interval_ms: 2_000,
            request_timeout_ms: 5_000,
            latency_min_ms: 100,
            latency_max_ms: 300,
            error_simulation: false,
            error_rate: 0.3,
            success_rate_weight: 0.1,
            max_error_log: 10,
            seed: None,
        }
    }
}

impl ClientConfig {
    /// 从 JSON 文件加载配置，缺省字段使用默认值
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: ClientConfig = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flush_interval_ms == 0 {
            return Err(ConfigError::Invalid("flush_interval_ms must be positive".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid("request_timeout_ms must be positive".into()));
        }
        if self.latency_min_ms > self.latency_max_ms {
            return Err(ConfigError::Invalid(format!(
                "latency range is empty: {}..={}",
                self.latency_min_ms, self.latency_max_ms
            )));
        }
        if !(0.0..=1.0).contains(&self.error_rate) {
            return Err(ConfigError::Invalid(format!("error_rate {} outside [0, 1]", self.error_rate)));
        }
        if !(self.success_rate_weight > 0.0 && self.success_rate_weight <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "success_rate_weight {} outside (0, 1]",
                self.success_rate_weight
            )));
        }
        if self.max_error_log == 0 {
            return Err(ConfigError::Invalid("max_error_log must be positive".into()));
        }
        Ok(())
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
