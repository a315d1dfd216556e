// src/transport/simulator.rs

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::future::Future;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, TransportError};

/// 故障注入策略
pub trait FailurePolicy: Send {
    /// 针对单次调用判定是否注入故障
    fn should_fail(&mut self) -> bool;

    /// 运行时调整开关与概率；不支持调整的策略忽略即可
    fn configure(&mut self, _enabled: bool, _rate: f64) {}
}

/// 按概率独立注入故障，种子固定时结果可复现
pub struct RandomFailure {
    enabled: bool,
    rate: f64,
    rng: StdRng,
}

impl RandomFailure {
    pub fn new(enabled: bool, rate: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            enabled,
            rate: rate.clamp(0.0, 1.0),
            rng,
        }
    }
}

impl FailurePolicy for RandomFailure {
    fn should_fail(&mut self) -> bool {
        self.enabled && self.rng.gen_bool(self.rate)
    }

    fn configure(&mut self, enabled: bool, rate: f64) {
        self.enabled = enabled;
        self.rate = rate.clamp(0.0, 1.0);
    }
}

/// 按脚本逐次返回结果，脚本耗尽后不再失败（测试用）
#[derive(Debug, Default)]
pub struct ScriptedFailure {
    script: VecDeque<bool>,
}

impl ScriptedFailure {
    pub fn new(script: impl IntoIterator<Item = bool>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }
}

impl FailurePolicy for ScriptedFailure {
    fn should_fail(&mut self) -> bool {
        self.script.pop_front().unwrap_or(false)
    }
}

struct TransportState {
    policy: Box<dyn FailurePolicy>,
    latency_min_ms: u64,
    latency_max_ms: u64,
    rng: StdRng,
}

/// 模拟网络层：随机延迟 + 故障注入 + 超时
///
/// 被包装的操作只有在延迟结束且未注入故障时才会执行，
/// 因此失败或超时的调用不会产生任何副作用。
pub struct TransportSimulator {
    state: Mutex<TransportState>,
    timeout: Duration,
}

impl TransportSimulator {
    pub fn new(config: &ClientConfig) -> Self {
        // 故障判定与延迟使用不同的随机流，互不干扰
        let policy = RandomFailure::new(
            config.error_simulation,
            config.error_rate,
            config.seed.map(|s| s.wrapping_add(1)),
        );
        Self::with_policy(config, Box::new(policy))
    }

    pub fn with_policy(config: &ClientConfig, policy: Box<dyn FailurePolicy>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(2)),
            None => StdRng::from_entropy(),
        };
        Self {
            state: Mutex::new(TransportState {
                policy,
                latency_min_ms: config.latency_min_ms,
                latency_max_ms: config.latency_max_ms,
                rng,
            }),
            timeout: config.request_timeout(),
        }
    }

    /// 开关故障注入，`rate` 必须在 [0, 1] 内
    pub async fn set_error_simulation(&self, enabled: bool, rate: f64) -> Result<(), ClientError> {
        if !(0.0..=1.0).contains(&rate) {
            return Err(ClientError::validation(format!("error rate {rate} outside [0, 1]")));
        }
        self.state.lock().await.policy.configure(enabled, rate);
        warn!(enabled, rate, "error simulation updated");
        Ok(())
    }

    pub async fn set_latency(&self, min: Duration, max: Duration) -> Result<(), ClientError> {
        if min > max {
            return Err(ClientError::validation("latency min exceeds max"));
        }
        let mut state = self.state.lock().await;
        state.latency_min_ms = min.as_millis() as u64;
        state.latency_max_ms = max.as_millis() as u64;
        Ok(())
    }

    /// 经由模拟网络执行一次调用
    pub async fn call<T, F, Fut>(&self, route: &'static str, op: F) -> Result<T, TransportError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let (latency, inject_failure) = {
            let mut state = self.state.lock().await;
            let (min, max) = (state.latency_min_ms, state.latency_max_ms);
            let latency = Duration::from_millis(state.rng.gen_range(min..=max));
            (latency, state.policy.should_fail())
        };

        let exchange = async move {
            sleep(latency).await;
            if inject_failure {
                return Err(TransportError::Injected { route });
            }
            Ok(op().await)
        };

        match timeout(self.timeout, exchange).await {
            Ok(Ok(value)) => {
                debug!(route, latency_ms = latency.as_millis() as u64, "transport call completed");
                Ok(value)
            }
            Ok(Err(err)) => {
                debug!(route, %err, "transport call failed");
                Err(err)
            }
            Err(_) => Err(TransportError::Timeout {
                route,
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}
