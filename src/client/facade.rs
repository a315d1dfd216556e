// src/client/facade.rs

use chrono::Utc;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::client::health::HealthTracker;
use crate::client::queue::PendingEventQueue;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::logging::AuctionLog;
use crate::mock_server::MockRetailMediaServer;
use crate::model::auction::{AuctionRequest, AuctionResponse};
use crate::model::events::{EventAck, EventBatch};
use crate::model::status::IntegrationStatus;
use crate::transport::TransportSimulator;

const AUCTION_ROUTE: &str = "auctions";
const EVENTS_ROUTE: &str = "events";

/// 一次上报的结果
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct FlushOutcome {
    pub sent: usize,
    pub acks: Vec<EventAck>,
}

struct ClientInner {
    credential: String,
    backend: Arc<MockRetailMediaServer>,
    transport: Arc<TransportSimulator>,
    queue: Mutex<PendingEventQueue>,
    health: Mutex<HealthTracker>,
    stopped: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
    flush_task: Mutex<Option<JoinHandle<()>>>,
}

/// 零售媒体 API 客户端门面
///
/// - `create_auction`：同步往返，失败直接返回给调用方（不做本地重试）
/// - `report_event`：只入队，由后台定时任务批量上报
/// - `get_status`：返回状态快照
///
/// 句柄可廉价克隆，所有克隆共享同一个客户端实例；`shutdown` 后所有操作返回 `NotInitialized`。
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl ApiClient {
    /// 创建客户端并启动后台上报任务（必须在 tokio runtime 内调用）
    pub fn start(
        credential: &str,
        config: &ClientConfig,
        backend: Arc<MockRetailMediaServer>,
        transport: Arc<TransportSimulator>,
    ) -> Result<Self, ClientError> {
        validate_credential(credential)?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let flush_interval = config.flush_interval();

        let inner = Arc::new_cyclic(|weak: &Weak<ClientInner>| {
            let flush_task = tokio::spawn(run_flush_loop(weak.clone(), flush_interval, shutdown_rx));
            ClientInner {
                credential: credential.to_string(),
                backend,
                transport,
                queue: Mutex::new(PendingEventQueue::new()),
                health: Mutex::new(HealthTracker::new(config.success_rate_weight, config.max_error_log)),
                stopped: AtomicBool::new(false),
                shutdown_tx,
                flush_task: Mutex::new(Some(flush_task)),
            }
        });

        info!(
            credential = %mask_credential(&inner.credential),
            flush_interval_ms = config.flush_interval_ms,
            "retail media client started"
        );
        Ok(Self { inner })
    }

    pub fn is_running(&self) -> bool {
        !self.inner.stopped.load(Ordering::SeqCst)
    }

    fn ensure_running(&self) -> Result<(), ClientError> {
        if self.is_running() {
            Ok(())
        } else {
            Err(ClientError::NotInitialized)
        }
    }

    /// 发起竞价
    pub async fn create_auction(&self, request: &AuctionRequest) -> Result<AuctionResponse, ClientError> {
        self.ensure_running()?;
        request.validate()?;

        let mut log = AuctionLog::new(request);
        let started = Instant::now();
        let backend = &self.inner.backend;
        let result = self
            .inner
            .transport
            .call(AUCTION_ROUTE, || backend.run_auction(request))
            .await;
        let elapsed = started.elapsed().as_millis();

        // 先记账，再把结果交给调用方
        let mut health = self.inner.health.lock().await;
        match result {
            Ok(response) => {
                health.record_auction_success(Utc::now());
                log.set_success(&response, elapsed);
                info!(auction_log = %log.to_json(), "auction completed");
                Ok(response)
            }
            Err(err) => {
                let err = ClientError::from(err);
                health.record_auction_failure(&err, Utc::now());
                log.set_failure(err.is_timeout(), &err.to_string(), elapsed);
                warn!(auction_log = %log.to_json(), "auction failed");
                Err(err)
            }
        }
    }

    /// 事件入队，不会立即发送
    pub async fn report_event(&self, batch: EventBatch) -> Result<(), ClientError> {
        self.ensure_running()?;
        batch.validate()?;
        if batch.is_empty() {
            return Ok(());
        }
        let added = batch.len();
        let mut queue = self.inner.queue.lock().await;
        queue.merge(batch);
        debug!(added, pending = queue.len(), "events queued");
        Ok(())
    }

    /// 立即上报一次（后台任务按固定间隔调用同一逻辑）
    ///
    /// 发送在独立任务中进行：调用方中途放弃等待时，批次仍会发送或放回队列。
    pub async fn flush(&self) -> Result<FlushOutcome, ClientError> {
        self.ensure_running()?;
        let inner = Arc::clone(&self.inner);
        match tokio::spawn(async move { inner.flush().await }).await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            // runtime 正在关闭
            Err(_) => Err(ClientError::NotInitialized),
        }
    }

    pub async fn get_status(&self) -> IntegrationStatus {
        let pending = self.inner.queue.lock().await.len();
        self.inner.health.lock().await.snapshot(pending)
    }

    /// 清空错误日志（成功率与健康度保持不变）
    pub async fn clear_errors(&self) {
        self.inner.health.lock().await.clear_errors();
    }

    /// 停止客户端：取消后台任务，丢弃尚未上报的事件
    pub async fn shutdown(&self) {
        if self.inner.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.inner.shutdown_tx.send(true);
        let flush_task = self.inner.flush_task.lock().await.take();
        if let Some(handle) = flush_task {
            handle.abort();
            let _ = handle.await;
        }
        let dropped = self.inner.queue.lock().await.take().len();
        if dropped > 0 {
            warn!(dropped, "client shut down with pending events; dropping them");
        }
        info!("retail media client stopped");
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("credential", &mask_credential(&self.inner.credential))
            .field("running", &self.is_running())
            .finish()
    }
}

impl ClientInner {
    async fn flush(&self) -> Result<FlushOutcome, ClientError> {
        let batch = {
            let mut queue = self.queue.lock().await;
            if queue.is_empty() {
                return Ok(FlushOutcome::default());
            }
            queue.take()
        };
        let sent = batch.len();
        // 失败时需要把原批次放回队列，发送的是副本
        let payload = batch.clone();
        let backend = &self.backend;
        let stopped = &self.stopped;
        let result = self
            .transport
            .call(EVENTS_ROUTE, || async move {
                // 延迟期间客户端已停止则不再发送
                if stopped.load(Ordering::SeqCst) {
                    return None;
                }
                Some(backend.ingest_events(payload).await)
            })
            .await;

        match result {
            Ok(None) => {
                debug!(dropped = sent, "client stopped during flush; batch dropped");
                Err(ClientError::NotInitialized)
            }
            Err(_) if self.stopped.load(Ordering::SeqCst) => {
                // 停止时队列已清空，不再放回
                debug!(dropped = sent, "client stopped during failed flush; batch dropped");
                Err(ClientError::NotInitialized)
            }
            Ok(Some(acks)) => {
                self.health.lock().await.record_flush_success(sent, Utc::now());
                info!(sent, "events flushed");
                Ok(FlushOutcome { sent, acks })
            }
            Err(err) => {
                let err = ClientError::from(err);
                let pending = {
                    let mut queue = self.queue.lock().await;
                    // shutdown 在同一把锁下清空队列，停止后不再放回
                    if !self.stopped.load(Ordering::SeqCst) {
                        queue.restore(batch);
                    }
                    queue.len()
                };
                self.health.lock().await.record_flush_failure(&err, Utc::now());
                warn!(%err, requeued = sent, pending, "event flush failed; batch requeued");
                Err(err)
            }
        }
    }
}

/// 后台上报循环：按固定间隔触发，收到停止信号或客户端被释放后退出
async fn run_flush_loop(inner: Weak<ClientInner>, period: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                if inner.stopped.load(Ordering::SeqCst) {
                    break;
                }
                // 失败已记录到状态中，调用方不可见
                if let Err(err) = inner.flush().await {
                    debug!(%err, "background flush will retry on next tick");
                }
            }
        }
    }
    debug!("flush loop exited");
}

fn validate_credential(credential: &str) -> Result<(), ClientError> {
    if credential.trim().is_empty() {
        return Err(ClientError::validation("credential must not be empty"));
    }
    Ok(())
}

fn mask_credential(credential: &str) -> String {
    let visible: String = credential.chars().take(4).collect();
    format!("{visible}****")
}
