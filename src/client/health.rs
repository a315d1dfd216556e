// src/client/health.rs

use chrono::{DateTime, Utc};

use crate::error::ClientError;
use crate::model::status::{ApiHealth, ErrorKind, ErrorRecord, IntegrationStatus, Operation};

/// 滚动健康度统计
///
/// 竞价成功率为指数移动平均：`rate = rate * (1 - w) + target * w`，
/// 每次变化后都会重新推导 health，因此连续成功可以恢复到 healthy。
/// 事件上报的成败只记录错误与计数，不影响竞价成功率。
#[derive(Debug, Clone)]
pub struct HealthTracker {
    status: IntegrationStatus,
    weight: f64,
    max_errors: usize,
}

impl HealthTracker {
    pub fn new(weight: f64, max_errors: usize) -> Self {
        Self {
            status: IntegrationStatus::default(),
            weight,
            max_errors,
        }
    }

    pub fn record_auction_success(&mut self, at: DateTime<Utc>) {
        self.status.last_auction_at = Some(at);
        self.update_rate(100.0);
    }

    pub fn record_auction_failure(&mut self, err: &ClientError, at: DateTime<Utc>) {
        self.push_error(Operation::Auction, err, at);
        self.update_rate(0.0);
    }

    pub fn record_flush_success(&mut self, sent: usize, at: DateTime<Utc>) {
        self.status.last_event_flush_at = Some(at);
        self.status.events_sent_total += sent as u64;
    }

    pub fn record_flush_failure(&mut self, err: &ClientError, at: DateTime<Utc>) {
        self.push_error(Operation::Flush, err, at);
        self.status.api_health = ApiHealth::from_success_rate(self.status.auction_success_rate);
    }

    /// 只清空错误日志，不重置成功率
    pub fn clear_errors(&mut self) {
        self.status.errors.clear();
    }

    /// 返回快照副本，并附上当前待上报数量
    pub fn snapshot(&self, pending_events: usize) -> IntegrationStatus {
        IntegrationStatus {
            pending_events,
            ..self.status.clone()
        }
    }

    fn update_rate(&mut self, target: f64) {
        let rate = self.status.auction_success_rate * (1.0 - self.weight) + target * self.weight;
        self.status.auction_success_rate = rate.clamp(0.0, 100.0);
        self.status.api_health = ApiHealth::from_success_rate(self.status.auction_success_rate);
    }

    fn push_error(&mut self, operation: Operation, err: &ClientError, at: DateTime<Utc>) {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else {
            ErrorKind::Transient
        };
        self.status.errors.insert(
            0,
            ErrorRecord {
                occurred_at: at,
                operation,
                kind,
                message: err.to_string(),
            },
        );
        self.status.errors.truncate(self.max_errors);
    }
}
