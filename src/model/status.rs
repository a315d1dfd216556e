// src/model/status.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApiHealth {
    Healthy,
    Degraded,
    Down,
}

impl ApiHealth {
    /// 根据竞价成功率推导健康度：< 50 为 down，< 80 为 degraded
    pub fn from_success_rate(rate: f64) -> Self {
        if rate < 50.0 {
            ApiHealth::Down
        } else if rate < 80.0 {
            ApiHealth::Degraded
        } else {
            ApiHealth::Healthy
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Auction,
    Flush,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Transient,
    Timeout,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub occurred_at: DateTime<Utc>,
    pub operation: Operation,
    pub kind: ErrorKind,
    pub message: String,
}

/// 集成状态快照（调用方拿到的永远是副本）
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationStatus {
    pub api_health: ApiHealth,
    pub last_auction_at: Option<DateTime<Utc>>,
    pub last_event_flush_at: Option<DateTime<Utc>>,
    pub auction_success_rate: f64,
    pub events_sent_total: u64,
    pub pending_events: usize,
    /// 最新的错误在最前
    pub errors: Vec<ErrorRecord>,
}

impl Default for IntegrationStatus {
    fn default() -> Self {
        Self {
            api_health: ApiHealth::Healthy,
            last_auction_at: None,
            last_event_flush_at: None,
            auction_success_rate: 100.0,
            events_sent_total: 0,
            pending_events: 0,
            errors: Vec::new(),
        }
    }
}

/// 归因与投放效果汇总
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub auctions: u64,
    pub bids_issued: u64,
    pub impressions: u64,
    pub clicks: u64,
    pub attributed_purchases: u64,
    pub organic_purchases: u64,
    pub attributed_revenue: f64,
    pub organic_revenue: f64,
    pub ad_spend: f64,
    pub roas: f64,
}
