use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::model::auction::{AuctionRequest, AuctionResponse};

/// **竞价调用日志**
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuctionLog {
    pub timestamp: String,       // 记录时间
    pub log_type: String,        // 日志类型，固定为 "auction"
    pub slot_specs: usize,       // 请求中的广告位数量
    pub requested_slots: u64,    // 请求的总位置数
    pub status: String,          // "success" / "failure" / "timeout"
    pub latency_ms: u128,        // 调用耗时
    pub winners: Vec<WinnerLog>, // 胜出明细
    pub error: Option<String>,
}

/// **单个胜出项日志**
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WinnerLog {
    pub rank: u32,
    pub item_id: String,
    pub bid_id: String,
    pub price: f64,
}

impl AuctionLog {
    /// **创建竞价日志**，默认失败，后续更新
    pub fn new(request: &AuctionRequest) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            log_type: "auction".to_string(),
            slot_specs: request.slots.len(),
            requested_slots: request.slots.iter().map(|s| u64::from(s.slot_count)).sum(),
            status: "failure".to_string(),
            latency_ms: 0,
            winners: Vec::new(),
            error: None,
        }
    }

    /// **记录成功结果**
    pub fn set_success(&mut self, response: &AuctionResponse, latency_ms: u128) {
        self.status = "success".to_string();
        self.latency_ms = latency_ms;
        self.winners = response
            .winners()
            .map(|w| WinnerLog {
                rank: w.rank,
                item_id: w.id.clone(),
                bid_id: w.resolved_bid_id.clone(),
                price: w.price,
            })
            .collect();
    }

    /// **记录失败原因**
    pub fn set_failure(&mut self, timed_out: bool, error: &str, latency_ms: u128) {
        self.status = if timed_out { "timeout" } else { "failure" }.to_string();
        self.latency_ms = latency_ms;
        self.error = Some(error.to_string());
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
