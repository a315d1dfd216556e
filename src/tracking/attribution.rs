// src/tracking/attribution.rs

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::model::auction::{AuctionResult, SlotKind};
use crate::model::events::{Click, Impression, Purchase};
use crate::model::status::PerformanceReport;

/// 已发放的 bid 记录
#[derive(Debug, Clone, PartialEq)]
pub struct BidRecord {
    pub item_id: String,
    pub kind: SlotKind,
    pub price: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Attribution {
    Attributed,
    Organic,
}

/// 计算 ROAS；广告花费为 0 时返回 0 而不是 NaN/inf
pub fn roas(attributed_revenue: f64, ad_spend: f64) -> f64 {
    if ad_spend > 0.0 {
        attributed_revenue / ad_spend
    } else {
        0.0
    }
}

/// 账本默认保留的 bid 数量上限
pub const DEFAULT_BID_CAPACITY: usize = 10_000;

/// 归因账本
/// - listings 按点击计费（CPC）：同一 bid 只在首次点击时扣费
/// - banners 按曝光计费：同一 bid 只在首次曝光时扣费
///
/// 只在内存中保留最近 `capacity` 个 bid，超出后淘汰最早发放的；
/// 引用已淘汰 bid 的事件不再计费，购买按自然购买处理。
#[derive(Debug)]
pub struct AttributionLedger {
    bids: HashMap<String, BidRecord>,
    issued_order: VecDeque<String>,
    charged: HashSet<String>,
    capacity: usize,
    bids_issued: u64,
    auctions: u64,
    impressions: u64,
    clicks: u64,
    attributed_purchases: u64,
    organic_purchases: u64,
    attributed_revenue: f64,
    organic_revenue: f64,
    ad_spend: f64,
}

impl Default for AttributionLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributionLedger {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BID_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bids: HashMap::new(),
            issued_order: VecDeque::new(),
            charged: HashSet::new(),
            capacity: capacity.max(1),
            bids_issued: 0,
            auctions: 0,
            impressions: 0,
            clicks: 0,
            attributed_purchases: 0,
            organic_purchases: 0,
            attributed_revenue: 0.0,
            organic_revenue: 0.0,
            ad_spend: 0.0,
        }
    }

    /// 记录一次竞价的全部胜出项
    pub fn record_auction(&mut self, results: &[AuctionResult]) {
        self.auctions += 1;
        for result in results {
            for winner in &result.winners {
                self.bids_issued += 1;
                self.issued_order.push_back(winner.resolved_bid_id.clone());
                self.bids.insert(
                    winner.resolved_bid_id.clone(),
                    BidRecord {
                        item_id: winner.id.clone(),
                        kind: result.result_type,
                        price: winner.price,
                    },
                );
            }
        }
        self.evict_oldest();
    }

    fn evict_oldest(&mut self) {
        while self.issued_order.len() > self.capacity {
            if let Some(bid_id) = self.issued_order.pop_front() {
                self.bids.remove(&bid_id);
                self.charged.remove(&bid_id);
            }
        }
    }

    pub fn tracked_bids(&self) -> usize {
        self.bids.len()
    }

    pub fn record_impression(&mut self, impression: &Impression) {
        self.impressions += 1;
        self.charge(&impression.resolved_bid_id, SlotKind::Banners);
    }

    pub fn record_click(&mut self, click: &Click) {
        self.clicks += 1;
        self.charge(&click.resolved_bid_id, SlotKind::Listings);
    }

    fn charge(&mut self, bid_id: &str, billed_kind: SlotKind) {
        let Some(bid) = self.bids.get(bid_id) else {
            return;
        };
        if bid.kind == billed_kind && self.charged.insert(bid_id.to_string()) {
            self.ad_spend += bid.price;
        }
    }

    /// 只有本服务发放过的 bid id 才算归因，否则按自然购买处理
    pub fn classify(&self, purchase: &Purchase) -> Attribution {
        match purchase.resolved_bid_id.as_deref() {
            Some(bid_id) if self.bids.contains_key(bid_id) => Attribution::Attributed,
            _ => Attribution::Organic,
        }
    }

    pub fn record_purchase(&mut self, purchase: &Purchase) -> Attribution {
        let attribution = self.classify(purchase);
        let revenue = purchase.revenue();
        match attribution {
            Attribution::Attributed => {
                self.attributed_purchases += 1;
                self.attributed_revenue += revenue;
            }
            Attribution::Organic => {
                self.organic_purchases += 1;
                self.organic_revenue += revenue;
            }
        }
        attribution
    }

    pub fn report(&self) -> PerformanceReport {
        PerformanceReport {
            auctions: self.auctions,
            bids_issued: self.bids_issued,
            impressions: self.impressions,
            clicks: self.clicks,
            attributed_purchases: self.attributed_purchases,
            organic_purchases: self.organic_purchases,
            attributed_revenue: self.attributed_revenue,
            organic_revenue: self.organic_revenue,
            ad_spend: self.ad_spend,
            roas: roas(self.attributed_revenue, self.ad_spend),
        }
    }
}
