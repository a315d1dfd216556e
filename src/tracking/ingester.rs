// src/tracking/ingester.rs

use std::sync::Arc;
use tracing::debug;

use crate::bidding::ids::IdGenerator;
use crate::bidding::personalization::PurchaseHistory;
use crate::model::catalog::Catalog;
use crate::model::events::{AckStatus, Event, EventAck, EventBatch};
use crate::tracking::attribution::AttributionLedger;

/// 事件入库
/// 每个事件都回 `received`；购买事件会更新购买历史与归因账本
pub struct EventIngester {
    catalog: Arc<Catalog>,
}

impl EventIngester {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// ack 顺序固定：先曝光、再点击、最后购买，各自保持输入顺序
    pub fn ingest(
        &self,
        batch: EventBatch,
        history: &mut PurchaseHistory,
        ledger: &mut AttributionLedger,
        ids: &mut IdGenerator,
    ) -> Vec<EventAck> {
        let mut acks = Vec::with_capacity(batch.len());
        for event in batch.into_events() {
            match &event {
                Event::Impression(impression) => ledger.record_impression(impression),
                Event::Click(click) => ledger.record_click(click),
                Event::Purchase(purchase) => {
                    let attribution = ledger.record_purchase(purchase);
                    for item in &purchase.items {
                        match self.catalog.get(&item.product_id) {
                            Some(product) => history.record_purchase(product),
                            // 未知商品直接跳过
                            None => debug!(product_id = %item.product_id, "skipping unknown product in purchase"),
                        }
                    }
                    debug!(?attribution, revenue = purchase.revenue(), "purchase ingested");
                }
            }
            let id = event.id().map(str::to_string).unwrap_or_else(|| ids.next_event_id());
            acks.push(EventAck {
                id,
                status: AckStatus::Received,
            });
        }
        acks
    }
}
