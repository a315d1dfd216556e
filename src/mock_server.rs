// src/mock_server.rs

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::bidding::{AuctionResolver, IdGenerator, PurchaseHistory};
use crate::model::auction::{AuctionRequest, AuctionResponse};
use crate::model::catalog::Catalog;
use crate::model::events::{EventAck, EventBatch};
use crate::model::status::PerformanceReport;
use crate::tracking::{AttributionLedger, EventIngester};

struct ServerState {
    history: PurchaseHistory,
    ledger: AttributionLedger,
    ids: IdGenerator,
    rng: StdRng,
}

/// 模拟零售媒体广告服务端
/// 负责竞价、事件入库与归因；所有状态变更都在同一把锁内完成，单次调用要么全部生效要么不生效
pub struct MockRetailMediaServer {
    resolver: AuctionResolver,
    ingester: EventIngester,
    state: Mutex<ServerState>,
}

impl MockRetailMediaServer {
    pub fn new(catalog: Arc<Catalog>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            resolver: AuctionResolver::new(catalog.clone()),
            ingester: EventIngester::new(catalog),
            state: Mutex::new(ServerState {
                history: PurchaseHistory::new(),
                ledger: AttributionLedger::new(),
                ids: IdGenerator::new(seed.map(|s| s.wrapping_add(3))),
                rng,
            }),
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        self.resolver.catalog()
    }

    /// 处理竞价请求
    pub async fn run_auction(&self, request: &AuctionRequest) -> AuctionResponse {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let results = self
            .resolver
            .resolve(&request.slots, &state.history, &mut state.ids, &mut state.rng);
        state.ledger.record_auction(&results);

        info!(
            slot_specs = request.slots.len(),
            winners = results.iter().map(|r| r.winners.len()).sum::<usize>(),
            personalized = !state.history.is_empty(),
            tracked_bids = state.ledger.tracked_bids(),
            "mock server resolved auction"
        );
        AuctionResponse { results }
    }

    /// 事件批量入库
    pub async fn ingest_events(&self, batch: EventBatch) -> Vec<EventAck> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let (impressions, clicks, purchases) = (batch.impressions.len(), batch.clicks.len(), batch.purchases.len());
        let acks = self
            .ingester
            .ingest(batch, &mut state.history, &mut state.ledger, &mut state.ids);
        info!(impressions, clicks, purchases, "mock server ingested events");
        acks
    }

    /// 购买历史快照
    pub async fn personalization(&self) -> PurchaseHistory {
        self.state.lock().await.history.clone()
    }

    pub async fn clear_personalization(&self) {
        self.state.lock().await.history.clear();
        info!("personalization cleared");
    }

    pub async fn performance(&self) -> PerformanceReport {
        self.state.lock().await.ledger.report()
    }
}
