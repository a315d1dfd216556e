//! 端到端场景：竞价 → 事件上报 → 个性化 → 健康度

use std::collections::HashSet;
use std::time::Duration;

use retail_media::model::auction::AuctionRequest;
use retail_media::model::events::{Click, EventBatch, Impression, Purchase, PurchaseItem};
use retail_media::model::status::{ApiHealth, ErrorKind, Operation};
use retail_media::{ClientConfig, ClientError, ClientRegistry, TransportError};

fn registry(seed: u64) -> ClientRegistry {
    ClientRegistry::new(ClientConfig {
        seed: Some(seed),
        ..ClientConfig::default()
    })
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn auction_impression_purchase_round_trip() {
    let registry = registry(17);
    let client = registry.initialize("demo-key").await.unwrap();

    let first = client.create_auction(&AuctionRequest::listings(3)).await.unwrap();
    let winners = &first.results[0].winners;
    assert_eq!(winners.len(), 3);
    let ids: Vec<_> = winners.iter().map(|w| w.id.as_str()).collect();
    assert_eq!(ids, ["sku-1001", "sku-2002", "sku-3001"]);
    let ranks: Vec<_> = winners.iter().map(|w| w.rank).collect();
    assert_eq!(ranks, [1, 2, 3]);
    let bids: HashSet<_> = winners.iter().map(|w| w.resolved_bid_id.as_str()).collect();
    assert_eq!(bids.len(), 3);

    let top = winners[0].clone();
    client
        .report_event(EventBatch::default().with_impression(Impression::new(&top.resolved_bid_id, "/search")))
        .await
        .unwrap();
    // 等待后台定时上报
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    let status = client.get_status().await;
    assert_eq!(status.events_sent_total, 1);
    assert_eq!(status.pending_events, 0);
    assert!(status.last_event_flush_at.is_some());

    client
        .report_event(EventBatch::default().with_purchase(
            Purchase::new(vec![PurchaseItem::new(&top.id, 1, 10.0)]).attributed_to(&top.resolved_bid_id),
        ))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert_eq!(client.get_status().await.events_sent_total, 2);
    assert!(registry.backend().personalization().await.has_purchased(&top.id));

    let next = client.create_auction(&AuctionRequest::listings(3)).await.unwrap();
    assert!(next.winners().all(|w| w.id != top.id));
    assert_eq!(next.winners().count(), 3);
}

#[tokio::test(start_paused = true)]
async fn repeated_auctions_never_reuse_bid_ids() {
    let registry = registry(3);
    let client = registry.initialize("demo-key").await.unwrap();
    let first = client.create_auction(&AuctionRequest::listings(2)).await.unwrap();
    let second = client.create_auction(&AuctionRequest::listings(2)).await.unwrap();

    let first_items: Vec<_> = first.winners().map(|w| w.id.clone()).collect();
    let second_items: Vec<_> = second.winners().map(|w| w.id.clone()).collect();
    assert_eq!(first_items, second_items);
    for (a, b) in first.winners().zip(second.winners()) {
        assert_ne!(a.resolved_bid_id, b.resolved_bid_id);
    }
}

#[tokio::test(start_paused = true)]
async fn purchase_in_new_category_takes_priority() {
    let registry = registry(5);
    let client = registry.initialize("demo-key").await.unwrap();
    client
        .report_event(EventBatch::default().with_purchase(Purchase::new(vec![PurchaseItem::new("sku-5002", 1, 35.0)])))
        .await
        .unwrap();
    client.flush().await.unwrap();

    let response = client.create_auction(&AuctionRequest::listings(3)).await.unwrap();
    let ids: Vec<_> = response.winners().map(|w| w.id.as_str()).collect();
    // sports 剩余商品优先，其次为相关类目 outdoors
    assert_eq!(ids, ["sku-5001", "sku-5003", "sku-5004"]);

    registry.clear_personalization().await;
    let response = client.create_auction(&AuctionRequest::listings(3)).await.unwrap();
    let ids: Vec<_> = response.winners().map(|w| w.id.as_str()).collect();
    assert_eq!(ids, ["sku-1001", "sku-2002", "sku-3001"]);
}

#[tokio::test(start_paused = true)]
async fn attribution_report_tracks_spend_and_roas() {
    let registry = registry(8);
    let client = registry.initialize("demo-key").await.unwrap();
    let response = client.create_auction(&AuctionRequest::listings(2)).await.unwrap();
    let top = response.results[0].winners[0].clone();

    let batch = EventBatch::default()
        .with_impression(Impression::new(&top.resolved_bid_id, "/search"))
        .with_click(Click::new(&top.resolved_bid_id))
        .with_purchase(Purchase::new(vec![PurchaseItem::new(&top.id, 2, 15.0)]).attributed_to(&top.resolved_bid_id))
        .with_purchase(Purchase::new(vec![PurchaseItem::new("sku-4002", 1, 29.0)]));
    client.report_event(batch).await.unwrap();
    let outcome = client.flush().await.unwrap();
    assert_eq!(outcome.sent, 4);
    assert_eq!(outcome.acks.len(), 4);

    let report = registry.performance().await;
    assert_eq!(report.auctions, 1);
    assert_eq!(report.bids_issued, 2);
    assert_eq!(report.attributed_purchases, 1);
    assert_eq!(report.organic_purchases, 1);
    assert!((report.ad_spend - top.price).abs() < 1e-9);
    assert!((report.roas - 30.0 / top.price).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn zero_spend_reports_zero_roas() {
    let registry = registry(8);
    let client = registry.initialize("demo-key").await.unwrap();
    client
        .report_event(EventBatch::default().with_purchase(Purchase::new(vec![PurchaseItem::new("sku-1001", 1, 99.0)])))
        .await
        .unwrap();
    client.flush().await.unwrap();
    let report = registry.performance().await;
    assert_eq!(report.ad_spend, 0.0);
    assert_eq!(report.roas, 0.0);
}

#[tokio::test(start_paused = true)]
async fn forced_failures_take_health_down_and_successes_recover_it() {
    let registry = registry(23);
    let client = registry.initialize("demo-key").await.unwrap();
    registry.set_error_simulation(true, 1.0).await.unwrap();

    for _ in 0..10 {
        let err = client.create_auction(&AuctionRequest::listings(3)).await.unwrap_err();
        assert_eq!(err, ClientError::Transient(TransportError::Injected { route: "auctions" }));
    }
    let status = client.get_status().await;
    assert!(status.auction_success_rate < 50.0);
    assert_eq!(status.api_health, ApiHealth::Down);
    assert_eq!(status.errors.len(), 10);
    assert!(status.errors.iter().all(|e| e.operation == Operation::Auction));

    // 清空错误日志不会重置成功率
    client.clear_errors().await;
    let status = client.get_status().await;
    assert!(status.errors.is_empty());
    assert_eq!(status.api_health, ApiHealth::Down);

    registry.set_error_simulation(false, 0.0).await.unwrap();
    let mut seen_degraded = false;
    for _ in 0..12 {
        client.create_auction(&AuctionRequest::listings(1)).await.unwrap();
        seen_degraded |= client.get_status().await.api_health == ApiHealth::Degraded;
    }
    assert!(seen_degraded);
    assert_eq!(client.get_status().await.api_health, ApiHealth::Healthy);
}

#[tokio::test(start_paused = true)]
async fn timeouts_are_classified_separately() {
    let registry = ClientRegistry::new(ClientConfig {
        seed: Some(2),
        request_timeout_ms: 100,
        latency_min_ms: 400,
        latency_max_ms: 400,
        flush_interval_ms: 60_000,
        ..ClientConfig::default()
    })
    .unwrap();
    let client = registry.initialize("demo-key").await.unwrap();

    let err = client.create_auction(&AuctionRequest::listings(2)).await.unwrap_err();
    assert!(err.is_timeout());

    client
        .report_event(EventBatch::default().with_click(Click::new("bid_any")))
        .await
        .unwrap();
    assert!(client.flush().await.unwrap_err().is_timeout());

    let status = client.get_status().await;
    assert_eq!(status.pending_events, 1);
    assert_eq!(status.errors[0].operation, Operation::Flush);
    assert_eq!(status.errors[0].kind, ErrorKind::Timeout);
    assert_eq!(status.errors[1].kind, ErrorKind::Timeout);
    // 超时不会触达服务端
    assert_eq!(registry.performance().await.auctions, 0);
    assert_eq!(registry.performance().await.clicks, 0);
}

#[tokio::test(start_paused = true)]
async fn validation_errors_surface_immediately() {
    let registry = registry(1);
    assert_eq!(
        registry.client().await.unwrap_err(),
        ClientError::NotInitialized
    );
    let client = registry.initialize("demo-key").await.unwrap();
    assert!(matches!(
        client.create_auction(&AuctionRequest::listings(0)).await,
        Err(ClientError::Validation(_))
    ));
    assert!(matches!(
        client
            .report_event(EventBatch::default().with_purchase(Purchase::new(vec![PurchaseItem::new("sku-1001", 0, 1.0)])))
            .await,
        Err(ClientError::Validation(_))
    ));
    assert_eq!(client.get_status().await.pending_events, 0);
}
