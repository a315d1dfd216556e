// src/model/events.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// 曝光事件
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Impression {
    pub resolved_bid_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub placement_path: String,
}

impl Impression {
    pub fn new(bid_id: &str, placement_path: &str) -> Self {
        Self {
            resolved_bid_id: bid_id.to_string(),
            id: None,
            occurred_at: Utc::now(),
            placement_path: placement_path.to_string(),
        }
    }
}

/// 点击事件
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Click {
    pub resolved_bid_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl Click {
    pub fn new(bid_id: &str) -> Self {
        Self {
            resolved_bid_id: bid_id.to_string(),
            id: None,
            occurred_at: Utc::now(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseItem {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: f64,
}

impl PurchaseItem {
    pub fn new(product_id: &str, quantity: u32, unit_price: f64) -> Self {
        Self {
            product_id: product_id.to_string(),
            quantity,
            unit_price,
        }
    }

    pub fn subtotal(&self) -> f64 {
        f64::from(self.quantity) * self.unit_price
    }
}

/// 购买事件；`resolved_bid_id` 存在即视为广告归因购买，缺失为自然购买
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub items: Vec<PurchaseItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_bid_id: Option<String>,
}

impl Purchase {
    pub fn new(items: Vec<PurchaseItem>) -> Self {
        Self {
            id: None,
            occurred_at: Utc::now(),
            items,
            resolved_bid_id: None,
        }
    }

    pub fn attributed_to(mut self, bid_id: &str) -> Self {
        self.resolved_bid_id = Some(bid_id.to_string());
        self
    }

    pub fn revenue(&self) -> f64 {
        self.items.iter().map(PurchaseItem::subtotal).sum()
    }
}

/// 事件联合类型
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    Impression(Impression),
    Click(Click),
    Purchase(Purchase),
}

impl Event {
    pub fn id(&self) -> Option<&str> {
        match self {
            Event::Impression(e) => e.id.as_deref(),
            Event::Click(e) => e.id.as_deref(),
            Event::Purchase(e) => e.id.as_deref(),
        }
    }
}

/// 一次上报（或一次批量发送）包含的事件集合
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct EventBatch {
    pub impressions: Vec<Impression>,
    pub clicks: Vec<Click>,
    pub purchases: Vec<Purchase>,
}

impl EventBatch {
    pub fn len(&self) -> usize {
        self.impressions.len() + self.clicks.len() + self.purchases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn with_impression(mut self, impression: Impression) -> Self {
        self.impressions.push(impression);
        self
    }

    pub fn with_click(mut self, click: Click) -> Self {
        self.clicks.push(click);
        self
    }

    pub fn with_purchase(mut self, purchase: Purchase) -> Self {
        self.purchases.push(purchase);
        self
    }

    /// 将 `other` 追加到当前批次末尾，三类事件各自保持顺序
    pub fn append(&mut self, other: EventBatch) {
        self.impressions.extend(other.impressions);
        self.clicks.extend(other.clicks);
        self.purchases.extend(other.purchases);
    }

    /// 按固定顺序展开：先曝光，再点击，最后购买（与 ack 顺序一致）
    pub fn into_events(self) -> impl Iterator<Item = Event> {
        self.impressions
            .into_iter()
            .map(Event::Impression)
            .chain(self.clicks.into_iter().map(Event::Click))
            .chain(self.purchases.into_iter().map(Event::Purchase))
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        for purchase in &self.purchases {
            if purchase.items.is_empty() {
                return Err(ClientError::validation("purchase has no items"));
            }
            for item in &purchase.items {
                if item.quantity < 1 {
                    return Err(ClientError::validation(format!(
                        "purchase item {}: quantity must be at least 1",
                        item.product_id
                    )));
                }
                if !(item.unit_price >= 0.0 && item.unit_price.is_finite()) {
                    return Err(ClientError::validation(format!(
                        "purchase item {}: unitPrice must be a non-negative amount",
                        item.product_id
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Received,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EventAck {
    pub id: String,
    pub status: AckStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_events_orders_impressions_clicks_purchases() {
        let batch = EventBatch::default()
            .with_purchase(Purchase::new(vec![PurchaseItem::new("sku-1", 1, 1.0)]))
            .with_click(Click::new("bid_b"))
            .with_impression(Impression::new("bid_a", "/home"));
        let kinds: Vec<_> = batch
            .into_events()
            .map(|e| match e {
                Event::Impression(_) => "impression",
                Event::Click(_) => "click",
                Event::Purchase(_) => "purchase",
            })
            .collect();
        assert_eq!(kinds, ["impression", "click", "purchase"]);
    }

    #[test]
    fn missing_lists_deserialize_as_empty() {
        let batch: EventBatch = serde_json::from_str(
            r#"{"clicks":[{"resolvedBidId":"bid_1","occurredAt":"2024-01-01T00:00:00Z"}]}"#,
        )
        .unwrap();
        assert_eq!(batch.len(), 1);
        assert!(batch.impressions.is_empty());
    }

    #[test]
    fn validation_checks_purchase_items() {
        let zero_qty = EventBatch::default().with_purchase(Purchase::new(vec![PurchaseItem::new("sku-1", 0, 5.0)]));
        assert!(zero_qty.validate().is_err());

        let negative = EventBatch::default().with_purchase(Purchase::new(vec![PurchaseItem::new("sku-1", 1, -1.0)]));
        assert!(negative.validate().is_err());

        let ok = EventBatch::default().with_purchase(Purchase::new(vec![PurchaseItem::new("sku-1", 2, 0.0)]));
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn purchase_without_items_is_rejected() {
        let empty = EventBatch::default().with_purchase(Purchase::new(vec![]));
        assert!(matches!(empty.validate(), Err(ClientError::Validation(_))));
    }

    #[test]
    fn revenue_sums_line_items() {
        let purchase = Purchase::new(vec![PurchaseItem::new("a", 2, 10.0), PurchaseItem::new("b", 1, 5.5)]);
        assert!((purchase.revenue() - 25.5).abs() < 1e-9);
    }
}
