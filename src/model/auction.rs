// src/model/auction.rs

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// 广告位类型：商品推广位（listings）或横幅位（banners）
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    Listings,
    Banners,
}

/// 胜出对象的类型
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WinnerType {
    Product,
    Vendor,
    Brand,
    Url,
}

/// 单个广告位的竞价需求
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuctionSlotSpec {
    pub kind: SlotKind,
    pub slot_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo: Option<String>,
}

impl AuctionSlotSpec {
    pub fn listings(slot_count: u32) -> Self {
        Self {
            kind: SlotKind::Listings,
            slot_count,
            product_ids: None,
            category: None,
            geo: None,
        }
    }

    pub fn banners(slot_count: u32) -> Self {
        Self {
            kind: SlotKind::Banners,
            ..Self::listings(slot_count)
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn with_product_ids(mut self, ids: &[&str]) -> Self {
        self.product_ids = Some(ids.iter().map(|id| id.to_string()).collect());
        self
    }
}

/// 竞价请求，按顺序包含多个广告位需求
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuctionRequest {
    pub slots: Vec<AuctionSlotSpec>,
}

impl AuctionRequest {
    pub fn new(slots: Vec<AuctionSlotSpec>) -> Self {
        Self { slots }
    }

    /// 单个 listings 广告位的快捷构造
    pub fn listings(slot_count: u32) -> Self {
        Self::new(vec![AuctionSlotSpec::listings(slot_count)])
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.slots.is_empty() {
            return Err(ClientError::validation("auction request has no slots"));
        }
        for (pos, spec) in self.slots.iter().enumerate() {
            if spec.slot_count < 1 {
                return Err(ClientError::validation(format!(
                    "slot {pos}: slotCount must be at least 1"
                )));
            }
            if matches!(&spec.product_ids, Some(ids) if ids.is_empty()) {
                return Err(ClientError::validation(format!(
                    "slot {pos}: productIds filter must not be empty"
                )));
            }
        }
        Ok(())
    }
}

/// 竞价胜出项
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Winner {
    pub rank: u32,
    #[serde(rename = "type")]
    pub winner_type: WinnerType,
    pub id: String,
    pub resolved_bid_id: String,
    pub price: f64,
}

/// 单个广告位的竞价结果
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuctionResult {
    pub result_type: SlotKind,
    pub winners: Vec<Winner>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuctionResponse {
    pub results: Vec<AuctionResult>,
}

impl AuctionResponse {
    pub fn winners(&self) -> impl Iterator<Item = &Winner> {
        self.results.iter().flat_map(|r| r.winners.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_camel_case_on_the_wire() {
        let json = r#"{"slots":[{"kind":"listings","slotCount":3,"category":"audio"}]}"#;
        let request: AuctionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.slots[0].slot_count, 3);
        assert_eq!(request.slots[0].kind, SlotKind::Listings);
        assert_eq!(request.slots[0].category.as_deref(), Some("audio"));

        let winner = Winner {
            rank: 1,
            winner_type: WinnerType::Product,
            id: "sku-1".into(),
            resolved_bid_id: "bid_x".into(),
            price: 0.25,
        };
        let value = serde_json::to_value(&winner).unwrap();
        assert_eq!(value["type"], "product");
        assert_eq!(value["resolvedBidId"], "bid_x");
    }

    #[test]
    fn validation_rejects_zero_slots() {
        assert!(AuctionRequest::listings(0).validate().is_err());
        assert!(AuctionRequest::new(vec![]).validate().is_err());
        let empty_filter = AuctionRequest::new(vec![AuctionSlotSpec::listings(2).with_product_ids(&[])]);
        assert!(matches!(empty_filter.validate(), Err(ClientError::Validation(_))));
        assert!(AuctionRequest::listings(1).validate().is_ok());
    }
}
