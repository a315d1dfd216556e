// src/bidding/personalization.rs

use std::collections::{HashMap, HashSet};

use crate::model::catalog::Product;

/// 购买历史（个性化存储）
/// 只在事件成功入库时增长，计数永不递减；仅 `clear` 会重置
#[derive(Debug, Clone, Default)]
pub struct PurchaseHistory {
    category_counts: HashMap<String, u64>,
    // 类目首次出现的顺序，用于计数相同时的稳定排序
    first_seen: Vec<String>,
    purchased: HashSet<String>,
}

impl PurchaseHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_purchase(&mut self, product: &Product) {
        let count = self.category_counts.entry(product.category.clone()).or_insert_with(|| {
            self.first_seen.push(product.category.clone());
            0
        });
        *count += 1;
        self.purchased.insert(product.id.clone());
    }

    pub fn is_empty(&self) -> bool {
        self.category_counts.is_empty() && self.purchased.is_empty()
    }

    pub fn has_purchased(&self, product_id: &str) -> bool {
        self.purchased.contains(product_id)
    }

    pub fn category_count(&self, category: &str) -> u64 {
        self.category_counts.get(category).copied().unwrap_or(0)
    }

    pub fn purchased_ids(&self) -> impl Iterator<Item = &str> {
        self.purchased.iter().map(String::as_str)
    }

    /// 按购买次数降序排列类目，次数相同时先出现的在前
    pub fn ranked_categories(&self) -> Vec<&str> {
        let mut ranked: Vec<&str> = self.first_seen.iter().map(String::as_str).collect();
        // sort_by 是稳定排序，保留 first_seen 顺序
        ranked.sort_by(|a, b| self.category_count(b).cmp(&self.category_count(a)));
        ranked
    }

    pub fn clear(&mut self) {
        self.category_counts.clear();
        self.first_seen.clear();
        self.purchased.clear();
    }
}
