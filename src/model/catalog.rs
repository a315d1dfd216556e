// src/model/catalog.rs

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// 商品基础信息
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    pub brand: String,
    pub price: f64,
}

impl Product {
    pub fn new(id: &str, name: &str, category: &str, brand: &str, price: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            brand: brand.to_string(),
            price,
        }
    }
}

/// 商品目录
/// - `products`: 按目录顺序排列，竞价兜底填充时按此顺序取
/// - `related`: 类目邻接表，每个类目对应固定的“相关类目”列表
/// - `default_candidates`: 无购买历史时的默认候选商品
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
    index: HashMap<String, usize>,
    related: HashMap<String, Vec<String>>,
    default_candidates: Vec<String>,
}

impl Catalog {
    pub fn new(
        products: Vec<Product>,
        related: HashMap<String, Vec<String>>,
        default_candidates: Vec<String>,
    ) -> Self {
        let index = products
            .iter()
            .enumerate()
            .map(|(pos, p)| (p.id.clone(), pos))
            .collect();
        Self {
            products,
            index,
            related,
            default_candidates,
        }
    }

    pub fn get(&self, product_id: &str) -> Option<&Product> {
        self.index.get(product_id).map(|&pos| &self.products[pos])
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn in_category(&self, category: &str) -> Vec<&Product> {
        self.products.iter().filter(|p| p.category == category).collect()
    }

    pub fn related(&self, category: &str) -> &[String] {
        self.related.get(category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 默认候选（忽略目录中不存在的 id）
    pub fn default_candidates(&self) -> impl Iterator<Item = &Product> + '_ {
        self.default_candidates.iter().filter_map(|id| self.get(id))
    }
}

fn demo_catalog() -> Catalog {
    let products = vec![
        Product::new("sku-1001", "Noise Cancelling Headphones", "audio", "sonora", 199.0),
        Product::new("sku-1002", "Bluetooth Speaker", "audio", "sonora", 59.0),
        Product::new("sku-1003", "Wireless Earbuds", "audio", "pulse", 89.0),
        Product::new("sku-2001", "4K Monitor", "electronics", "viewmax", 329.0),
        Product::new("sku-2002", "Mechanical Keyboard", "electronics", "keyforge", 119.0),
        Product::new("sku-2003", "USB-C Hub", "electronics", "keyforge", 39.0),
        Product::new("sku-3001", "Espresso Machine", "kitchen", "crema", 249.0),
        Product::new("sku-3002", "Chef Knife", "kitchen", "steelcraft", 79.0),
        Product::new("sku-3003", "Cast Iron Skillet", "kitchen", "steelcraft", 45.0),
        Product::new("sku-4001", "Linen Duvet Cover", "home", "nestwell", 129.0),
        Product::new("sku-4002", "Scented Candle Set", "home", "nestwell", 29.0),
        Product::new("sku-5001", "Trail Running Shoes", "sports", "stride", 139.0),
        Product::new("sku-5002", "Yoga Mat", "sports", "zenfit", 35.0),
        Product::new("sku-5003", "Insulated Water Bottle", "outdoors", "summit", 32.0),
        Product::new("sku-5004", "Two-Person Tent", "outdoors", "summit", 219.0),
        Product::new("sku-6001", "Vitamin C Serum", "beauty", "glowlab", 42.0),
        Product::new("sku-6002", "Electric Toothbrush", "personal-care", "brightly", 69.0),
    ];

    let related = [
        ("audio", vec!["electronics"]),
        ("electronics", vec!["audio", "home"]),
        ("kitchen", vec!["home"]),
        ("home", vec!["kitchen", "beauty"]),
        ("sports", vec!["outdoors", "personal-care"]),
        ("outdoors", vec!["sports"]),
        ("beauty", vec!["personal-care"]),
        ("personal-care", vec!["beauty", "sports"]),
    ]
    .into_iter()
    .map(|(cat, rel)| (cat.to_string(), rel.into_iter().map(String::from).collect()))
    .collect();

    let default_candidates = ["sku-1001", "sku-2002", "sku-3001", "sku-5001", "sku-6001"]
        .into_iter()
        .map(String::from)
        .collect();

    Catalog::new(products, related, default_candidates)
}

/// 静态演示目录
pub static DEMO_CATALOG: Lazy<Arc<Catalog>> = Lazy::new(|| Arc::new(demo_catalog()));
