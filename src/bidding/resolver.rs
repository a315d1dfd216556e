// src/bidding/resolver.rs

use rand::Rng;
use std::collections::HashSet;
use std::ops::Range;
use std::sync::Arc;

use crate::bidding::ids::IdGenerator;
use crate::bidding::personalization::PurchaseHistory;
use crate::model::auction::{AuctionResult, AuctionSlotSpec, SlotKind, Winner, WinnerType};
use crate::model::catalog::{Catalog, Product};

/// 模拟出价区间（美元）
pub const DEFAULT_PRICE_RANGE: Range<f64> = 0.10..0.60;

/// 个性化竞价决策器
/// 自身不会失败；候选不足时返回更少的胜出项，绝不补空或重复
pub struct AuctionResolver {
    catalog: Arc<Catalog>,
    price_range: Range<f64>,
}

impl AuctionResolver {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            price_range: DEFAULT_PRICE_RANGE,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// 对每个广告位需求分别决出胜者，结果顺序与请求一致
    pub fn resolve<R: Rng>(
        &self,
        specs: &[AuctionSlotSpec],
        history: &PurchaseHistory,
        ids: &mut IdGenerator,
        rng: &mut R,
    ) -> Vec<AuctionResult> {
        specs
            .iter()
            .map(|spec| {
                let limit = spec.slot_count as usize;
                let pool = self.candidate_pool(spec, history);
                let selected: Vec<(WinnerType, String)> = match spec.kind {
                    SlotKind::Listings => pool
                        .into_iter()
                        .take(limit)
                        .map(|p| (WinnerType::Product, p.id.clone()))
                        .collect(),
                    SlotKind::Banners => {
                        // 横幅位按品牌投放，同一品牌只占一个位置
                        let mut brands = HashSet::new();
                        pool.into_iter()
                            .filter(|p| brands.insert(p.brand.as_str()))
                            .take(limit)
                            .map(|p| (WinnerType::Brand, p.brand.clone()))
                            .collect()
                    }
                };

                let winners = selected
                    .into_iter()
                    .enumerate()
                    .map(|(pos, (winner_type, id))| Winner {
                        rank: pos as u32 + 1,
                        winner_type,
                        id,
                        resolved_bid_id: ids.next_bid_id(),
                        price: self.draw_price(rng),
                    })
                    .collect();

                AuctionResult {
                    result_type: spec.kind,
                    winners,
                }
            })
            .collect()
    }

    /// 构造去重后的候选池（已按优先级排序）
    ///
    /// - 无购买历史：默认候选在前，其余目录商品按目录顺序补齐
    /// - 有购买历史：已购类目（按次数降序）→ 相关类目 → 其余未购商品，已购商品全部排除
    pub fn candidate_pool<'a>(&'a self, spec: &AuctionSlotSpec, history: &PurchaseHistory) -> Vec<&'a Product> {
        let eligible = |p: &Product| {
            spec.category.as_deref().map_or(true, |c| p.category == c)
                && spec
                    .product_ids
                    .as_ref()
                    .map_or(true, |ids| ids.iter().any(|id| *id == p.id))
        };

        let mut pool = Vec::new();
        let mut seen = HashSet::new();
        let mut push = |p: &'a Product, pool: &mut Vec<&'a Product>| {
            if eligible(p) && !history.has_purchased(&p.id) && seen.insert(p.id.as_str()) {
                pool.push(p);
            }
        };

        if history.is_empty() {
            for p in self.catalog.default_candidates() {
                push(p, &mut pool);
            }
        } else {
            let ranked = history.ranked_categories();
            for category in &ranked {
                for p in self.catalog.in_category(category) {
                    push(p, &mut pool);
                }
            }
            for category in &ranked {
                for related in self.catalog.related(category) {
                    for p in self.catalog.in_category(related) {
                        push(p, &mut pool);
                    }
                }
            }
        }
        for p in self.catalog.products() {
            push(p, &mut pool);
        }
        pool
    }

    fn draw_price<R: Rng>(&self, rng: &mut R) -> f64 {
        let raw = rng.gen_range(self.price_range.clone());
        (raw * 100.0).round() / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::catalog::DEMO_CATALOG;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn resolver() -> AuctionResolver {
        AuctionResolver::new(DEMO_CATALOG.clone())
    }

    fn run(resolver: &AuctionResolver, spec: AuctionSlotSpec, history: &PurchaseHistory) -> AuctionResult {
        let mut ids = IdGenerator::new(Some(1));
        let mut rng = StdRng::seed_from_u64(1);
        resolver.resolve(&[spec], history, &mut ids, &mut rng).remove(0)
    }

    fn item_ids(result: &AuctionResult) -> Vec<&str> {
        result.winners.iter().map(|w| w.id.as_str()).collect()
    }

    #[test]
    fn empty_history_uses_default_candidates() {
        let result = run(&resolver(), AuctionSlotSpec::listings(3), &PurchaseHistory::new());
        assert_eq!(item_ids(&result), ["sku-1001", "sku-2002", "sku-3001"]);
        assert_eq!(result.result_type, SlotKind::Listings);
        for (pos, winner) in result.winners.iter().enumerate() {
            assert_eq!(winner.rank, pos as u32 + 1);
            assert_eq!(winner.winner_type, WinnerType::Product);
            assert!((0.10..=0.60).contains(&winner.price));
        }
    }

    #[test]
    fn empty_history_pads_past_default_candidates() {
        let result = run(&resolver(), AuctionSlotSpec::listings(7), &PurchaseHistory::new());
        let ids = item_ids(&result);
        assert_eq!(ids.len(), 7);
        assert_eq!(&ids[..5], ["sku-1001", "sku-2002", "sku-3001", "sku-5001", "sku-6001"]);
        // 补齐部分按目录顺序，跳过已在默认候选中的商品
        assert_eq!(&ids[5..], ["sku-1002", "sku-1003"]);
    }

    #[test]
    fn history_prioritises_purchased_then_related_categories() {
        let resolver = resolver();
        let mut history = PurchaseHistory::new();
        history.record_purchase(resolver.catalog().get("sku-3002").unwrap());

        let result = run(&resolver, AuctionSlotSpec::listings(5), &history);
        let ids = item_ids(&result);
        // kitchen 剩余商品 → 相关类目 home → 其余目录
        assert_eq!(ids, ["sku-3001", "sku-3003", "sku-4001", "sku-4002", "sku-1001"]);
        assert!(!ids.contains(&"sku-3002"));
    }

    #[test]
    fn top_category_wins_over_less_purchased_ones() {
        let resolver = resolver();
        let catalog = resolver.catalog().clone();
        let mut history = PurchaseHistory::new();
        history.record_purchase(catalog.get("sku-1001").unwrap());
        history.record_purchase(catalog.get("sku-3002").unwrap());
        history.record_purchase(catalog.get("sku-3003").unwrap());
        assert_eq!(history.ranked_categories(), ["kitchen", "audio"]);

        let result = run(&resolver, AuctionSlotSpec::listings(2), &history);
        assert_eq!(item_ids(&result), ["sku-3001", "sku-1002"]);
    }

    #[test]
    fn category_and_product_filters_restrict_pool() {
        let resolver = resolver();
        let result = run(&resolver, AuctionSlotSpec::listings(5).with_category("audio"), &PurchaseHistory::new());
        assert_eq!(item_ids(&result), ["sku-1001", "sku-1002", "sku-1003"]);

        let result = run(
            &resolver,
            AuctionSlotSpec::listings(5).with_product_ids(&["sku-4002", "sku-2003", "sku-unknown"]),
            &PurchaseHistory::new(),
        );
        assert_eq!(item_ids(&result), ["sku-2003", "sku-4002"]);
    }

    #[test]
    fn banners_collapse_to_unique_brands() {
        let result = run(&resolver(), AuctionSlotSpec::banners(3).with_category("kitchen"), &PurchaseHistory::new());
        assert_eq!(result.result_type, SlotKind::Banners);
        assert_eq!(item_ids(&result), ["crema", "steelcraft"]);
        assert!(result.winners.iter().all(|w| w.winner_type == WinnerType::Brand));
    }

    #[test]
    fn fully_purchased_catalog_yields_no_winners() {
        let catalog = Arc::new(Catalog::new(
            vec![Product::new("only", "Only", "misc", "b", 1.0)],
            HashMap::new(),
            vec!["only".into()],
        ));
        let resolver = AuctionResolver::new(catalog.clone());
        let mut history = PurchaseHistory::new();
        history.record_purchase(catalog.get("only").unwrap());
        assert!(run(&resolver, AuctionSlotSpec::listings(3), &history).winners.is_empty());
    }

    proptest! {
        #[test]
        fn returns_min_of_slots_and_catalog(slots in 1u32..40, purchases in prop::collection::vec(0usize..17, 0..4)) {
            let resolver = resolver();
            let catalog = resolver.catalog().clone();
            let mut history = PurchaseHistory::new();
            for idx in &purchases {
                history.record_purchase(&catalog.products()[*idx]);
            }
            let available = catalog.products().iter().filter(|p| !history.has_purchased(&p.id)).count();

            let result = run(&resolver, AuctionSlotSpec::listings(slots), &history);
            prop_assert_eq!(result.winners.len(), (slots as usize).min(available));

            let ranks: Vec<u32> = result.winners.iter().map(|w| w.rank).collect();
            let expected: Vec<u32> = (1..=result.winners.len() as u32).collect();
            prop_assert_eq!(ranks, expected);

            let unique_items: HashSet<_> = result.winners.iter().map(|w| &w.id).collect();
            let unique_bids: HashSet<_> = result.winners.iter().map(|w| &w.resolved_bid_id).collect();
            prop_assert_eq!(unique_items.len(), result.winners.len());
            prop_assert_eq!(unique_bids.len(), result.winners.len());
            for winner in &result.winners {
                prop_assert!(!history.has_purchased(&winner.id));
            }
        }
    }
}
