// src/bidding/ids.rs

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::{Builder, Uuid};

/// 不透明 id 生成器
/// 底层使用可设定种子的 StdRng，测试时可复现；生成的 uuid 为 v4 布局
pub struct IdGenerator {
    rng: StdRng,
}

impl IdGenerator {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    fn next_uuid(&mut self) -> Uuid {
        Builder::from_random_bytes(self.rng.gen()).into_uuid()
    }

    /// 每次竞价胜出都生成新的 bid id，同一商品重复胜出也不复用
    pub fn next_bid_id(&mut self) -> String {
        format!("bid_{}", self.next_uuid().simple())
    }

    pub fn next_event_id(&mut self) -> String {
        format!("evt_{}", self.next_uuid().simple())
    }
}
