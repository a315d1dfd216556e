// src/client/queue.rs

use std::mem;

use crate::model::events::EventBatch;

/// 待上报事件队列
/// 上报时整体换出；失败时换回，失败批次排在期间新增事件之前，不丢失也不重复
#[derive(Debug, Default)]
pub struct PendingEventQueue {
    pending: EventBatch,
}

impl PendingEventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, batch: EventBatch) {
        self.pending.append(batch);
    }

    /// 原子换出当前全部事件，队列随即为空
    pub fn take(&mut self) -> EventBatch {
        mem::take(&mut self.pending)
    }

    /// 放回发送失败的批次
    pub fn restore(&mut self, failed: EventBatch) {
        let interim = mem::replace(&mut self.pending, failed);
        self.pending.append(interim);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
