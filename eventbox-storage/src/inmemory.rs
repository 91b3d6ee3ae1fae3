//! 内存版事务性存储（InMemoryStorage）
//!
//! 满足 `OutboxWork`/`OutboxStore`/`EventSourcingStore` 协议的轻量实现：
//! - `begin` 返回一个工作单元，插入先缓存在工作单元内；
//! - `commit` 原子地应用全部缓存写入；
//! - 未提交即丢弃工作单元等价于回滚，不留下任何行；
//! - 典型用途：测试环境、示例与本地开发。
//!
use crate::record::{EventSourcingRecord, OutboxRecord};
use crate::store::{EventSourcingStore, OutboxStore};
use crate::work::OutboxWork;
use async_trait::async_trait;
use eventbox_core::error::EventResult;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    outbox: Vec<OutboxRecord>,
    event_sourcing: Vec<EventSourcingRecord>,
}

/// 内存存储
#[derive(Default, Clone)]
pub struct InMemoryStorage {
    inner: Arc<Mutex<Tables>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开启一个工作单元；提交前的插入对存储不可见
    pub fn begin(&self) -> InMemoryWork {
        InMemoryWork {
            storage: self.clone(),
            outbox: Vec::new(),
            event_sourcing: Vec::new(),
        }
    }

    pub fn outbox_len(&self) -> usize {
        self.inner.lock().expect("storage lock poisoned").outbox.len()
    }

    pub fn event_sourcing_len(&self) -> usize {
        self.inner
            .lock()
            .expect("storage lock poisoned")
            .event_sourcing
            .len()
    }
}

/// 内存工作单元：`commit` 应用写入，直接丢弃等价于回滚
pub struct InMemoryWork {
    storage: InMemoryStorage,
    outbox: Vec<OutboxRecord>,
    event_sourcing: Vec<EventSourcingRecord>,
}

impl InMemoryWork {
    /// 原子地应用本工作单元缓存的全部插入
    pub fn commit(self) {
        let mut tables = self
            .storage
            .inner
            .lock()
            .expect("storage lock poisoned");
        tables.outbox.extend(self.outbox);
        tables.event_sourcing.extend(self.event_sourcing);
    }
}

#[async_trait]
impl OutboxWork for InMemoryWork {
    async fn insert_outbox(&mut self, records: &[OutboxRecord]) -> EventResult<()> {
        self.outbox.extend_from_slice(records);
        Ok(())
    }

    async fn insert_event_sourcing(&mut self, records: &[EventSourcingRecord]) -> EventResult<()> {
        self.event_sourcing.extend_from_slice(records);
        Ok(())
    }
}

#[async_trait]
impl OutboxStore for InMemoryStorage {
    async fn load_undelivered(&self, limit: usize) -> EventResult<Vec<OutboxRecord>> {
        let tables = self.inner.lock().expect("storage lock poisoned");
        let mut records = tables.outbox.clone();
        records.sort_by_key(|r| r.created_at());
        records.truncate(limit);
        Ok(records)
    }

    async fn mark_delivered(&self, id: Uuid) -> EventResult<()> {
        let mut tables = self.inner.lock().expect("storage lock poisoned");
        tables.outbox.retain(|r| r.id() != id);
        Ok(())
    }
}

#[async_trait]
impl EventSourcingStore for InMemoryStorage {
    async fn read(&self, root_id: &str) -> EventResult<Vec<EventSourcingRecord>> {
        let tables = self.inner.lock().expect("storage lock poisoned");
        let mut records: Vec<EventSourcingRecord> = tables
            .event_sourcing
            .iter()
            .filter(|r| r.root_id() == root_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.created_at());
        Ok(records)
    }
}
