//! 存储协议（OutboxStore / EventSourcingStore）
//!
//! 发布循环与重放读取面向的最小存储接口；具体后端（内存、Postgres）
//! 由上层提供实现并注入。
//!
use crate::record::{EventSourcingRecord, OutboxRecord};
use async_trait::async_trait;
use eventbox_core::error::EventResult;
use uuid::Uuid;

/// Outbox 存储：未投递集合可查询，确认以单行为原子单位
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// 读取至多 `limit` 条未投递行，按 `created_at` 升序（旧者优先）
    async fn load_undelivered(&self, limit: usize) -> EventResult<Vec<OutboxRecord>>;

    /// 标记单行投递完成（本实现族采用行删除编码）
    async fn mark_delivered(&self, id: Uuid) -> EventResult<()>;
}

/// 事件溯源日志：只读回放接口，不存在更新与删除
#[async_trait]
pub trait EventSourcingStore: Send + Sync {
    /// 读取某聚合根的全部历史，按创建时间升序
    async fn read(&self, root_id: &str) -> EventResult<Vec<EventSourcingRecord>>;
}
