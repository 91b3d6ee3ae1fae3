//! 事件持久化层（eventbox-storage）
//!
//! 提供事务性 Outbox 与事件溯源日志的协议与运行时：
//! - 持久化模型（`record`）：Outbox 行与事件溯源行；
//! - 写入器（`work`）：在业务工作单元内原子落库缓冲事件；
//! - 存储协议（`store`）：未投递集合的查询与按行确认；
//! - 发布循环（`publisher`）：后台轮询并逐行投递到外部传输；
//! - 内存后端（`inmemory`）：测试与示例用的事务性实现；
//! - Postgres 后端（`postgres`，feature 开关）。
//!
//! “已投递”的编码取行删除（而非可空 `published_at` 标记）：实现更简单，
//! 代价是不保留投递历史。投递保证为至少一次，传输方须容忍重复。
//!
pub mod inmemory;
pub mod publisher;
pub mod record;
pub mod store;
pub mod work;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use inmemory::{InMemoryStorage, InMemoryWork};
pub use publisher::{DeliveryReport, OutboxPublisher, OutboxPublisherConfig, PublisherHandle};
pub use record::{EventSourcingRecord, OutboxRecord};
pub use store::{EventSourcingStore, OutboxStore};
pub use work::{OutboxWork, OutboxWriter};
