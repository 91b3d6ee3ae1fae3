//! 队列消费层（eventbox-queue）
//!
//! 消费者侧的有界重试自动机与队列拓扑：
//! - 配置（`config`）：每逻辑队列的重试上限、预取与重试延迟；
//! - 命名（`routing`）：类型键到路由键、订阅者名到队列名的确定性推导；
//! - 拓扑（`topology`）：主队列/延迟队列/停车场队列的声明计算；
//! - 代理协议（`broker`）：投递与 ack/reject/nack/publish 的最小接口；
//! - 发布器（`publisher`）：Outbox 发布循环面向代理的传输实现；
//! - 消费者（`consumer`）：按预取上限并发调度处理任务的重试自动机。
//!
//! 本 crate 不绑定具体消息中间件：代理的线协议、队列持久化与信道复用
//! 由实现 `QueueChannel` 的适配层提供。
//!
pub mod broker;
pub mod config;
pub mod consumer;
pub mod publisher;
pub mod routing;
pub mod topology;

pub use broker::{Delivery, QueueChannel};
pub use config::QueueConfig;
pub use consumer::{ConsumerHandle, QueueConsumer};
pub use publisher::QueuePublisher;
pub use routing::{camel_to_snake, delay_queue, parking_lot_queue, queue_name, route_name};
pub use topology::{ExchangeDeclaration, ExchangeKind, QueueBinding, QueueDeclaration, Topology, topology};
