//! 事件核心库（eventbox-core）
//!
//! 提供可靠事件投递体系的领域层构件，用于在应用中实现：
//! - 领域事件（`event`）与类型键编解码注册表（`codec`）
//! - 工作单元内的事件缓冲（`buffer`）
//! - 订阅者与订阅注册表（`subscriber`/`registry`）
//! - 发布协议与本地分发（`publisher`）
//! - 链路追踪上下文（`telemetry`）
//!
//! 本 crate 不绑定任何存储与传输实现，仅定义协议与最小必要的错误类型，
//! 以便在不同基础设施（例如 Postgres Outbox、消息中间件等）上进行适配实现。
//!
//! 典型用法：
//! 1. 定义事件并在进程启动时注册到 `EventCodecRegistry`；
//! 2. 业务代码向工作单元持有的 `EventBuffer` 追加事件；
//! 3. 提交前由 Outbox 写入器排空缓冲并落库（见 eventbox-storage）；
//! 4. 订阅侧通过 `SubscribersRegistry` 与 `LocalPublisher` 完成本地分发。
//!
pub mod buffer;
pub mod codec;
pub mod envelope;
pub mod error;
pub mod event;
pub mod publisher;
pub mod registry;
pub mod subscriber;
pub mod telemetry;

pub use buffer::EventBuffer;
pub use codec::EventCodecRegistry;
pub use envelope::{Envelope, WireEvent};
pub use error::{EventError, EventResult};
pub use event::{DomainEvent, EventSourcingEvent, RaisedEvent};
pub use publisher::{LocalPublisher, Publisher};
pub use registry::SubscribersRegistry;
pub use subscriber::{DynSubscriber, EventSubscriber, SubscriberGroup, erase, fn_subscriber};
pub use telemetry::{NoopTraceContextProvider, TraceContext, TraceContextProvider};
