//! 事件体系统一错误定义
//!
//! 聚焦编解码、订阅分发、Outbox 写入与传输投递等最小必要集合，
//! 便于在各实现层统一转换为 `EventError`。
//!
use std::time::Duration;
use thiserror::Error;

/// 统一错误类型（基础库最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EventError {
    // --- 编解码 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
    #[error("unknown event type: {event_type}")]
    UnknownEventType { event_type: String },
    #[error("duplicate event type: {event_type}")]
    DuplicateEventType { event_type: String },
    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch { expected: String, found: String },
    #[error("decode failed: type={event_type}, reason={reason}")]
    Decode { event_type: String, reason: String },

    // --- 订阅分发 ---
    #[error("subscriber error: subscriber={subscriber}, reason={reason}")]
    Subscriber { subscriber: String, reason: String },

    // --- Outbox/持久化 ---
    #[error("outbox error: {reason}")]
    Outbox { reason: String },
    #[error("storage error: {reason}")]
    Storage { reason: String },

    // --- 传输投递 ---
    #[error("transport error: {reason}")]
    Transport { reason: String },
    #[error("publish timed out after {timeout:?}")]
    PublishTimeout { timeout: Duration },

    // --- 队列消费 ---
    #[error("queue error: {reason}")]
    Queue { reason: String },
}

/// 统一 Result 类型别名
pub type EventResult<T> = Result<T, EventError>;

// ---- Cross-crate conversions for infrastructure convenience ----
// 允许在基础设施层直接使用 `?` 将 sqlx 等错误转换为 EventError

#[cfg(feature = "infra-sqlx")]
impl From<sqlx::Error> for EventError {
    fn from(err: sqlx::Error) -> Self {
        EventError::Storage {
            reason: err.to_string(),
        }
    }
}
