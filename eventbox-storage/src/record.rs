//! 持久化模型（OutboxRecord / EventSourcingRecord）
//!
//! 定义事件在 Outbox 表与事件溯源表中的标准形态，以及与公开信封
//! `Envelope` 之间的转换。溯源行一经写入不可变更。
//!
use bon::Builder;
use chrono::{DateTime, Utc};
use eventbox_core::envelope::Envelope;
use eventbox_core::event::RaisedEvent;
use eventbox_core::telemetry::TraceContext;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Outbox 行：行存在当且仅当所属业务事务已提交
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
pub struct OutboxRecord {
    /// 行唯一标识（与信封标识一致）
    id: Uuid,
    /// 事件类型键
    event_type: String,
    /// 序列化的事件负载
    body: Value,
    /// 事件发生时间
    created_at: DateTime<Utc>,
    /// 追踪上下文（冗余存储，随投递传播）
    #[builder(default)]
    trace: TraceContext,
}

impl OutboxRecord {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn trace(&self) -> &TraceContext {
        &self.trace
    }
}

impl From<&Envelope> for OutboxRecord {
    fn from(envelope: &Envelope) -> Self {
        Self {
            id: envelope.id(),
            event_type: envelope.event_type().to_string(),
            body: envelope.body().clone(),
            created_at: envelope.created_at(),
            trace: envelope.trace().clone(),
        }
    }
}

impl From<&OutboxRecord> for Envelope {
    fn from(record: &OutboxRecord) -> Self {
        Envelope::builder()
            .id(record.id)
            .event_type(record.event_type.clone())
            .body(record.body.clone())
            .created_at(record.created_at)
            .trace(record.trace.clone())
            .build()
    }
}

/// 事件溯源行：按聚合根分组的只追加历史
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
pub struct EventSourcingRecord {
    /// 行唯一标识
    id: Uuid,
    /// 所属聚合根标识
    root_id: String,
    /// 事件类型键
    event_type: String,
    /// 序列化的事件负载
    body: Value,
    /// 事件发生时间
    created_at: DateTime<Utc>,
}

impl EventSourcingRecord {
    /// 从缓冲事件构造；非溯源事件（无聚合根）返回 `None`
    pub fn from_raised(event: &RaisedEvent) -> Option<Self> {
        let root_id = event.root_id()?;
        Some(Self {
            id: Uuid::new_v4(),
            root_id: root_id.to_string(),
            event_type: event.event_type().to_string(),
            body: event.body().clone(),
            created_at: event.occurred_at(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
