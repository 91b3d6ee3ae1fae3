//! 事件信封（Envelope）
//!
//! 事件的公开/Outbox 表示：事件负载加生成的唯一标识、冗余的发生时间
//! 与可选追踪上下文。线上格式为 `{"type": <类型键>, "body": <负载>}`，
//! 类型键在读取侧必须能解析回具体解码器，未知类型为硬错误。
//!
use crate::codec::EventCodecRegistry;
use crate::error::EventResult;
use crate::event::RaisedEvent;
use crate::telemetry::TraceContext;
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

/// 事件信封
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
pub struct Envelope {
    /// 生成的唯一标识
    id: Uuid,
    /// 事件类型键
    event_type: String,
    /// 事件负载
    body: Value,
    /// 冗余存储的事件发生时间
    created_at: DateTime<Utc>,
    /// 追踪上下文，未配置遥测时为空
    #[builder(default)]
    trace: TraceContext,
}

impl Envelope {
    /// 从缓冲形态构造信封：生成标识，拷贝发生时间，附加当前追踪上下文
    pub fn from_raised(event: &RaisedEvent, trace: TraceContext) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type: event.event_type().to_string(),
            body: event.body().clone(),
            created_at: event.occurred_at(),
            trace,
        }
    }

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

    /// 线上 JSON 形态：`{"type": ..., "body": ...}`
    pub fn wire_json(&self) -> Value {
        json!({
            "type": self.event_type,
            "body": self.body,
        })
    }

    pub fn wire_bytes(&self) -> EventResult<Vec<u8>> {
        Ok(serde_json::to_vec(&self.wire_json())?)
    }
}

/// 从线上格式解析出的事件（类型键 + 负载）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub body: Value,
}

impl WireEvent {
    /// 解析线上字节并按注册表校验：类型键未注册或负载畸形均为硬错误
    pub fn parse(registry: &EventCodecRegistry, bytes: &[u8]) -> EventResult<Self> {
        let wire: WireEvent = serde_json::from_slice(bytes)?;
        registry.probe(&wire.event_type, &wire.body)?;
        Ok(wire)
    }

    /// 不经注册表校验的裸解析（仅拆出类型键与负载）
    pub fn parse_unchecked(bytes: &[u8]) -> EventResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl From<&Envelope> for WireEvent {
    fn from(envelope: &Envelope) -> Self {
        Self {
            event_type: envelope.event_type.clone(),
            body: envelope.body.clone(),
        }
    }
}
