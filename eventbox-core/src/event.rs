//! 领域事件（DomainEvent）
//!
//! 定义事件载荷需要实现的最小接口（`DomainEvent`）、事件溯源事件的
//! 标记接口（`EventSourcingEvent`），以及事件在缓冲/落库前的序列化
//! 形态 `RaisedEvent`。
//!
use crate::error::EventResult;
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// 领域事件载荷需要满足的通用能力边界
pub trait DomainEvent:
    Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// 稳定的事件类型键（形如 `order.OrderCreated`），用于路由、
    /// 编解码查找与订阅分发
    const EVENT_TYPE: &'static str;

    fn event_type(&self) -> &'static str {
        Self::EVENT_TYPE
    }
}

/// 事件溯源事件：除进入 Outbox 外，还按聚合根追加到只写日志
pub trait EventSourcingEvent: DomainEvent {
    /// 事件所属的聚合根标识
    fn root_id(&self) -> String;
}

/// 事件进入缓冲后的序列化形态
///
/// `occurred_at` 在事件进入缓冲时一次性打点（UTC），之后不可变；
/// `root_id` 仅对事件溯源事件存在。
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
pub struct RaisedEvent {
    /// 事件类型键
    event_type: String,
    /// 事件负载
    body: Value,
    /// 事件发生时间
    occurred_at: DateTime<Utc>,
    /// 所属聚合根（仅事件溯源事件）
    root_id: Option<String>,
}

impl RaisedEvent {
    /// 将普通领域事件序列化入缓冲形态，发生时间取当前 UTC 时间
    pub fn from_event<E: DomainEvent>(event: &E) -> EventResult<Self> {
        Ok(Self {
            event_type: E::EVENT_TYPE.to_string(),
            body: serde_json::to_value(event)?,
            occurred_at: Utc::now(),
            root_id: None,
        })
    }

    /// 将事件溯源事件序列化入缓冲形态，同时捕获聚合根标识
    pub fn from_sourced<E: EventSourcingEvent>(event: &E) -> EventResult<Self> {
        Ok(Self {
            root_id: Some(event.root_id()),
            ..Self::from_event(event)?
        })
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn root_id(&self) -> Option<&str> {
        self.root_id.as_deref()
    }
}
