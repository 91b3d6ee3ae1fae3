//! 代理侧发布器（QueuePublisher）
//!
//! 把 Outbox 发布循环与消息代理接起来的传输实现：事件以线上格式
//! `{"type","body"}` 序列化，路由键由事件类型键推导（见
//! `routing::route_name`），信封携带的追踪上下文逐项放入消息头。
//! 发布目标是事件主交换机，投递到哪些队列由拓扑绑定决定。
//!
use crate::broker::QueueChannel;
use crate::routing::route_name;
use async_trait::async_trait;
use eventbox_core::envelope::Envelope;
use eventbox_core::error::EventResult;
use eventbox_core::publisher::Publisher;
use eventbox_core::telemetry::{BAGGAGE_HEADER, TRACEPARENT_HEADER, TRACESTATE_HEADER};
use std::collections::HashMap;
use std::sync::Arc;

/// 面向消息代理的事件发布器
pub struct QueuePublisher {
    channel: Arc<dyn QueueChannel>,
}

impl QueuePublisher {
    pub fn new(channel: Arc<dyn QueueChannel>) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl Publisher for QueuePublisher {
    async fn publish(&self, envelope: &Envelope) -> EventResult<()> {
        let mut headers = HashMap::new();
        let trace = envelope.trace();
        if let Some(traceparent) = trace.traceparent() {
            headers.insert(TRACEPARENT_HEADER.to_string(), traceparent.to_string());
        }
        if let Some(tracestate) = trace.tracestate() {
            headers.insert(TRACESTATE_HEADER.to_string(), tracestate.to_string());
        }
        if let Some(baggage) = trace.baggage() {
            headers.insert(BAGGAGE_HEADER.to_string(), baggage.to_string());
        }

        self.channel
            .publish(
                &route_name(envelope.event_type()),
                headers,
                envelope.wire_bytes()?,
            )
            .await
    }
}
