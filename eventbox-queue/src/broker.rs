//! 代理协议（broker）
//!
//! 消费侧面向代理的最小接口：一次投递的元数据载体 `Delivery` 与
//! 信道操作 `QueueChannel`。单个逻辑队列绑定的信道不可多任务无同步
//! 并用，适配层须按连接池槽位独占信道或做粗粒度互斥。
//!
use async_trait::async_trait;
use bon::Builder;
use eventbox_core::error::EventResult;
use eventbox_core::telemetry::{
    BAGGAGE_HEADER, TRACEPARENT_HEADER, TRACESTATE_HEADER, TraceContext,
};
use std::collections::HashMap;

/// 代理投递给消费者的一条消息
#[derive(Debug, Clone, Builder)]
pub struct Delivery {
    /// 代理内的投递标签（ack/reject 的句柄）
    delivery_tag: u64,
    /// 投递时的路由键
    #[builder(into)]
    routing_key: String,
    /// 原始消息体
    body: Vec<u8>,
    /// 消息头
    #[builder(default)]
    headers: HashMap<String, String>,
    /// 代理侧累计的死信/重试次数
    #[builder(default = 0)]
    retry_count: u64,
}

impl Delivery {
    pub fn delivery_tag(&self) -> u64 {
        self.delivery_tag
    }

    pub fn routing_key(&self) -> &str {
        &self.routing_key
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn retry_count(&self) -> u64 {
        self.retry_count
    }

    /// 从消息头提取追踪上下文
    pub fn trace_context(&self) -> TraceContext {
        TraceContext::builder()
            .maybe_traceparent(self.headers.get(TRACEPARENT_HEADER).cloned())
            .maybe_tracestate(self.headers.get(TRACESTATE_HEADER).cloned())
            .maybe_baggage(self.headers.get(BAGGAGE_HEADER).cloned())
            .build()
    }
}

/// 面向单个逻辑队列绑定的信道操作
#[async_trait]
pub trait QueueChannel: Send + Sync {
    /// 确认投递（终态：已处理）
    async fn ack(&self, delivery_tag: u64) -> EventResult<()>;

    /// 不重新入队地拒绝；代理拓扑将其路由进延迟队列
    async fn reject(&self, delivery_tag: u64) -> EventResult<()>;

    /// 否定确认并重新入队；代理按自身策略无限重投
    async fn nack_requeue(&self, delivery_tag: u64) -> EventResult<()>;

    /// 以给定路由键发布消息（停车场投递使用）
    async fn publish(
        &self,
        routing_key: &str,
        headers: HashMap<String, String>,
        body: Vec<u8>,
    ) -> EventResult<()>;

    /// 单个消息头的字节预算（超出部分被截断）
    fn max_header_size(&self) -> usize {
        crate::config::MAX_EXCEPTION_HEADER_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_context_reads_w3c_headers() {
        let delivery = Delivery::builder()
            .delivery_tag(1)
            .routing_key("billing.invoice_paid")
            .body(b"{}".to_vec())
            .headers(HashMap::from([(
                TRACEPARENT_HEADER.to_string(),
                "00-cafe-babe-01".to_string(),
            )]))
            .build();

        let trace = delivery.trace_context();
        assert_eq!(trace.traceparent(), Some("00-cafe-babe-01"));
        assert_eq!(trace.tracestate(), None);
    }
}
