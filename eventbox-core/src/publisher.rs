//! 发布协议与本地分发（Publisher / LocalPublisher）
//!
//! `Publisher` 是 Outbox 发布循环面向外部传输的统一协议；
//! `LocalPublisher` 在进程内按注册顺序同步逐个调用匹配的订阅者，
//! 订阅者异常向调用方传播，本层不做隔离（隔离属于 Outbox 发布循环）。
//!
use crate::envelope::Envelope;
use crate::error::{EventError, EventResult};
use crate::registry::SubscribersRegistry;
use async_trait::async_trait;
use std::sync::Arc;

/// 事件发布协议：信封自带追踪上下文
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, envelope: &Envelope) -> EventResult<()>;
}

/// 进程内本地分发器
pub struct LocalPublisher {
    registry: Arc<SubscribersRegistry>,
}

impl LocalPublisher {
    pub fn new(registry: Arc<SubscribersRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Publisher for LocalPublisher {
    async fn publish(&self, envelope: &Envelope) -> EventResult<()> {
        for subscriber in self.registry.subscribers(envelope.event_type()) {
            subscriber
                .handle_raw(envelope.body())
                .await
                .map_err(|e| EventError::Subscriber {
                    subscriber: subscriber.name().to_string(),
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }
}
