//! 消费者重试自动机（QueueConsumer）
//!
//! 对单条消息的重投次数做有界控制，消息不丢失：
//! - Active：投递给订阅者。全部成功 → ack（终态 Delivered）；
//! - 失败且重试关闭 → nack 重新入队（代理自行无限重投）；
//! - 失败且 `retry_count < max_retries` → 不入队地拒绝，代理拓扑
//!   将其路由进延迟队列，TTL 到期回到主队列并使计数加一；
//! - 失败且 `retry_count >= max_retries` → 把原始消息体连同失败元
//!   数据头发布到停车场队列，再确认原投递（终态 Parked，仅人工介入）；
//! - 负载解码失败与处理失败走同一条重试路径，绝不静默丢弃。
//!
//! 每条投递一个处理任务，以 `prefetch_count` 为并发上限；处理逻辑
//! 必须可与自身在同队列的不同消息间并发执行。
//!
use crate::broker::{Delivery, QueueChannel};
use crate::config::{EXCEPTION_HEADER, EXCEPTION_STACKTRACE_HEADER, QueueConfig};
use crate::routing::parking_lot_queue;
use anyhow::Context;
use eventbox_core::codec::EventCodecRegistry;
use eventbox_core::envelope::WireEvent;
use eventbox_core::subscriber::DynSubscriber;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// 队列消费者
pub struct QueueConsumer {
    config: QueueConfig,
    channel: Arc<dyn QueueChannel>,
    codecs: Arc<EventCodecRegistry>,
    subscribers: HashMap<String, Vec<Arc<dyn DynSubscriber>>>,
}

impl QueueConsumer {
    /// `subscribers` 的注册顺序即同一类型键下的分发顺序
    pub fn new(
        config: QueueConfig,
        channel: Arc<dyn QueueChannel>,
        codecs: Arc<EventCodecRegistry>,
        subscribers: Vec<Arc<dyn DynSubscriber>>,
    ) -> Self {
        let mut by_type: HashMap<String, Vec<Arc<dyn DynSubscriber>>> = HashMap::new();
        for subscriber in subscribers {
            by_type
                .entry(subscriber.event_type().to_string())
                .or_default()
                .push(subscriber);
        }
        Self {
            config,
            channel,
            codecs,
            subscribers: by_type,
        }
    }

    /// 启动消费循环：逐条接收投递并调度处理任务，直至取消或流结束
    pub fn start(self: Arc<Self>, mut deliveries: mpsc::Receiver<Delivery>) -> ConsumerHandle {
        let token = CancellationToken::new();
        let task = {
            let consumer = self.clone();
            let token = token.clone();
            tokio::spawn(async move {
                let semaphore = Arc::new(Semaphore::new(consumer.config.prefetch_count()));
                loop {
                    tokio::select! {
                        _ = token.cancelled() => break,
                        maybe = deliveries.recv() => {
                            let Some(delivery) = maybe else { break };
                            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                                break;
                            };
                            let consumer = consumer.clone();
                            tokio::spawn(async move {
                                consumer.handle_delivery(delivery).await;
                                drop(permit);
                            });
                        }
                    }
                }
            })
        };
        ConsumerHandle {
            token,
            task: Some(task),
        }
    }

    /// 处理一条投递；自动机自身从不让错误穿透到消费进程
    pub async fn handle_delivery(&self, delivery: Delivery) {
        let trace = delivery.trace_context();
        debug!(
            queue = self.config.queue_name(),
            routing_key = delivery.routing_key(),
            retry_count = delivery.retry_count(),
            traceparent = trace.traceparent().unwrap_or_default(),
            "event accepted"
        );

        match self.process(&delivery).await {
            Ok(()) => {
                if let Err(err) = self.channel.ack(delivery.delivery_tag()).await {
                    error!(tag = delivery.delivery_tag(), error = %err, "ack failed");
                }
            }
            Err(err) => self.on_failure(&delivery, err).await,
        }
    }

    async fn process(&self, delivery: &Delivery) -> anyhow::Result<()> {
        // 解码失败与处理失败同路：都进入重试自动机
        let wire = WireEvent::parse(&self.codecs, delivery.body())
            .context("broken event payload")?;
        if let Some(subscribers) = self.subscribers.get(&wire.event_type) {
            for subscriber in subscribers {
                subscriber
                    .handle_raw(&wire.body)
                    .await
                    .with_context(|| format!("subscriber {} failed", subscriber.name()))?;
            }
        }
        Ok(())
    }

    async fn on_failure(&self, delivery: &Delivery, err: anyhow::Error) {
        error!(
            queue = self.config.queue_name(),
            payload = %String::from_utf8_lossy(delivery.body()),
            error = %err,
            "broken event"
        );

        let result = if !self.config.is_retry_enabled() {
            self.channel.nack_requeue(delivery.delivery_tag()).await
        } else if delivery.retry_count() >= u64::from(self.config.max_retries()) {
            error!(
                queue = self.config.queue_name(),
                max_retries = self.config.max_retries(),
                "couldn't process message after retries, parking"
            );
            self.park(delivery, &err).await
        } else {
            self.channel.reject(delivery.delivery_tag()).await
        };

        if let Err(err) = result {
            // 信道操作本身失败：消息停留在 Active，由代理重投
            error!(tag = delivery.delivery_tag(), error = %err, "broker operation failed");
        }
    }

    async fn park(&self, delivery: &Delivery, err: &anyhow::Error) -> eventbox_core::error::EventResult<()> {
        let headers = self.failure_headers(delivery, err);
        self.channel
            .publish(
                &parking_lot_queue(self.config.queue_name()),
                headers,
                delivery.body().to_vec(),
            )
            .await?;
        self.channel.ack(delivery.delivery_tag()).await
    }

    fn failure_headers(&self, delivery: &Delivery, err: &anyhow::Error) -> HashMap<String, String> {
        let budget = self.channel.max_header_size();
        let message = truncate_to(&err.to_string(), budget);
        let chain = truncate_to(
            &format!("{err:?}"),
            budget.saturating_sub(message.len()),
        );

        let mut headers = delivery.headers().clone();
        headers.insert(EXCEPTION_HEADER.to_string(), message);
        headers.insert(EXCEPTION_STACKTRACE_HEADER.to_string(), chain);
        headers
    }
}

fn truncate_to(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end].to_string()
}

/// 消费者运行句柄：用于优雅关闭与等待调度循环结束
pub struct ConsumerHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ConsumerHandle {
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub async fn join(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ConsumerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
