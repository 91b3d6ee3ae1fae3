//! 队列配置（QueueConfig）
//!
//! 每逻辑消费队列一份：重试上限、预取/并发上限与重试延迟。
//! `max_retries == 0` 表示关闭有界重试（代理按自身策略无限重投）。
//!
use bon::Builder;
use std::time::Duration;

/// 停车场消息附带的失败元数据头
pub const EXCEPTION_HEADER: &str = "x-exception-message";
pub const EXCEPTION_STACKTRACE_HEADER: &str = "x-exception-stacktrace";

/// 头帧预算未知时的失败元数据上限
pub const MAX_EXCEPTION_HEADER_SIZE: usize = 4096;

/// 队列配置
#[derive(Builder, Debug, Clone)]
pub struct QueueConfig {
    /// 队列名（见 `routing::queue_name`）
    #[builder(into)]
    queue_name: String,
    /// 最大重试次数；0 = 关闭有界重试
    #[builder(default = 0)]
    max_retries: u32,
    /// 预取/并发上限
    #[builder(default = 100)]
    prefetch_count: usize,
    /// 延迟队列的消息 TTL
    #[builder(default = Duration::from_secs(60))]
    retry_delay: Duration,
}

impl QueueConfig {
    /// 全默认值的配置
    pub fn new(queue_name: impl Into<String>) -> Self {
        Self::builder().queue_name(queue_name).build()
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn prefetch_count(&self) -> usize {
        self.prefetch_count
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    pub fn is_retry_enabled(&self) -> bool {
        self.max_retries > 0
    }
}
