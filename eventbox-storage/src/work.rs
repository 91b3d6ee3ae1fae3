//! Outbox 写入器（OutboxWriter）
//!
//! 让事件持久化与抬升它们的业务变更保持原子：提交前排空工作单元的
//! 事件缓冲，为每个事件构造信封（生成标识、拷贝时间戳、附加当前追踪
//! 上下文）并写入 Outbox；其中带聚合根的事件同时追加到事件溯源日志。
//! 任何持久化错误都会向上传播，令整个工作单元失败——部分写入的
//! Outbox 会破坏原子性不变量。
//!
use crate::record::{EventSourcingRecord, OutboxRecord};
use async_trait::async_trait;
use eventbox_core::buffer::EventBuffer;
use eventbox_core::envelope::Envelope;
use eventbox_core::error::EventResult;
use eventbox_core::telemetry::{NoopTraceContextProvider, TraceContextProvider};
use std::sync::Arc;

/// 工作单元内的写入面：实现方在调用者的原子事务内执行插入
#[async_trait]
pub trait OutboxWork: Send {
    async fn insert_outbox(&mut self, records: &[OutboxRecord]) -> EventResult<()>;

    async fn insert_event_sourcing(&mut self, records: &[EventSourcingRecord]) -> EventResult<()>;
}

/// Outbox 写入器
pub struct OutboxWriter {
    trace_provider: Arc<dyn TraceContextProvider>,
}

impl OutboxWriter {
    pub fn new(trace_provider: Arc<dyn TraceContextProvider>) -> Self {
        Self { trace_provider }
    }

    /// 未配置遥测时的构造：写入空追踪上下文
    pub fn without_telemetry() -> Self {
        Self::new(Arc::new(NoopTraceContextProvider))
    }

    /// 排空缓冲并通过工作单元落库；供提交钩子在业务事务内调用
    pub async fn flush(
        &self,
        buffer: &mut EventBuffer,
        work: &mut dyn OutboxWork,
    ) -> EventResult<()> {
        let events = buffer.raise_events();
        if events.is_empty() {
            return Ok(());
        }

        let trace = self.trace_provider.current();
        let mut outbox = Vec::with_capacity(events.len());
        let mut sourced = Vec::new();
        for event in &events {
            let envelope = Envelope::from_raised(event, trace.clone());
            outbox.push(OutboxRecord::from(&envelope));
            if let Some(record) = EventSourcingRecord::from_raised(event) {
                sourced.push(record);
            }
        }

        work.insert_outbox(&outbox).await?;
        if !sourced.is_empty() {
            work.insert_event_sourcing(&sourced).await?;
        }
        Ok(())
    }
}
