//! 工作单元事件缓冲（EventBuffer）
//!
//! 收集一个工作单元内抬升的全部事件。缓冲是“开始工作单元”时显式创建
//! 并传入业务代码的对象，而非挂在环境事务上的隐式状态；提交钩子显式
//! 接收该缓冲（见 eventbox-storage 的 OutboxWriter）。
//!
//! 缓冲仅在单个工作单元的逻辑控制流内使用，不跨并发事务共享；
//! 工作单元结束（无论是否提交）后随之丢弃。
//!
use crate::error::EventResult;
use crate::event::{DomainEvent, EventSourcingEvent, RaisedEvent};

/// 每工作单元的事件缓冲，稳定的插入序（FIFO）
#[derive(Debug, Default)]
pub struct EventBuffer {
    events: Vec<RaisedEvent>,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个领域事件，发生时间在此处一次性打点
    pub fn add<E: DomainEvent>(&mut self, event: &E) -> EventResult<()> {
        self.events.push(RaisedEvent::from_event(event)?);
        Ok(())
    }

    /// 追加一个事件溯源事件，同时捕获其聚合根标识
    pub fn add_sourced<E: EventSourcingEvent>(&mut self, event: &E) -> EventResult<()> {
        self.events.push(RaisedEvent::from_sourced(event)?);
        Ok(())
    }

    /// 一次性排空缓冲，按插入序返回全部事件；再次调用返回空
    pub fn raise_events(&mut self) -> Vec<RaisedEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
