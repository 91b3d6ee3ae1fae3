//! 链路追踪上下文（TraceContext）
//!
//! 定义随事件一同传播的追踪信息与其提供者协议。上下文通过显式注入
//! 传入写入器/发布器调用链，不依赖任何进程级全局持有者。
//!
use bon::Builder;
use serde::{Deserialize, Serialize};

/// W3C Trace Context 头名称
pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const TRACESTATE_HEADER: &str = "tracestate";
pub const BAGGAGE_HEADER: &str = "baggage";

/// 追踪上下文，三个字段各自独立可空；未配置遥测时为空上下文
#[derive(Builder, Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    traceparent: Option<String>,
    tracestate: Option<String>,
    baggage: Option<String>,
}

impl TraceContext {
    /// 空上下文（遥测未配置时的取值）
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.traceparent.is_none() && self.tracestate.is_none() && self.baggage.is_none()
    }

    pub fn traceparent(&self) -> Option<&str> {
        self.traceparent.as_deref()
    }

    pub fn tracestate(&self) -> Option<&str> {
        self.tracestate.as_deref()
    }

    pub fn baggage(&self) -> Option<&str> {
        self.baggage.as_deref()
    }
}

/// 追踪上下文提供者：从当前执行环境提取追踪信息
pub trait TraceContextProvider: Send + Sync {
    fn current(&self) -> TraceContext;
}

/// 默认空实现，遥测未配置时使用
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTraceContextProvider;

impl TraceContextProvider for NoopTraceContextProvider {
    fn current(&self) -> TraceContext {
        TraceContext::empty()
    }
}
