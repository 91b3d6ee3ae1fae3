//! 订阅注册表（SubscribersRegistry）
//!
//! 维护“事件类型键 → 订阅者列表”的映射，支持单事件订阅者与覆盖多种
//! 事件类型的订阅者组；同一类型键下保持注册顺序，分发按此顺序进行。
//!
use crate::subscriber::{DynSubscriber, SubscriberGroup};
use std::collections::HashMap;
use std::sync::Arc;

/// 订阅注册表
#[derive(Default, Clone)]
pub struct SubscribersRegistry {
    by_type: HashMap<String, Vec<Arc<dyn DynSubscriber>>>,
    groups: Vec<Arc<dyn SubscriberGroup>>,
    singles: Vec<Arc<dyn DynSubscriber>>,
}

impl SubscribersRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册单事件订阅者
    pub fn register(&mut self, subscriber: Arc<dyn DynSubscriber>) {
        self.add_to_map(subscriber.clone());
        self.singles.push(subscriber);
    }

    /// 注册订阅者组：组内每个订阅者按其类型键逐一登记
    pub fn register_group(&mut self, group: Arc<dyn SubscriberGroup>) {
        for subscriber in group.subscribers() {
            self.add_to_map(subscriber);
        }
        self.groups.push(group);
    }

    /// 返回该类型键下的全部订阅者，保持注册顺序
    pub fn subscribers(&self, event_type: &str) -> Vec<Arc<dyn DynSubscriber>> {
        self.by_type.get(event_type).cloned().unwrap_or_default()
    }

    /// 全部订阅者组（供队列绑定遍历）
    pub fn groups(&self) -> &[Arc<dyn SubscriberGroup>] {
        &self.groups
    }

    /// 全部单事件订阅者（供队列绑定遍历）
    pub fn singles(&self) -> &[Arc<dyn DynSubscriber>] {
        &self.singles
    }

    fn add_to_map(&mut self, subscriber: Arc<dyn DynSubscriber>) {
        self.by_type
            .entry(subscriber.event_type().to_string())
            .or_default()
            .push(subscriber);
    }
}
