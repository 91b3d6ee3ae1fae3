//! 事件订阅者（EventSubscriber）
//!
//! 定义消费某一静态事件类型的处理逻辑与元信息（名称、订阅类型），
//! 以及供注册表与队列绑定使用的类型擦除形态 `DynSubscriber`：
//! 擦除层负责把负载解码回订阅者声明的静态类型再行调用，
//! 解码失败按处理失败对待。
//!
use crate::event::DomainEvent;
use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// 事件订阅者：以声明的静态类型处理某一类事件
#[async_trait]
pub trait EventSubscriber<E: DomainEvent>: Send + Sync {
    /// 订阅者名称（用于队列命名、失败标记与审计）
    fn name(&self) -> &str;
    /// 处理事件
    async fn handle(&self, event: E) -> anyhow::Result<()>;
}

/// 类型擦除后的订阅者：按类型键登记，负载在调用前解码回静态类型
#[async_trait]
pub trait DynSubscriber: Send + Sync {
    fn name(&self) -> &str;
    /// 订阅的事件类型键
    fn event_type(&self) -> &'static str;
    /// 解码负载并调用处理逻辑；解码失败等同处理失败
    async fn handle_raw(&self, body: &Value) -> anyhow::Result<()>;
}

struct Erased<E, S> {
    inner: S,
    _marker: PhantomData<fn() -> E>,
}

#[async_trait]
impl<E, S> DynSubscriber for Erased<E, S>
where
    E: DomainEvent,
    S: EventSubscriber<E>,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn event_type(&self) -> &'static str {
        E::EVENT_TYPE
    }

    async fn handle_raw(&self, body: &Value) -> anyhow::Result<()> {
        let event: E = serde_json::from_value(body.clone())
            .with_context(|| format!("decode {} payload", E::EVENT_TYPE))?;
        self.inner.handle(event).await
    }
}

/// 将静态类型订阅者擦除为可注册形态
pub fn erase<E, S>(subscriber: S) -> Arc<dyn DynSubscriber>
where
    E: DomainEvent,
    S: EventSubscriber<E> + 'static,
{
    Arc::new(Erased {
        inner: subscriber,
        _marker: PhantomData,
    })
}

struct FnSubscriber<E, F> {
    name: String,
    action: F,
    _marker: PhantomData<fn() -> E>,
}

#[async_trait]
impl<E, F, Fut> DynSubscriber for FnSubscriber<E, F>
where
    E: DomainEvent,
    F: Fn(E) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = anyhow::Result<()>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn event_type(&self) -> &'static str {
        E::EVENT_TYPE
    }

    async fn handle_raw(&self, body: &Value) -> anyhow::Result<()> {
        let event: E = serde_json::from_value(body.clone())
            .with_context(|| format!("decode {} payload", E::EVENT_TYPE))?;
        (self.action)(event).await
    }
}

/// 以异步闭包构造订阅者
pub fn fn_subscriber<E, F, Fut>(name: impl Into<String>, action: F) -> Arc<dyn DynSubscriber>
where
    E: DomainEvent,
    F: Fn(E) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnSubscriber {
        name: name.into(),
        action,
        _marker: PhantomData,
    })
}

/// 订阅者组：一个消费者覆盖多种事件类型（共享同一个队列绑定）
pub trait SubscriberGroup: Send + Sync {
    /// 组名称（用于队列命名）
    fn name(&self) -> &str;
    /// 组内订阅者，注册序即分发序
    fn subscribers(&self) -> Vec<Arc<dyn DynSubscriber>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct UserRenamed {
        user_id: String,
        name: String,
    }

    impl DomainEvent for UserRenamed {
        const EVENT_TYPE: &'static str = "user.UserRenamed";
    }

    struct Recorder {
        seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl EventSubscriber<UserRenamed> for Recorder {
        fn name(&self) -> &str {
            "user.Recorder"
        }

        async fn handle(&self, event: UserRenamed) -> anyhow::Result<()> {
            self.seen.lock().unwrap().push(event.name);
            Ok(())
        }
    }

    #[tokio::test]
    async fn erased_subscriber_decodes_then_invokes() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let subscriber = erase(Recorder { seen: seen.clone() });
        assert_eq!(subscriber.event_type(), "user.UserRenamed");

        let body = serde_json::json!({ "user_id": "u-1", "name": "alice" });
        subscriber.handle_raw(&body).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["alice".to_string()]);
    }

    #[tokio::test]
    async fn malformed_payload_is_handler_failure() {
        let subscriber = erase(Recorder {
            seen: Arc::new(Mutex::new(Vec::new())),
        });
        let err = subscriber
            .handle_raw(&serde_json::json!({ "user_id": 1 }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("user.UserRenamed"));
    }

    #[tokio::test]
    async fn fn_subscriber_invokes_closure() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counted = hits.clone();
        let subscriber = fn_subscriber("user.Counter", move |_event: UserRenamed| {
            let counted = counted.clone();
            async move {
                counted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
        });

        let body = serde_json::json!({ "user_id": "u-2", "name": "bob" });
        subscriber.handle_raw(&body).await.unwrap();
        assert_eq!(hits.load(Ordering::Relaxed), 1);
    }
}
