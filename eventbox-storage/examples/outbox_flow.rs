/// Outbox 工作流示例
/// 演示“业务工作单元抬升事件 → 提交落库 → 发布循环投递到本地订阅”
use async_trait::async_trait;
use eventbox_core::buffer::EventBuffer;
use eventbox_core::codec::EventCodecRegistry;
use eventbox_core::envelope::Envelope;
use eventbox_core::error::EventResult;
use eventbox_core::event::{DomainEvent, EventSourcingEvent};
use eventbox_core::publisher::{LocalPublisher, Publisher};
use eventbox_core::registry::SubscribersRegistry;
use eventbox_core::subscriber::fn_subscriber;
use eventbox_storage::{
    EventSourcingStore, InMemoryStorage, OutboxPublisher, OutboxPublisherConfig, OutboxWriter,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct OrderPlaced {
    order_id: String,
    total: i64,
}

impl DomainEvent for OrderPlaced {
    const EVENT_TYPE: &'static str = "order.OrderPlaced";
}

impl EventSourcingEvent for OrderPlaced {
    fn root_id(&self) -> String {
        self.order_id.clone()
    }
}

/// 打印投递内容的示例传输
struct StdoutTransport;

#[async_trait]
impl Publisher for StdoutTransport {
    async fn publish(&self, envelope: &Envelope) -> EventResult<()> {
        println!(
            "transport <- {} {}",
            envelope.event_type(),
            envelope.body()
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 进程启动：注册事件类型与订阅者
    let mut codecs = EventCodecRegistry::new();
    codecs.register::<OrderPlaced>()?;

    let mut subscribers = SubscribersRegistry::new();
    subscribers.register(fn_subscriber("order.OnPlaced", |e: OrderPlaced| async move {
        println!("subscriber <- order {} total {}", e.order_id, e.total);
        Ok(())
    }));

    // 2. 业务工作单元：抬升事件，提交时原子落库
    let storage = InMemoryStorage::new();
    let writer = OutboxWriter::without_telemetry();

    let mut buffer = EventBuffer::new();
    buffer.add_sourced(&OrderPlaced {
        order_id: "o-1001".into(),
        total: 250,
    })?;

    let mut work = storage.begin();
    writer.flush(&mut buffer, &mut work).await?;
    work.commit();
    println!("outbox rows after commit: {}", storage.outbox_len());

    // 3. 发布循环：投递到本地订阅与示例传输
    let local = Arc::new(LocalPublisher::new(Arc::new(subscribers)));
    let publisher = Arc::new(
        OutboxPublisher::builder()
            .store(Arc::new(storage.clone()))
            .publishers(vec![local as Arc<dyn Publisher>, Arc::new(StdoutTransport)])
            .config(OutboxPublisherConfig {
                poll_delay: Duration::from_millis(50),
                ..Default::default()
            })
            .build(),
    );

    let handle = publisher.start();
    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.shutdown();
    handle.join().await;

    // 4. 事件溯源日志可按聚合根回放
    let history = storage.read("o-1001").await?;
    println!("history for o-1001: {} event(s)", history.len());
    Ok(())
}
