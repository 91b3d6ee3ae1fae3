//! Outbox 发布循环（OutboxPublisher）
//!
//! 长驻后台任务，状态机 {Polling, Delivering, Sleeping}，仅被外部取消终止：
//! - Polling：一次只读查询载入至多 `batch_limit` 条未投递行，旧者优先；
//! - Delivering：逐行按注册顺序调用每个传输的发布操作，全部成功后在
//!   独立的小工作单元内确认该行；单行失败只记录日志，不影响批内其余行，
//!   载入批次本身失败同样被捕获记录（批级隔离）；
//! - Sleeping：一轮结束后等待 `poll_delay`，睡眠可被取消令牌即时打断。
//!
//! 保证为至少一次：在“传输发布成功”与“确认行”之间崩溃会导致下轮重投，
//! 传输方必须容忍重复。
//!
use crate::record::OutboxRecord;
use crate::store::OutboxStore;
use bon::Builder;
use eventbox_core::envelope::Envelope;
use eventbox_core::error::{EventError, EventResult};
use eventbox_core::publisher::Publisher;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// 发布循环配置
#[derive(Clone, Copy, Debug)]
pub struct OutboxPublisherConfig {
    /// 单轮载入的未投递行上限
    pub batch_limit: usize,
    /// 两轮之间的等待时长
    pub poll_delay: Duration,
    /// 单次传输发布的超时；超时按失败处理，行留待下轮重投
    pub publish_timeout: Option<Duration>,
}

impl Default for OutboxPublisherConfig {
    fn default() -> Self {
        Self {
            batch_limit: 1000,
            poll_delay: Duration::from_secs(1),
            publish_timeout: None,
        }
    }
}

/// 一轮投递的结果统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Outbox 发布器：
/// - 周期性从 `OutboxStore` 拉取未投递行
/// - 逐行交给全部已配置传输，全部成功即删除该行
#[derive(Builder)]
pub struct OutboxPublisher {
    store: Arc<dyn OutboxStore>,
    publishers: Vec<Arc<dyn Publisher>>,
    #[builder(default)]
    config: OutboxPublisherConfig,
}

impl OutboxPublisher {
    /// 启动发布循环，返回可用于关闭/等待的句柄
    pub fn start(self: Arc<Self>) -> PublisherHandle {
        let token = CancellationToken::new();
        let task = {
            let publisher = self.clone();
            let token = token.clone();
            tokio::spawn(async move {
                loop {
                    if let Err(err) = publisher.deliver_pending().await {
                        // 批级隔离：载入失败不终止循环
                        error!(error = %err, "error while loading outbox batch");
                    }
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = time::sleep(publisher.config.poll_delay) => {}
                    }
                }
            })
        };
        PublisherHandle {
            token,
            task: Some(task),
        }
    }

    /// 执行一轮 Polling + Delivering；也用于测试中的确定性驱动
    pub async fn deliver_pending(&self) -> EventResult<DeliveryReport> {
        let records = self.store.load_undelivered(self.config.batch_limit).await?;
        let mut report = DeliveryReport::default();
        for record in &records {
            match self.deliver_record(record).await {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    // 行级隔离：记录日志，继续批内其余行
                    report.failed += 1;
                    error!(id = %record.id(), error = %err, "error while publishing outbox record");
                }
            }
        }
        Ok(report)
    }

    async fn deliver_record(&self, record: &OutboxRecord) -> EventResult<()> {
        let envelope = Envelope::from(record);
        for publisher in &self.publishers {
            match self.config.publish_timeout {
                Some(timeout) => time::timeout(timeout, publisher.publish(&envelope))
                    .await
                    .map_err(|_| EventError::PublishTimeout { timeout })??,
                None => publisher.publish(&envelope).await?,
            }
        }
        debug!(id = %record.id(), "outbox record delivered");
        self.store.mark_delivered(record.id()).await
    }
}

/// 发布循环句柄：用于优雅关闭与等待任务结束
pub struct PublisherHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PublisherHandle {
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

impl Drop for PublisherHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inmemory::InMemoryStorage;
    use crate::work::OutboxWriter;
    use async_trait::async_trait;
    use eventbox_core::buffer::EventBuffer;
    use eventbox_core::event::DomainEvent;
    use serde::{Deserialize, Serialize};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct StockAdjusted {
        sku: String,
    }

    impl DomainEvent for StockAdjusted {
        const EVENT_TYPE: &'static str = "warehouse.StockAdjusted";
    }

    #[derive(Default)]
    struct SpyTransport {
        published: Mutex<Vec<String>>,
        fail_on: Option<String>,
        slow: Option<Duration>,
    }

    #[async_trait]
    impl Publisher for SpyTransport {
        async fn publish(&self, envelope: &Envelope) -> EventResult<()> {
            if let Some(delay) = self.slow {
                time::sleep(delay).await;
            }
            let sku = envelope.body()["sku"].as_str().unwrap_or_default().to_string();
            if self.fail_on.as_deref() == Some(sku.as_str()) {
                return Err(EventError::Transport {
                    reason: format!("refused {sku}"),
                });
            }
            self.published.lock().unwrap().push(sku);
            Ok(())
        }
    }

    async fn seed(storage: &InMemoryStorage, skus: &[&str]) {
        let writer = OutboxWriter::without_telemetry();
        for sku in skus {
            let mut buffer = EventBuffer::new();
            buffer.add(&StockAdjusted { sku: sku.to_string() }).unwrap();
            let mut work = storage.begin();
            writer.flush(&mut buffer, &mut work).await.unwrap();
            work.commit();
        }
    }

    #[tokio::test]
    async fn failing_record_does_not_block_the_rest() {
        let storage = InMemoryStorage::new();
        seed(&storage, &["s-1", "s-2", "s-3"]).await;

        let transport = Arc::new(SpyTransport {
            fail_on: Some("s-2".into()),
            ..Default::default()
        });
        let publisher = OutboxPublisher::builder()
            .store(Arc::new(storage.clone()))
            .publishers(vec![transport.clone() as Arc<dyn Publisher>])
            .build();

        let report = publisher.deliver_pending().await.unwrap();
        assert_eq!(report, DeliveryReport { delivered: 2, failed: 1 });

        // 第 1、3 行已删除，第 2 行留待下轮
        let remaining = storage.load_undelivered(10).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].body()["sku"], "s-2");
        assert_eq!(*transport.published.lock().unwrap(), vec!["s-1", "s-3"]);
    }

    #[tokio::test]
    async fn all_transports_must_succeed_before_removal() {
        let storage = InMemoryStorage::new();
        seed(&storage, &["s-9"]).await;

        let good = Arc::new(SpyTransport::default());
        let bad = Arc::new(SpyTransport {
            fail_on: Some("s-9".into()),
            ..Default::default()
        });
        let publisher = OutboxPublisher::builder()
            .store(Arc::new(storage.clone()))
            .publishers(vec![
                good.clone() as Arc<dyn Publisher>,
                bad as Arc<dyn Publisher>,
            ])
            .build();

        let report = publisher.deliver_pending().await.unwrap();
        assert_eq!(report.failed, 1);
        // 行保留：下轮会再次尝试所有传输（至少一次语义，允许重复)
        assert_eq!(storage.load_undelivered(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn timed_out_publish_is_a_failure() {
        let storage = InMemoryStorage::new();
        seed(&storage, &["s-slow"]).await;

        let slow = Arc::new(SpyTransport {
            slow: Some(Duration::from_millis(200)),
            ..Default::default()
        });
        let publisher = OutboxPublisher::builder()
            .store(Arc::new(storage.clone()))
            .publishers(vec![slow as Arc<dyn Publisher>])
            .config(OutboxPublisherConfig {
                publish_timeout: Some(Duration::from_millis(10)),
                ..Default::default()
            })
            .build();

        let report = publisher.deliver_pending().await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(storage.load_undelivered(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn batch_limit_bounds_a_cycle() {
        let storage = InMemoryStorage::new();
        seed(&storage, &["a", "b", "c"]).await;

        let transport = Arc::new(SpyTransport::default());
        let publisher = OutboxPublisher::builder()
            .store(Arc::new(storage.clone()))
            .publishers(vec![transport as Arc<dyn Publisher>])
            .config(OutboxPublisherConfig {
                batch_limit: 2,
                ..Default::default()
            })
            .build();

        let report = publisher.deliver_pending().await.unwrap();
        assert_eq!(report.delivered, 2);
        assert_eq!(storage.load_undelivered(10).await.unwrap().len(), 1);
    }

    #[derive(Default)]
    struct CountingTransport {
        count: AtomicUsize,
    }

    #[async_trait]
    impl Publisher for CountingTransport {
        async fn publish(&self, _envelope: &Envelope) -> EventResult<()> {
            self.count.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn loop_delivers_and_observes_cancellation() {
        let storage = InMemoryStorage::new();
        seed(&storage, &["s-loop"]).await;

        let transport = Arc::new(CountingTransport::default());
        let publisher = Arc::new(
            OutboxPublisher::builder()
                .store(Arc::new(storage.clone()))
                .publishers(vec![transport.clone() as Arc<dyn Publisher>])
                .config(OutboxPublisherConfig {
                    poll_delay: Duration::from_millis(20),
                    ..Default::default()
                })
                .build(),
        );

        let handle = publisher.start();
        let _ = time::timeout(Duration::from_secs(2), async {
            while storage.outbox_len() > 0 {
                time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;

        handle.shutdown();
        handle.join().await;
        assert_eq!(transport.count.load(Ordering::Relaxed), 1);
        assert_eq!(storage.outbox_len(), 0);
    }
}
