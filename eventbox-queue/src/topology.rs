//! 队列拓扑计算（topology）
//!
//! 把每逻辑消费队列所需的代理侧声明表达为数据，由适配层负责应用：
//! - 事件主交换机为持久 Topic，主队列按订阅事件的路由键绑定到它；
//! - 重试关闭：仅一个持久主队列；
//! - 重试开启：主队列被拒绝的消息经 DLX 路由进延迟队列，延迟队列
//!   以 `retry_delay` 为消息 TTL，到期后死信回主队列；停车场队列
//!   无 TTL、无死信，仅供人工介入。
//!
use crate::config::QueueConfig;
use crate::routing::{delay_queue, parking_lot_queue, route_name};
use serde_json::{Value, json};

/// 交换机类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeKind {
    Topic,
    Direct,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeDeclaration {
    pub name: String,
    pub kind: ExchangeKind,
    pub durable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueDeclaration {
    pub queue: String,
    pub durable: bool,
    /// 代理侧扩展参数（`x-dead-letter-exchange` 等）
    pub arguments: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueBinding {
    pub queue: String,
    pub exchange: String,
    pub routing_key: String,
}

/// 一个逻辑消费队列的完整声明集
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Topology {
    pub exchanges: Vec<ExchangeDeclaration>,
    pub queues: Vec<QueueDeclaration>,
    pub bindings: Vec<QueueBinding>,
}

/// 计算 `config` 对应的声明集。`exchange` 为事件主交换机，
/// `event_types` 为该队列订阅的事件类型键：主队列按其推导的路由键
/// 绑定到主交换机，事件才能到达消费者
pub fn topology(exchange: &str, config: &QueueConfig, event_types: &[&str]) -> Topology {
    let primary = config.queue_name().to_string();
    let main_exchange = ExchangeDeclaration {
        name: exchange.to_string(),
        kind: ExchangeKind::Topic,
        durable: true,
    };
    let event_bindings: Vec<QueueBinding> = event_types
        .iter()
        .map(|event_type| QueueBinding {
            queue: primary.clone(),
            exchange: exchange.to_string(),
            routing_key: route_name(event_type),
        })
        .collect();

    if !config.is_retry_enabled() {
        return Topology {
            exchanges: vec![main_exchange],
            queues: vec![QueueDeclaration {
                queue: primary,
                durable: true,
                arguments: json!({}),
            }],
            bindings: event_bindings,
        };
    }

    let dlx_exchange = format!("{exchange}{}", crate::routing::DLX_SUFFIX);
    let delay = delay_queue(&primary);
    let parking = parking_lot_queue(&primary);

    let mut bindings = event_bindings;
    bindings.extend([
        QueueBinding {
            queue: primary.clone(),
            exchange: dlx_exchange.clone(),
            routing_key: primary.clone(),
        },
        QueueBinding {
            queue: delay.clone(),
            exchange: dlx_exchange.clone(),
            routing_key: delay.clone(),
        },
        QueueBinding {
            queue: parking.clone(),
            exchange: exchange.to_string(),
            routing_key: parking.clone(),
        },
    ]);

    Topology {
        exchanges: vec![
            main_exchange,
            ExchangeDeclaration {
                name: dlx_exchange.clone(),
                kind: ExchangeKind::Direct,
                durable: true,
            },
        ],
        queues: vec![
            // 主队列：被拒绝的消息路由进延迟队列
            QueueDeclaration {
                queue: primary.clone(),
                durable: true,
                arguments: json!({
                    "x-dead-letter-exchange": dlx_exchange,
                    "x-dead-letter-routing-key": delay,
                }),
            },
            // 延迟队列：TTL 到期后死信回主队列
            QueueDeclaration {
                queue: delay.clone(),
                durable: true,
                arguments: json!({
                    "x-dead-letter-exchange": dlx_exchange,
                    "x-dead-letter-routing-key": primary,
                    "x-message-ttl": config.retry_delay().as_millis() as u64,
                }),
            },
            // 停车场：终态，无 TTL、无死信
            QueueDeclaration {
                queue: parking.clone(),
                durable: true,
                arguments: json!({}),
            },
        ],
        bindings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn retry_disabled_declares_single_durable_queue() {
        let config = QueueConfig::new("events.q");
        let t = topology("events", &config, &["billing.InvoicePaid"]);
        assert_eq!(t.exchanges.len(), 1);
        assert_eq!(t.exchanges[0].name, "events");
        assert_eq!(t.exchanges[0].kind, ExchangeKind::Topic);
        assert_eq!(t.queues.len(), 1);
        assert_eq!(t.queues[0].queue, "events.q");
        assert_eq!(
            t.bindings,
            vec![QueueBinding {
                queue: "events.q".into(),
                exchange: "events".into(),
                routing_key: "billing.invoice_paid".into(),
            }]
        );
    }

    #[test]
    fn primary_queue_binds_every_subscribed_route() {
        let config = QueueConfig::new("events.q");
        let t = topology(
            "events",
            &config,
            &["billing.InvoicePaid", "billing.InvoiceVoided"],
        );
        let routes: Vec<&str> = t
            .bindings
            .iter()
            .filter(|b| b.exchange == "events" && b.queue == "events.q")
            .map(|b| b.routing_key.as_str())
            .collect();
        assert_eq!(routes, vec!["billing.invoice_paid", "billing.invoice_voided"]);
    }

    #[test]
    fn retry_enabled_declares_delay_and_parking_lot() {
        let config = QueueConfig::builder()
            .queue_name("events.q")
            .max_retries(3)
            .retry_delay(Duration::from_secs(30))
            .build();
        let t = topology("events", &config, &["billing.InvoicePaid"]);

        let names: Vec<&str> = t.queues.iter().map(|q| q.queue.as_str()).collect();
        assert_eq!(names, vec!["events.q", "events.q_dlx", "events.q_pl"]);

        let primary = &t.queues[0];
        assert_eq!(
            primary.arguments["x-dead-letter-routing-key"],
            "events.q_dlx"
        );

        let delay = &t.queues[1];
        assert_eq!(delay.arguments["x-message-ttl"], 30_000u64);
        assert_eq!(delay.arguments["x-dead-letter-routing-key"], "events.q");

        let parking = &t.queues[2];
        assert_eq!(parking.arguments, json!({}));

        let kinds: Vec<(&str, ExchangeKind)> = t
            .exchanges
            .iter()
            .map(|e| (e.name.as_str(), e.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![("events", ExchangeKind::Topic), ("events_dlx", ExchangeKind::Direct)]
        );

        // 事件绑定在前，DLX 循环绑定在后
        assert_eq!(t.bindings[0].routing_key, "billing.invoice_paid");
        assert_eq!(t.bindings.len(), 4);
        assert!(
            t.bindings[1..]
                .iter()
                .any(|b| b.queue == "events.q" && b.exchange == "events_dlx")
        );
    }
}
